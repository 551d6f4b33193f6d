//! Tuple transforms applied by periodic views.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A geometric mapping applied in place to one tuple of double values.
///
/// The view is agnostic of the mapping; implementors only describe how a
/// tuple changes and a couple of properties the view uses to avoid scanning
/// every tuple when computing ranges.
pub trait TupleTransform {
    /// Maps `tuple` in place. The slice length is the component count.
    fn transform(&self, tuple: &mut [f64]);

    /// True if the mapping is affine, so the image of a bounding box is
    /// bounded by the images of its corners.
    fn is_affine(&self) -> bool {
        false
    }

    /// True if the Euclidean norm of a tuple with `components` values is
    /// unchanged by the mapping.
    fn preserves_magnitude(&self, _components: usize) -> bool {
        false
    }
}

impl<T: TupleTransform + ?Sized> TupleTransform for Box<T> {
    fn transform(&self, tuple: &mut [f64]) {
        (**self).transform(tuple);
    }

    fn is_affine(&self) -> bool {
        (**self).is_affine()
    }

    fn preserves_magnitude(&self, components: usize) -> bool {
        (**self).preserves_magnitude(components)
    }
}

impl<T: TupleTransform + ?Sized> TupleTransform for Arc<T> {
    fn transform(&self, tuple: &mut [f64]) {
        (**self).transform(tuple);
    }

    fn is_affine(&self) -> bool {
        (**self).is_affine()
    }

    fn preserves_magnitude(&self, components: usize) -> bool {
        (**self).preserves_magnitude(components)
    }
}

impl<T: TupleTransform + ?Sized> TupleTransform for &T {
    fn transform(&self, tuple: &mut [f64]) {
        (**self).transform(tuple);
    }

    fn is_affine(&self) -> bool {
        (**self).is_affine()
    }

    fn preserves_magnitude(&self, components: usize) -> bool {
        (**self).preserves_magnitude(components)
    }
}

/// Type-erased transform used when the concrete type does not matter.
pub type BoxedTransform = Box<dyn TupleTransform + Send + Sync>;

/// Adapts a closure into a [`TupleTransform`] with no special properties.
#[derive(Debug, Clone, Copy)]
pub struct FnTransform<F>(pub F);

impl<F: Fn(&mut [f64])> TupleTransform for FnTransform<F> {
    fn transform(&self, tuple: &mut [f64]) {
        (self.0)(tuple);
    }
}

/// Rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Configuration for an angular periodic replica.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngularPeriodicConfig {
    /// Axis to rotate about.
    pub axis: Axis,
    /// Rotation angle in degrees, counter-clockwise looking down the axis.
    pub angle_degrees: f64,
    /// Point the axis passes through (applies to 3-component tuples).
    pub center: [f64; 3],
    /// Rescale each transformed tuple to unit length.
    pub normalize: bool,
}

impl Default for AngularPeriodicConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            angle_degrees: 0.0,
            center: [0.0; 3],
            normalize: false,
        }
    }
}

impl AngularPeriodicConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Sets the rotation angle in degrees.
    #[must_use]
    pub fn with_angle(mut self, angle_degrees: f64) -> Self {
        self.angle_degrees = angle_degrees;
        self
    }

    /// Sets the rotation centre.
    #[must_use]
    pub fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = center;
        self
    }

    /// Sets the normalize flag.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Rotation about a coordinate axis through a centre point.
///
/// 3-component tuples are treated as points and rotated about the axis
/// through `center`. 9-component tuples are treated as row-major 3x3 tensors
/// and rotated as `R T Rᵀ`. Other component counts are left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularTransform {
    axis: Axis,
    angle_degrees: f64,
    center: [f64; 3],
    rotation: [[f64; 3]; 3],
}

impl AngularTransform {
    /// Rotation about `axis` through the origin.
    #[must_use]
    pub fn new(axis: Axis, angle_degrees: f64) -> Self {
        let mut transform = Self {
            axis,
            angle_degrees,
            center: [0.0; 3],
            rotation: [[0.0; 3]; 3],
        };
        transform.update_rotation();
        transform
    }

    /// Builds the transform described by `config`.
    #[must_use]
    pub fn from_config(config: &AngularPeriodicConfig) -> Self {
        Self::new(config.axis, config.angle_degrees).with_center(config.center)
    }

    /// Moves the rotation axis through `center`.
    #[must_use]
    pub fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = center;
        self
    }

    /// Coordinate axis the rotation turns about.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Rotation angle in degrees, counter-clockwise about [`Self::axis`].
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    /// Point the rotation axis passes through.
    #[must_use]
    pub fn center(&self) -> [f64; 3] {
        self.center
    }

    /// The 3x3 rotation matrix, row-major.
    #[must_use]
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        self.rotation
    }

    fn update_rotation(&mut self) {
        let (s, c) = self.angle_degrees.to_radians().sin_cos();
        self.rotation = match self.axis {
            Axis::X => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
            Axis::Y => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            Axis::Z => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        };
    }

    fn rotate_point(&self, point: &mut [f64]) {
        let shifted = [
            point[0] - self.center[0],
            point[1] - self.center[1],
            point[2] - self.center[2],
        ];
        for (row, out) in self.rotation.iter().zip(point.iter_mut()) {
            *out = row[0] * shifted[0] + row[1] * shifted[1] + row[2] * shifted[2];
        }
        for (out, center) in point.iter_mut().zip(self.center) {
            *out += center;
        }
    }

    fn rotate_tensor(&self, tensor: &mut [f64]) {
        let r = &self.rotation;
        let mut rt = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                rt[i][j] = (0..3).map(|k| r[i][k] * tensor[k * 3 + j]).sum();
            }
        }
        for i in 0..3 {
            for j in 0..3 {
                tensor[i * 3 + j] = (0..3).map(|k| rt[i][k] * r[j][k]).sum();
            }
        }
    }
}

impl TupleTransform for AngularTransform {
    fn transform(&self, tuple: &mut [f64]) {
        match tuple.len() {
            3 => self.rotate_point(tuple),
            9 => self.rotate_tensor(tuple),
            _ => {}
        }
    }

    fn is_affine(&self) -> bool {
        true
    }

    fn preserves_magnitude(&self, components: usize) -> bool {
        match components {
            3 => self.center == [0.0; 3],
            _ => true,
        }
    }
}
