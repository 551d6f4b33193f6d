//! colarray CLI - Command-line tools for typed tuple arrays.
//!
//! Builds synthetic arrays to inspect periodic views, time tuple access
//! across layouts and check the columnar index decomposition.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use colarray_algorithms::{
    deep_copy_to_soa, get_tuple, magnitude_range, set_tuple, AnyArray, AosArray, ArrayLayout,
    GenericArray, PeriodicArray, RangeConfig, SoaArray,
};
use colarray_core::{component_ranges, split_value_index};
use colarray_periodic::{AngularPeriodicConfig, AngularTransform, Axis, BoxedTransform};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("Array error: {0}")]
    Array(#[from] colarray_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{mismatches} of {checked} value indices decomposed incorrectly")]
    Decomposition { mismatches: usize, checked: usize },
}

/// Rotation axis selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}

/// Typed tuple array tools.
#[derive(Parser)]
#[command(name = "colarray")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rotate a synthetic point array and report the transformed ranges
    Periodic {
        /// Number of points
        #[arg(long, default_value = "1000")]
        tuples: usize,

        /// Rotation axis
        #[arg(long, value_enum, default_value = "z")]
        axis: AxisArg,

        /// Rotation angle in degrees
        #[arg(long, default_value = "90.0")]
        angle: f64,

        /// Point the axis passes through, as X,Y,Z
        #[arg(long, value_delimiter = ',', default_value = "0,0,0", allow_negative_numbers = true)]
        center: Vec<f64>,

        /// Rescale transformed points to unit length
        #[arg(long)]
        normalize: bool,

        /// Number of transformed points to print
        #[arg(long, default_value = "5")]
        show: usize,
    },

    /// Time tuple reads and helper copies for each layout
    Bench {
        /// Number of tuples
        #[arg(long, default_value = "1000000")]
        tuples: usize,

        /// Components per tuple
        #[arg(long, default_value = "3")]
        components: usize,

        /// Number of iterations
        #[arg(short, long, default_value = "3")]
        iterations: usize,
    },

    /// Check columnar value-index decomposition against integer division
    Decompose {
        /// Components per tuple
        #[arg(long, default_value = "3")]
        components: usize,

        /// Number of tuples
        #[arg(long, default_value = "1000000")]
        tuples: usize,
    },
}

#[derive(Serialize)]
struct PeriodicReport {
    config: AngularPeriodicConfig,
    tuples: usize,
    source_ranges: Vec<Option<[f64; 2]>>,
    transformed_ranges: Option<Vec<[f64; 2]>>,
    magnitude_range: Option<[f64; 2]>,
    sample: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct DecomposeReport {
    components: usize,
    tuples: usize,
    checked: usize,
    mismatches: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Periodic {
            tuples,
            axis,
            angle,
            center,
            normalize,
            show,
        } => {
            let center: [f64; 3] = center.as_slice().try_into().map_err(|_| {
                CliError::InvalidArgument(format!(
                    "--center needs 3 values, got {}",
                    center.len()
                ))
            })?;
            let config = AngularPeriodicConfig::new()
                .with_axis(axis.into())
                .with_angle(angle)
                .with_center(center)
                .with_normalize(normalize);

            let points = synthetic_points(tuples, 3)?;
            let view = PeriodicArray::angular(&points, &config);

            let mut sample = Vec::with_capacity(show.min(tuples));
            for tuple in 0..show.min(tuples) {
                sample.push(view.tuple(tuple).to_vec());
            }

            let report = PeriodicReport {
                tuples,
                source_ranges: component_ranges(&points),
                transformed_ranges: view.scalar_range(),
                magnitude_range: view.vector_range(),
                sample,
                config,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Bench {
            tuples,
            components,
            iterations,
        } => {
            if components == 0 {
                return Err(CliError::InvalidArgument(
                    "--components must be at least 1".to_string(),
                ));
            }
            let aos = synthetic_points(tuples, components)?;
            let transform: BoxedTransform = Box::new(AngularTransform::new(Axis::Z, 30.0));
            let arrays = [
                ("AoS", AnyArray::from(aos.clone())),
                ("SoA", deep_copy_to_soa(&AnyArray::from(aos.clone()))?),
                (
                    "Periodic",
                    AnyArray::from(PeriodicArray::with_source(&aos, transform)),
                ),
            ];

            println!(
                "Benchmarking with {} tuples of {} components, {} iterations",
                tuples, components, iterations
            );
            println!(
                "{:<10} | {:<15} | {:<15} | {:<15}",
                "Layout", "Read (ms)", "Copy (ms)", "Range (ms)"
            );
            println!("{:-<65}", "");

            let config = RangeConfig::default();
            for (name, array) in &arrays {
                let mut reads = Vec::with_capacity(iterations);
                let mut copies = Vec::with_capacity(iterations);
                let mut ranges = Vec::with_capacity(iterations);
                let mut checksum = 0.0;

                for _ in 0..iterations {
                    let start = Instant::now();
                    checksum += read_all(array, components)?;
                    reads.push(start.elapsed().as_secs_f64() * 1000.0);

                    let mut dest = empty_like(array, tuples)?;
                    let start = Instant::now();
                    for tuple in 0..tuples {
                        set_tuple(&mut dest, tuple, array, tuple)?;
                    }
                    copies.push(start.elapsed().as_secs_f64() * 1000.0);

                    let start = Instant::now();
                    let _ = magnitude_range(array, &config);
                    ranges.push(start.elapsed().as_secs_f64() * 1000.0);
                }

                println!(
                    "{:<10} | {:<15.3} | {:<15.3} | {:<15.3}",
                    name,
                    mean(&reads),
                    mean(&copies),
                    mean(&ranges)
                );
                log::debug!("{name} checksum {checksum}");
            }
        }

        Commands::Decompose { components, tuples } => {
            if components == 0 {
                return Err(CliError::InvalidArgument(
                    "--components must be at least 1".to_string(),
                ));
            }
            let mut soa = SoaArray::<f32>::with_components(components);
            soa.allocate_tuples(tuples)?;

            let checked = soa.number_of_values();
            let mismatches = (0..checked)
                .filter(|&index| {
                    soa.decompose_value_index(index) != split_value_index(index, components)
                })
                .count();

            let report = DecomposeReport {
                components,
                tuples,
                checked,
                mismatches,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if mismatches > 0 {
                return Err(CliError::Decomposition {
                    mismatches,
                    checked,
                });
            }
        }
    }

    Ok(())
}

/// Deterministic interleaved array: a lattice of points offset from the
/// origin, with extra components following a ramp.
fn synthetic_points(tuples: usize, components: usize) -> Result<AosArray<'static, f64>> {
    let mut data = Vec::with_capacity(tuples * components);
    for tuple in 0..tuples {
        let lattice = [
            1.0 + (tuple % 10) as f64,
            ((tuple / 10) % 10) as f64,
            (tuple / 100) as f64 * 0.5,
        ];
        for component in 0..components {
            data.push(
                lattice
                    .get(component)
                    .copied()
                    .unwrap_or((tuple + component) as f64),
            );
        }
    }
    Ok(AosArray::from_vec(data, components)?)
}

/// Zeroed writable array with the same scalar type and shape as `array`.
fn empty_like(array: &AnyArray<'_>, tuples: usize) -> Result<AnyArray<'static>> {
    let components = array.number_of_components();
    let mut dest = match array.layout() {
        ArrayLayout::Soa => AnyArray::from(SoaArray::<f64>::with_components(components)),
        ArrayLayout::Aos | ArrayLayout::Periodic => AnyArray::from(AosArray::<f64>::new(components)),
    };
    let allocated = colarray_algorithms::dispatch!(&mut dest, dest => dest.allocate_tuples(tuples));
    allocated?;
    Ok(dest)
}

fn read_all(array: &AnyArray<'_>, components: usize) -> Result<f64> {
    let mut values = vec![0.0; components];
    let mut sum = 0.0;
    for tuple in 0..array.number_of_tuples() {
        get_tuple(array, tuple, &mut values)?;
        sum += values.iter().sum::<f64>();
    }
    Ok(sum)
}

fn mean(times: &[f64]) -> f64 {
    if times.is_empty() {
        0.0
    } else {
        times.iter().sum::<f64>() / times.len() as f64
    }
}
