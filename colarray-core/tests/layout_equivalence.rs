use colarray_core::{AosArray, GenericArray, SoaArray};

/// Applies the same edits through the shared contract and returns every value.
fn exercise<A: GenericArray<Scalar = i32>>(array: &mut A) -> Vec<i32> {
    array.set_number_of_components(3).unwrap();
    for i in 0..6 {
        let index = array.insert_next_typed_tuple(&[i, i * 10, i * 100]).unwrap();
        assert_eq!(index, usize::try_from(i).unwrap());
    }
    array.remove_tuple(2).unwrap();
    array.remove_last_tuple().unwrap();
    array.insert_typed_tuple(6, &[-1, -2, -3]).unwrap();
    array.set_value(4, 99).unwrap();
    (0..array.number_of_values()).map(|i| array.value(i)).collect()
}

#[test]
fn test_layouts_agree_through_contract() {
    let mut aos = AosArray::<i32>::new(3);
    let mut soa = SoaArray::<i32>::new();

    let from_aos = exercise(&mut aos);
    let from_soa = exercise(&mut soa);

    assert_eq!(from_aos, from_soa);
    assert_eq!(aos.number_of_tuples(), 7);
    assert_eq!(&from_aos[..6], &[0, 0, 0, 1, 99, 100]);
    assert_eq!(&from_aos[15..], &[0, 0, 0, -1, -2, -3]);

    assert_eq!(aos.lookup_value(99), soa.lookup_value(99));
    assert_eq!(aos.lookup_all_values(0), soa.lookup_all_values(0));

    let mut aos_tuple = [0.0; 3];
    let mut soa_tuple = [0.0; 3];
    for tuple in 0..aos.number_of_tuples() {
        aos.tuple_f64(tuple, &mut aos_tuple);
        soa.tuple_f64(tuple, &mut soa_tuple);
        assert_eq!(aos_tuple, soa_tuple);
    }
}
