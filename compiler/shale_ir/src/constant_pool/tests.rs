use super::*;

#[test]
fn add_never_deduplicates() {
    let mut pool = ConstantPool::default();
    assert_eq!(pool.add_int(5), 0);
    assert_eq!(pool.add_int(5), 1);
    assert_eq!(pool.int_count(), 2);
    assert_eq!(pool.find_int(5), Some(0));
}

#[test]
fn find_missing_value() {
    let mut pool = ConstantPool::default();
    pool.add_long(10);
    assert_eq!(pool.find_long(11), None);
    assert_eq!(pool.find_int(10), None);
}

#[test]
fn offsets_are_cumulative_in_kind_order() {
    let mut pool = ConstantPool::default();
    pool.add_double(1.5);
    pool.add_int(1);
    pool.add_int(2);
    pool.add_single(0.25);
    pool.add_long(7);
    pool.add_long(8);
    pool.add_long(9);

    assert_eq!(pool.int_offset(), 0);
    assert_eq!(pool.long_offset(), 2);
    assert_eq!(pool.single_offset(), 5);
    assert_eq!(pool.double_offset(), 6);
    assert_eq!(pool.len(), 7);
}

#[test]
fn flat_lookup_follows_kind_order() {
    let pool = ConstantPool::new(vec![1, 2], vec![30], vec![0.5], vec![2.25]);

    assert_eq!(pool.get(0), Some(Constant::Int(1)));
    assert_eq!(pool.get(1), Some(Constant::Int(2)));
    assert_eq!(pool.get(2), Some(Constant::Long(30)));
    assert_eq!(pool.get(3), Some(Constant::Single(0.5)));
    assert_eq!(pool.get(4), Some(Constant::Double(2.25)));
    assert_eq!(pool.get(5), None);

    assert_eq!(pool.constant_type(0), Some(Type::INT));
    assert_eq!(pool.constant_type(2), Some(Type::LONG));
    assert_eq!(pool.constant_type(3), Some(Type::SINGLE));
    assert_eq!(pool.constant_type(4), Some(Type::DOUBLE));
    assert_eq!(pool.constant_type(9), None);
}

#[test]
fn empty_kinds_do_not_shift_lookup() {
    let pool = ConstantPool::new(Vec::new(), Vec::new(), Vec::new(), vec![1.0]);
    assert_eq!(pool.double_offset(), 0);
    assert_eq!(pool.get(0), Some(Constant::Double(1.0)));
}

#[test]
fn float_lookup_uses_bit_patterns() {
    let mut pool = ConstantPool::default();
    pool.add_double(0.0);
    pool.add_double(f64::NAN);

    assert_eq!(pool.find_double(-0.0), None);
    assert_eq!(pool.find_double(0.0), Some(0));
    assert_eq!(pool.find_double(f64::NAN), Some(1));
    assert_eq!(pool.find_single(1.0), None);
}

#[test]
fn clear_empties_every_kind() {
    let mut pool = ConstantPool::new(vec![1], vec![2], vec![3.0], vec![4.0]);
    pool.clear();
    assert!(pool.is_empty());
}
