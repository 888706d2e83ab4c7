use crate::{Proto, Record, RecordMut, Value, SYSMIS};
use test_log::test;

#[test]
fn test_new_record_is_missing() {
    let proto = Proto::new(vec![0, 3]);
    let r = Record::new(&proto);
    assert_eq!(r.num(0), SYSMIS);
    assert_eq!(r.str(1), b"   ");
}

#[test]
fn test_unshare_copies_only_when_shared() {
    let a = Record::numbers(&[1.0, 2.0]);
    let b = a.clone();
    assert!(a.is_shared());
    let mut m = a.unshare();
    m.set_num(0, 10.0);
    let a = m.freeze();
    assert_eq!(a.num(0), 10.0);
    assert_eq!(b.num(0), 1.0);
    assert!(!b.is_shared());
}

#[test]
fn test_modify_leaves_other_holders_alone() {
    let a = Record::numbers(&[1.0]);
    let keep = a.clone();
    let a = a.modify(|m| m.set_num(0, 5.0));
    assert_eq!(a.num(0), 5.0);
    assert_eq!(keep.num(0), 1.0);
}

#[test]
fn test_deep_clone() {
    let a = Record::numbers(&[3.0]);
    let b = a.deep_clone();
    assert!(!a.is_shared());
    assert_eq!(a, b);
}

#[test]
fn test_resize() {
    let proto = Proto::new(vec![0, 2]);
    let mut m = RecordMut::new(&proto);
    m.set_num(0, 7.0);
    m.set_str(1, b"abc");
    assert_eq!(m.str(1), b"ab");
    let wider = proto.with_width(0).with_width(4);
    m.resize(&wider);
    assert_eq!(m.num(0), 7.0);
    assert_eq!(m.str(1), b"ab");
    assert_eq!(m.num(2), 0.0);
    assert_eq!(m.value(3), &Value::Str(vec![0u8; 4].into_boxed_slice()));
    m.resize(&Proto::numeric(1));
    assert_eq!(m.len(), 1);
    assert_eq!(m.num(0), 7.0);
}

#[test]
fn test_set_str_pads() {
    let proto = Proto::new(vec![4]);
    let mut m = RecordMut::new(&proto);
    m.set_str(0, b"x");
    assert_eq!(m.str(0), b"x   ");
}

#[test]
#[should_panic]
fn test_num_on_string_field_panics() {
    let r = Record::new(&Proto::new(vec![1]));
    r.num(0);
}

#[test]
fn test_proto() {
    let p = Proto::new(vec![0, 8, 0]);
    assert_eq!(p.n_strings(), 1);
    assert!(p.is_conformable(&Proto::new(vec![0, 8])));
    assert!(!p.is_conformable(&Proto::new(vec![0, 4])));
    assert_eq!(
        p.cost(),
        (1 + 3 + 3) * std::mem::size_of::<Value>()
    );
    assert_eq!(p.project(&[1, 0]).widths(), &[8, 0]);
}

#[test]
fn test_value_order() {
    let lo = Value::Num(SYSMIS);
    let hi = Value::Num(-1e300);
    assert_eq!(lo.compare(&hi), std::cmp::Ordering::Less);
    let a = Value::Str(b"ab".to_vec().into_boxed_slice());
    let b = Value::Str(b"b ".to_vec().into_boxed_slice());
    assert_eq!(a.compare(&b), std::cmp::Ordering::Less);
}
