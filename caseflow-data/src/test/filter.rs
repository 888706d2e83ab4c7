use super::{col, faulty, nums, pairs};
use crate::{
    count_into, filter, filter_excluding, filter_missing, filter_weight, project, select, sort,
    Dictionary, Excluded, Grouper, KeySpec, MissingClass, Proto, RowSink, Value, SYSMIS,
};
use caseflow_base::{CollectedDiagnostics, Diagnostics, Settings, Severity};
use std::{
    cell::Cell,
    rc::Rc,
};
use test_log::test;

#[test]
fn test_filter_predicate() {
    let s = filter(nums(&[1.0, 2.0, 3.0, 4.0]), |r| r.num(0) % 2.0 == 0.0);
    assert_eq!(col(s, 0), vec![2.0, 4.0]);
}

#[test]
fn test_filter_forks() {
    let mut s = filter(nums(&[1.0, 2.0, 3.0, 4.0]), |r| r.num(0) > 1.0);
    s.read();
    let f = s.fork();
    assert_eq!(col(f, 0), vec![3.0, 4.0]);
    assert_eq!(col(s, 0), vec![3.0, 4.0]);
}

#[test]
fn test_excluded_drained_on_drop() {
    let excluded = Excluded::new(RowSink::memory(&Proto::numeric(1)));
    let src = nums(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let mut s = filter_excluding(src, |r| r.num(0) > 2.0, excluded.clone());
    // Read only the first kept record, then give up.
    assert_eq!(s.read().map(|r| r.num(0)), Some(3.0));
    drop(s);
    let dropped = excluded.seal().map(|s| col(s, 0));
    assert_eq!(dropped, Some(vec![1.0, 2.0]));
}

#[test]
fn test_filter_missing_counts() {
    let mut dict = Dictionary::new();
    let x = dict.add_var("x", 0);
    let y = dict.add_var("y", 0);
    dict.var_mut(y).missing.add_value(Value::Num(9.0));
    let src = pairs(&[(1.0, 1.0), (SYSMIS, 2.0), (3.0, 9.0), (4.0, 4.0)]);
    let n = Rc::new(Cell::new(0));
    let s = filter_missing(src, &dict, &[x, y], MissingClass::Any, Some(n.clone()), None);
    assert_eq!(col(s, 0), vec![1.0, 4.0]);
    assert_eq!(n.get(), 2);

    let src = pairs(&[(SYSMIS, 2.0), (3.0, 9.0)]);
    let s = filter_missing(src, &dict, &[x, y], MissingClass::System, None, None);
    assert_eq!(col(s, 0), vec![3.0]);
}

#[test]
fn test_filter_weight_warns_once() {
    let mut dict = Dictionary::new();
    dict.add_var("x", 0);
    let w = dict.add_var("w", 0);
    dict.set_weight(Some(w));
    let diags = CollectedDiagnostics::new();
    let sink: Diagnostics = Rc::new(diags.clone());
    let src = pairs(&[(1.0, 1.0), (2.0, 0.0), (3.0, -1.0), (4.0, SYSMIS), (5.0, 2.5)]);
    let s = filter_weight(src, &dict, None, &sink, None);
    assert_eq!(col(s, 0), vec![1.0, 5.0]);
    assert_eq!(diags.count(Severity::Warning), 1);
}

#[test]
fn test_filter_weight_unweighted_passes_through() {
    let dict = Dictionary::new();
    let sink: Diagnostics = Rc::new(CollectedDiagnostics::new());
    let s = filter_weight(nums(&[1.0, -1.0]), &dict, None, &sink, None);
    assert_eq!(col(s, 0), vec![1.0, -1.0]);
}

#[test]
fn test_count_into() {
    let n = Rc::new(Cell::new(0));
    let s = count_into(nums(&[1.0, 2.0, 3.0]), n.clone());
    let s = s.truncate(2);
    assert_eq!(col(s, 0).len(), 2);
    assert_eq!(n.get(), 2);
}

#[test]
fn test_missing_values_rules() {
    let mut mv = crate::MissingValues::new(0);
    assert!(mv.add_range(1.0, 5.0));
    assert!(mv.add_value(Value::Num(9.0)));
    assert!(!mv.add_value(Value::Num(10.0)));
    assert!(mv.is_user_missing(&Value::Num(3.0)));
    assert!(mv.is_missing(&Value::Num(9.0), MissingClass::User));
    assert!(!mv.is_missing(&Value::Num(9.0), MissingClass::System));
    assert!(mv.is_missing(&Value::Num(SYSMIS), MissingClass::Any));

    let mut s = crate::MissingValues::new(2);
    assert!(!s.add_range(0.0, 1.0));
    assert!(!s.add_value(Value::Num(1.0)));
    assert!(s.add_value(Value::Str(b"NA".to_vec().into_boxed_slice())));
}

#[test]
fn test_taint_reaches_through_layers() {
    let src = faulty(&[4.0, 1.0, 3.0, 2.0, 5.0]);
    let upstream = src.taint().clone();
    let kept = filter(src, |r| r.num(0) > 1.0);
    let filtered = kept.taint().clone();
    let narrowed = project(kept, &[0]);
    let projected = narrowed.taint().clone();
    let picked = select(narrowed, 0, None, 2);
    let selected = picked.taint().clone();
    let sorted = sort(picked, &KeySpec::ascending(0, 0), &Settings::default());
    assert!(sorted.error());

    for layer in [&filtered, &projected, &selected, sorted.taint()] {
        assert!(layer.is_tainted());
    }
    assert!(upstream.is_tainted());
    assert!(upstream.has_tainted_successor());
    assert!(filtered.has_tainted_successor());

    let mut g = Grouper::whole(sorted);
    let group = g.next_group().expect("one group");
    assert!(group.error());
    assert_eq!(col(group, 0), vec![2.0, 4.0]);
    assert!(g.next_group().is_none());
    assert!(!g.finish());
}
