use super::{col, faulty, nums, pairs};
use crate::{group_by, sort, Grouper, KeySpec};
use caseflow_base::Settings;
use test_log::test;

#[test]
fn test_group_sorted_runs() {
    let sorted = sort(
        nums(&[5.0, 3.0, 5.0, 1.0, 4.0, 3.0, 5.0, 2.0, 4.0, 1.0]),
        &KeySpec::ascending(0, 0),
        &Settings::default(),
    );
    let mut g = group_by(sorted, &KeySpec::ascending(0, 0));
    let mut sizes = Vec::new();
    let mut values = Vec::new();
    while let Some(group) = g.next_group() {
        let vals = col(group, 0);
        values.push(vals[0]);
        assert!(vals.iter().all(|v| *v == vals[0]));
        sizes.push(vals.len());
    }
    assert_eq!(sizes, vec![2, 2, 2, 2, 3]);
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert!(g.finish());
}

#[test]
fn test_groups_concatenate_to_input() {
    let input = [(1.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 3.0), (1.0, 4.0)];
    let g = Grouper::by_vars(pairs(&input), &[0]);
    let groups: Vec<Vec<f64>> = g.map(|grp| col(grp, 1)).collect();
    // Grouping doesn't reorder, so the non-adjacent 1s form two groups.
    assert_eq!(groups, vec![vec![0.0, 1.0], vec![2.0], vec![3.0, 4.0]]);
}

#[test]
fn test_whole() {
    let mut g = Grouper::whole(nums(&[3.0, 1.0, 2.0]));
    let all = g.next_group().map(|s| col(s, 0));
    assert_eq!(all, Some(vec![3.0, 1.0, 2.0]));
    assert!(g.next_group().is_none());

    let mut empty = Grouper::by_vars(nums(&[]), &[]);
    assert!(empty.next_group().is_none());
}

#[test]
#[should_panic(expected = "drained")]
fn test_advance_before_drain_panics() {
    let mut g = Grouper::by_vars(nums(&[1.0, 1.0, 2.0]), &[0]);
    let mut first = g.next_group().expect("first group");
    first.read();
    drop(first);
    g.next_group();
}

#[test]
fn test_finish_reports_taint() {
    let mut g = Grouper::by_vars(faulty(&[1.0, 2.0]), &[0]);
    while let Some(grp) = g.next_group() {
        col(grp, 0);
    }
    assert!(!g.finish());
}
