use crate::{Result, Settings, DEFAULT_MXLOOPS, DEFAULT_WORKSPACE};
use std::collections::HashMap;
use test_log::test;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn test_defaults() {
    let s = Settings::default();
    assert_eq!(s.workspace, DEFAULT_WORKSPACE);
    assert_eq!(s.mxloops, DEFAULT_MXLOOPS);
    assert_eq!(s.min_sort_records, 64);
    assert_eq!(s.max_merge_order, 7);
}

#[test]
fn test_from_vars() -> Result<()> {
    let s = Settings::from_vars(vars(&[
        ("CASEFLOW_WORKSPACE", "4096"),
        ("CASEFLOW_MXLOOPS", " 7 "),
    ]))?;
    assert_eq!(s.workspace, 4096);
    assert_eq!(s.mxloops, 7);
    Ok(())
}

#[test]
fn test_from_vars_rejects_garbage() {
    assert!(Settings::from_vars(vars(&[("CASEFLOW_WORKSPACE", "lots")])).is_err());
    assert!(Settings::from_vars(vars(&[("CASEFLOW_TMPDIR", "")])).is_err());
}

#[test]
fn test_workspace_records() {
    let s = Settings::default().with_workspace(1000);
    assert_eq!(s.workspace_records(10), 100);
    assert_eq!(s.workspace_records(5000), 1);
    assert_eq!(s.workspace_records(0), 1000);
}

#[test]
fn test_temp_files_are_removed() -> Result<()> {
    let s = Settings::default();
    let f = s.temp_files.create()?;
    let path = f.path().to_path_buf();
    assert!(path.exists());
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("caseflow-")));
    drop(f);
    assert!(!path.exists());
    Ok(())
}
