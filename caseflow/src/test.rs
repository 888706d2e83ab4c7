use crate::Dataset;
use caseflow_base::{CollectedDiagnostics, Settings};
use caseflow_data::{Proto, Record, RowSource};
use std::rc::Rc;


/// A dataset over numeric variables with the given names. Rows may be
/// narrower than the dictionary; procedures widen them.
pub(crate) fn dataset(names: &[&str], rows: &[&[f64]]) -> (Dataset, CollectedDiagnostics) {
    let diags = CollectedDiagnostics::new();
    let mut ds = Dataset::new(Settings::default(), Rc::new(diags.clone()));
    for n in names {
        ds.dict_mut().add_var(n, 0);
    }
    let proto = Proto::numeric(rows.first().map_or(names.len(), |r| r.len()));
    let recs = rows.iter().map(|r| Record::numbers(r)).collect();
    assert!(ds.set_source(RowSource::from_records(&proto, recs)));
    (ds, diags)
}

pub(crate) fn col(source: RowSource, idx: usize) -> Vec<f64> {
    source.map(|r| r.num(idx)).collect()
}

/// Column `idx` of the active data, left in place.
pub(crate) fn active(ds: &mut Dataset, idx: usize) -> Vec<f64> {
    col(ds.source_mut().fork(), idx)
}
