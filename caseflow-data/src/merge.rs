// K-way merge of sorted runs. Ties go to the earlier run, which keeps the
// merge stable when runs are in input order.

use crate::{KeySpec, Proto, Record, RowProvider, RowSink, RowSource};
use caseflow_base::{Settings, Taint};
use std::{cmp::Ordering, rc::Rc};
use tracing::debug;

struct Merge {
    runs: Vec<RowSource>,
    key: Rc<KeySpec>,
}

impl RowProvider for Merge {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let mut best: Option<(usize, Record)> = None;
        for (i, run) in self.runs.iter_mut().enumerate() {
            let Some(head) = run.peek(0) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((_, b)) => self.key.compare(&head, b) == Ordering::Less,
            };
            if better {
                best = Some((i, head));
            }
        }
        let (i, _) = best?;
        self.runs[i].read()
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        Some(Box::new(Merge {
            runs: self.runs.iter_mut().map(|r| r.fork()).collect(),
            key: self.key.clone(),
        }))
    }

    fn remaining(&self) -> Option<u64> {
        self.runs.iter().map(|r| r.n_rows()).sum()
    }
}

fn merge_once(runs: Vec<RowSource>, key: Rc<KeySpec>, proto: &Proto) -> RowSource {
    let out = Taint::new();
    for r in runs.iter() {
        r.taint().propagate(&out);
    }
    RowSource::with_taint(proto, out, Box::new(Merge { runs, key }))
}

/// Merges sorted runs, given in input order, into one sorted source. With
/// more runs than the merge order allows, the earliest runs are merged to
/// a temporary run that takes their place, until few enough remain.
pub(crate) fn merge(
    mut runs: Vec<RowSource>,
    key: Rc<KeySpec>,
    proto: &Proto,
    settings: &Settings,
) -> RowSource {
    let order = settings.max_merge_order.max(2);
    while runs.len() > order {
        debug!(target: "caseflow", runs = runs.len(), order, "merge pass");
        let batch: Vec<RowSource> = runs.drain(..order).collect();
        let mut sink = RowSink::tmpfile(proto, settings);
        merge_once(batch, key.clone(), proto).transfer(&mut sink);
        runs.insert(0, sink.seal());
    }
    match runs.len() {
        0 => RowSource::empty(proto),
        1 => runs.remove(0),
        _ => merge_once(runs, key, proto),
    }
}
