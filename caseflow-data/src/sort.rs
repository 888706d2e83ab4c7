// External sort. Records collect in memory until a run's worth is held; the
// run is stably sorted and written to a temporary file. Sealing merges the
// runs, or hands back the in-memory run directly if nothing was spilled.

use crate::{merge, Direction, KeySpec, Proto, Record, RowSink, RowSource, SinkProvider};
use caseflow_base::{Settings, Taint};
use std::rc::Rc;
use tracing::debug;

struct SortSink {
    key: Rc<KeySpec>,
    proto: Proto,
    settings: Settings,
    run_limit: usize,
    buf: Vec<Record>,
    runs: Vec<RowSource>,
}

impl SortSink {
    fn sort_buf(&mut self) {
        let key = &self.key;
        self.buf.sort_by(|a, b| key.compare(a, b));
    }

    fn flush_run(&mut self) {
        self.sort_buf();
        let mut sink = RowSink::tmpfile(&self.proto, &self.settings);
        for rec in self.buf.drain(..) {
            sink.write(rec);
        }
        debug!(target: "caseflow", run = self.runs.len(), "sort run written");
        self.runs.push(sink.seal());
    }
}

impl SinkProvider for SortSink {
    fn write(&mut self, rec: Record, _taint: &Taint) {
        self.buf.push(rec);
        if self.buf.len() >= self.run_limit {
            self.flush_run();
        }
    }

    fn into_source(mut self: Box<Self>, proto: &Proto, taint: &Taint) -> RowSource {
        let out = if self.runs.is_empty() {
            self.sort_buf();
            let buf = std::mem::take(&mut self.buf);
            RowSource::from_records(proto, buf)
        } else {
            if !self.buf.is_empty() {
                self.flush_run();
            }
            let runs = std::mem::take(&mut self.runs);
            merge::merge(runs, self.key.clone(), proto, &self.settings)
        };
        taint.propagate(out.taint());
        out
    }
}

/// A sink that yields its records sorted on `key` once sealed.
pub fn sort_writer(key: &KeySpec, proto: &Proto, settings: &Settings) -> RowSink {
    let run_limit = settings
        .workspace_records(proto.cost())
        .max(settings.min_sort_records);
    RowSink::new(
        proto,
        Box::new(SortSink {
            key: Rc::new(key.clone()),
            proto: proto.clone(),
            settings: settings.clone(),
            run_limit,
            buf: Vec::new(),
            runs: Vec::new(),
        }),
    )
}

/// Sorts `source` on `key`. Records with equal keys keep their input order.
pub fn sort(source: RowSource, key: &KeySpec, settings: &Settings) -> RowSource {
    let mut w = sort_writer(key, source.proto(), settings);
    source.transfer(&mut w);
    w.seal()
}

pub fn sort_by_field(
    source: RowSource,
    index: usize,
    direction: Direction,
    settings: &Settings,
) -> RowSource {
    let mut key = KeySpec::new();
    key.add(index, source.proto().width(index), direction);
    sort(source, &key, settings)
}
