use crate::{
    Dictionary, MissingClass, MissingValues, Record, RecordBody, RowProvider, RowSink,
    RowSource,
};
use caseflow_base::{Diagnostic, Diagnostics, Taint};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use tracing::trace;

/// Where a filter sends the records it drops. Clones share one sink; take
/// the sink back with `seal` once the filters feeding it are gone.
#[derive(Clone)]
pub struct Excluded(Rc<RefCell<Option<RowSink>>>);

impl Excluded {
    pub fn new(sink: RowSink) -> Self {
        Excluded(Rc::new(RefCell::new(Some(sink))))
    }

    fn write(&self, rec: Record) {
        if let Some(sink) = self.0.borrow_mut().as_mut() {
            sink.write(rec);
        }
    }

    fn follow(&self, taint: &Taint) {
        if let Some(sink) = self.0.borrow().as_ref() {
            taint.propagate(sink.taint());
        }
    }

    /// Seals the shared sink. Later drops from filters still alive are
    /// discarded.
    pub fn seal(&self) -> Option<RowSource> {
        self.0.borrow_mut().take().map(RowSink::seal)
    }
}

type Predicate = Rc<dyn Fn(&RecordBody) -> bool>;

struct Filter {
    upstream: RowSource,
    keep: Predicate,
    excluded: Option<Excluded>,
    // False when the predicate counts or reports what it sees.
    forkable: bool,
}

impl RowProvider for Filter {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        loop {
            let rec = self.upstream.read()?;
            if (self.keep)(&rec) {
                return Some(rec);
            }
            if let Some(x) = &self.excluded {
                x.write(rec);
            }
        }
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        // A second reader would send every dropped record to the exclusion
        // sink twice.
        if self.excluded.is_some() || !self.forkable {
            return None;
        }
        Some(Box::new(Filter {
            upstream: self.upstream.fork(),
            keep: self.keep.clone(),
            excluded: None,
            forkable: true,
        }))
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        if let Some(x) = &self.excluded {
            let mut n = 0u64;
            while let Some(rec) = self.upstream.read() {
                if !(self.keep)(&rec) {
                    x.write(rec);
                    n += 1;
                }
            }
            trace!(target: "caseflow", excluded = n, "filter drained on drop");
        }
    }
}

fn make_filter(
    source: RowSource,
    keep: Predicate,
    excluded: Option<Excluded>,
    forkable: bool,
) -> RowSource {
    let proto = source.proto().clone();
    let taint = source.taint().clone();
    if let Some(x) = &excluded {
        x.follow(&taint);
    }
    RowSource::derived(
        &proto,
        &taint,
        Box::new(Filter {
            upstream: source,
            keep,
            excluded,
            forkable,
        }),
    )
}

/// Keeps the records for which `keep` is true.
pub fn filter(source: RowSource, keep: impl Fn(&RecordBody) -> bool + 'static) -> RowSource {
    make_filter(source, Rc::new(keep), None, true)
}

/// Like `filter`, sending dropped records to `excluded`. If the result is
/// dropped before the end, the rest of the input is read so `excluded`
/// ends up complete.
pub fn filter_excluding(
    source: RowSource,
    keep: impl Fn(&RecordBody) -> bool + 'static,
    excluded: Excluded,
) -> RowSource {
    make_filter(source, Rc::new(keep), Some(excluded), true)
}

/// Drops records in which any of `fields` holds a value of `class`.
/// `n_missing`, if given, counts the drops.
pub fn filter_missing(
    source: RowSource,
    dict: &Dictionary,
    fields: &[usize],
    class: MissingClass,
    n_missing: Option<Rc<Cell<u64>>>,
    excluded: Option<Excluded>,
) -> RowSource {
    let rules: Vec<(usize, MissingValues)> = fields
        .iter()
        .map(|i| (*i, dict.var(*i).missing.clone()))
        .collect();
    let forkable = n_missing.is_none();
    let counting = n_missing;
    let keep = move |rec: &RecordBody| {
        let missing = rules
            .iter()
            .any(|(i, mv)| mv.is_missing(rec.value(*i), class));
        if missing {
            if let Some(n) = &counting {
                n.set(n.get() + 1);
            }
        }
        !missing
    };
    make_filter(source, Rc::new(keep), excluded, forkable)
}

/// Drops records whose weight is missing, non-finite, zero or negative,
/// warning once through `diags`. `warned` lets several filters share the
/// once. Without a weight variable the source is returned as is.
pub fn filter_weight(
    source: RowSource,
    dict: &Dictionary,
    warned: Option<Rc<Cell<bool>>>,
    diags: &Diagnostics,
    excluded: Option<Excluded>,
) -> RowSource {
    let Some(w) = dict.weight() else {
        return source;
    };
    let mv = dict.var(w).missing.clone();
    let warned = warned.unwrap_or_default();
    let diags = diags.clone();
    let keep = move |rec: &RecordBody| {
        let v = rec.value(w);
        let ok = !mv.is_missing(v, MissingClass::Any)
            && rec.num(w).is_finite()
            && rec.num(w) > 0.0;
        if !ok && !warned.get() {
            warned.set(true);
            diags.emit(Diagnostic::warning(
                "At least one case in the data file had a weight value that was \
                 user-missing, system-missing, zero, or negative.  These case(s) \
                 were ignored.",
            ));
        }
        ok
    };
    make_filter(source, Rc::new(keep), excluded, false)
}

struct Counter {
    upstream: RowSource,
    counter: Rc<Cell<u64>>,
}

impl RowProvider for Counter {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let rec = self.upstream.read()?;
        self.counter.set(self.counter.get() + 1);
        Some(rec)
    }

    fn remaining(&self) -> Option<u64> {
        self.upstream.n_rows()
    }
}

/// Passes every record through, adding one to `counter` per record read.
pub fn count_into(source: RowSource, counter: Rc<Cell<u64>>) -> RowSource {
    let proto = source.proto().clone();
    let taint = source.taint().clone();
    RowSource::derived(
        &proto,
        &taint,
        Box::new(Counter {
            upstream: source,
            counter,
        }),
    )
}
