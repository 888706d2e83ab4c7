// Translating decorators: each upstream record becomes zero or one
// downstream record, possibly of a different prototype.

use crate::{CaseNumber, Proto, Record, RecordBody, RowProvider, RowSource};
use caseflow_base::Taint;
use std::{cell::Cell, cmp::Ordering, rc::Rc};

struct Stateful<F> {
    upstream: RowSource,
    f: F,
}

impl<F: FnMut(Record) -> Option<Record>> RowProvider for Stateful<F> {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        loop {
            let rec = self.upstream.read()?;
            if let Some(out) = (self.f)(rec) {
                return Some(out);
            }
        }
    }
}

/// Applies `f` to each record in turn. `f` may keep state between calls, so
/// forks of the result go through a buffer.
pub fn translate(
    source: RowSource,
    proto: &Proto,
    f: impl FnMut(Record) -> Option<Record> + 'static,
) -> RowSource {
    let taint = source.taint().clone();
    RowSource::derived(proto, &taint, Box::new(Stateful { upstream: source, f }))
}

type Stateless = Rc<dyn Fn(Record, CaseNumber) -> Option<Record>>;

struct Pure {
    upstream: RowSource,
    f: Stateless,
    // Upstream position of the next record.
    pos: CaseNumber,
    one_to_one: bool,
}

impl RowProvider for Pure {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        loop {
            let rec = self.upstream.read()?;
            let pos = self.pos;
            self.pos += 1;
            if let Some(out) = (self.f)(rec, pos) {
                return Some(out);
            }
        }
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        Some(Box::new(Pure {
            upstream: self.upstream.fork(),
            f: self.f.clone(),
            pos: self.pos,
            one_to_one: self.one_to_one,
        }))
    }

    fn skip(&mut self, n: u64, taint: &Taint) -> u64 {
        if self.one_to_one {
            let done = self.upstream.advance(n);
            self.pos += done;
            done
        } else {
            let mut done = 0;
            while done < n && self.read(taint).is_some() {
                done += 1;
            }
            done
        }
    }

    fn remaining(&self) -> Option<u64> {
        if self.one_to_one {
            self.upstream.n_rows()
        } else {
            None
        }
    }
}

fn make_pure(source: RowSource, proto: &Proto, f: Stateless, one_to_one: bool) -> RowSource {
    let taint = source.taint().clone();
    RowSource::derived(
        proto,
        &taint,
        Box::new(Pure {
            upstream: source,
            f,
            pos: 0,
            one_to_one,
        }),
    )
}

/// Applies `f`, which sees each record with its 0-based upstream position
/// and keeps no state, so the result forks cheaply.
pub fn translate_stateless(
    source: RowSource,
    proto: &Proto,
    f: impl Fn(Record, CaseNumber) -> Option<Record> + 'static,
) -> RowSource {
    make_pure(source, proto, Rc::new(f), false)
}

/// Narrows each record to `fields`, in that order.
pub fn project(source: RowSource, fields: &[usize]) -> RowSource {
    let proto = source.proto().project(fields);
    let fields = fields.to_vec();
    let out = proto.clone();
    let f = move |rec: Record, _: CaseNumber| {
        let values = fields.iter().map(|i| rec.value(*i).clone()).collect();
        Some(Record::from_values(&out, values))
    };
    make_pure(source, &proto, Rc::new(f), true)
}

/// Appends a numeric field computed from the rest of the record.
pub fn append_numeric(source: RowSource, f: impl Fn(&RecordBody) -> f64 + 'static) -> RowSource {
    let proto = source.proto().with_width(0);
    let out = proto.clone();
    let last = proto.len() - 1;
    let g = move |rec: Record, _: CaseNumber| {
        let n = f(&rec);
        let mut m = rec.unshare_and_resize(&out);
        m.set_num(last, n);
        Some(m.freeze())
    };
    make_pure(source, &proto, Rc::new(g), true)
}

/// Appends a numeric field holding `first + n * increment` for the n'th
/// record.
pub fn append_sequence(source: RowSource, first: f64, increment: f64) -> RowSource {
    let proto = source.proto().with_width(0);
    let out = proto.clone();
    let last = proto.len() - 1;
    let g = move |rec: Record, n: CaseNumber| {
        let mut m = rec.unshare_and_resize(&out);
        m.set_num(last, n as f64 * increment + first);
        Some(m.freeze())
    };
    make_pure(source, &proto, Rc::new(g), true)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RankErrors {
    pub unsorted: bool,
    pub negative_weight: bool,
}

/// Called once per distinct value: the value, how many records hold it,
/// and their total weight.
pub type DistinctFn = Box<dyn FnMut(f64, u64, f64)>;

struct Rank {
    upstream: RowSource,
    proto: Proto,
    field: usize,
    weight: Option<usize>,
    errors: Option<Rc<Cell<RankErrors>>>,
    distinct: Option<DistinctFn>,
    // Records left in the current tie, counting the one being ranked.
    n_common: u64,
    mean_rank: f64,
    // Total weight ranked before the current tie.
    cc: f64,
    prev: Option<f64>,
}

impl Rank {
    fn note(&self, f: impl FnOnce(&mut RankErrors)) {
        if let Some(cell) = &self.errors {
            let mut e = cell.get();
            f(&mut e);
            cell.set(e);
        }
    }

    fn weight_of(&self, rec: &RecordBody) -> f64 {
        match self.weight {
            None => 1.0,
            Some(w) => {
                let w = rec.num(w);
                if w < 0.0 {
                    self.note(|e| e.negative_weight = true);
                }
                w
            }
        }
    }
}

impl RowProvider for Rank {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let rec = self.upstream.read()?;
        let value = rec.num(self.field);
        if self.prev.is_some_and(|p| value < p) {
            self.note(|e| e.unsorted = true);
        }
        if self.n_common <= 1 {
            let mut weight = self.weight_of(&rec);
            let mut n_common = 1;
            while let Some(next) = self.upstream.peek(n_common as usize - 1) {
                if next.num(self.field) != value {
                    break;
                }
                weight += self.weight_of(&next);
                n_common += 1;
            }
            self.n_common = n_common;
            self.mean_rank = self.cc + (weight + 1.0) / 2.0;
            self.cc += weight;
            if let Some(f) = &mut self.distinct {
                f(value, n_common, weight);
            }
        } else {
            self.n_common -= 1;
        }
        self.prev = Some(value);
        let last = self.proto.len() - 1;
        let mut m = rec.unshare_and_resize(&self.proto);
        m.set_num(last, self.mean_rank);
        Some(m.freeze())
    }
}

/// Appends the rank of numeric `field` within an input sorted on it. Ties
/// share their mean rank; with `weight`, each record counts for its weight.
/// Unsorted input or negative weights give wrong ranks and are reported
/// through `errors`. `distinct` hears about each distinct value once.
pub fn append_rank(
    source: RowSource,
    field: usize,
    weight: Option<usize>,
    errors: Option<Rc<Cell<RankErrors>>>,
    distinct: Option<DistinctFn>,
) -> RowSource {
    let proto = source.proto().with_width(0);
    let taint = source.taint().clone();
    RowSource::derived(
        &proto,
        &taint,
        Box::new(Rank {
            upstream: source,
            proto: proto.clone(),
            field,
            weight,
            errors,
            distinct,
            n_common: 0,
            mean_rank: 0.0,
            cc: 0.0,
            prev: None,
        }),
    )
}

struct Distinct {
    upstream: RowSource,
    proto: Proto,
    key: usize,
    weight: Option<usize>,
    direction: Ordering,
}

impl RowProvider for Distinct {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let mut sum = 0.0;
        loop {
            let rec = self.upstream.read()?;
            sum += match self.weight {
                Some(w) => rec.num(w),
                None => 1.0,
            };
            if let Some(next) = self.upstream.peek(0) {
                let dir = next.value(self.key).compare(rec.value(self.key));
                if dir == Ordering::Equal {
                    continue;
                }
                assert!(
                    self.direction == Ordering::Equal || self.direction == dir,
                    "input to distinct is not sorted on its key"
                );
                self.direction = dir;
            }
            return Some(match self.weight {
                Some(w) => rec.modify(|m| m.set_num(w, sum)),
                None => {
                    let last = self.proto.len() - 1;
                    let mut m = rec.unshare_and_resize(&self.proto);
                    m.set_num(last, sum);
                    m.freeze()
                }
            });
        }
    }
}

/// One record per run of equal `key` values in a sorted input: the last of
/// the run, carrying the run's total `weight` in the weight field, or, when
/// unweighted, the run length in a new trailing field.
pub fn distinct(source: RowSource, key: usize, weight: Option<usize>) -> RowSource {
    let proto = match weight {
        Some(_) => source.proto().clone(),
        None => source.proto().with_width(0),
    };
    let taint = source.taint().clone();
    RowSource::derived(
        &proto,
        &taint,
        Box::new(Distinct {
            upstream: source,
            proto: proto.clone(),
            key,
            weight,
            direction: Ordering::Equal,
        }),
    )
}
