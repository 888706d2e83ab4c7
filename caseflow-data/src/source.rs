// A RowSource is a lazy, forward-only stream of records of one prototype.
//
// The work is done by a boxed `RowProvider`: a memory or file reader, a
// decorator over another source, a merge of sorted runs, a generated
// input program. The source wraps it with the things every stream needs:
// a lookahead buffer for `peek`, sticky end-of-stream, and a taint.
//
// Providers never return errors. A provider that hits a fault sets the
// taint it is handed and reports end-of-stream; consumers look at taint
// (or `destroy`'s result) before trusting what they computed.

use crate::{
    fork,
    ioutil::{MemReader, Reader},
    select, Proto, Record, RowSink,
};
use caseflow_base::Taint;
use std::{collections::VecDeque, fmt};
use tracing::warn;

/// 0-based position of a record within a stream.
pub type CaseNumber = u64;

pub trait RowProvider {
    /// The next record, or `None` at the end. A fault sets `taint` and
    /// returns `None`.
    fn read(&mut self, taint: &Taint) -> Option<Record>;

    /// An independent provider positioned where this one is. Providers that
    /// can't do that cheaply return `None` and get wrapped in a buffering
    /// fork instead.
    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        None
    }

    /// Discards up to `n` records, returning how many were discarded.
    fn skip(&mut self, n: u64, taint: &Taint) -> u64 {
        let mut done = 0;
        while done < n && self.read(taint).is_some() {
            done += 1;
        }
        done
    }

    /// Exact number of records left, when known.
    fn remaining(&self) -> Option<u64> {
        None
    }
}

pub(crate) struct ReaderProvider<R: Reader>(pub(crate) R);

impl<R: Reader + 'static> RowProvider for ReaderProvider<R> {
    fn read(&mut self, taint: &Taint) -> Option<Record> {
        match self.0.read_record() {
            Ok(rec) => rec,
            Err(e) => {
                warn!(target: "caseflow", "read failed: {}", e);
                taint.set();
                None
            }
        }
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        // A reader that can't reopen itself still works behind a buffering
        // fork, so failure here isn't a fault.
        match self.0.try_clone_independent() {
            Ok(r) => Some(Box::new(ReaderProvider(r))),
            Err(_) => None,
        }
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.0.remaining())
    }
}

struct Empty;

impl RowProvider for Empty {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        None
    }
    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        Some(Box::new(Empty))
    }
    fn remaining(&self) -> Option<u64> {
        Some(0)
    }
}

pub struct RowSource {
    proto: Proto,
    taint: Taint,
    provider: Box<dyn RowProvider>,
    lookahead: VecDeque<Record>,
    eof: bool,
}

impl fmt::Debug for RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSource")
            .field("proto", &self.proto)
            .field("taint", &self.taint)
            .field("buffered", &self.lookahead.len())
            .field("eof", &self.eof)
            .finish()
    }
}

impl RowSource {
    pub fn new(proto: &Proto, provider: Box<dyn RowProvider>) -> Self {
        Self::with_taint(proto, Taint::new(), provider)
    }

    pub fn with_taint(proto: &Proto, taint: Taint, provider: Box<dyn RowProvider>) -> Self {
        RowSource {
            proto: proto.clone(),
            taint,
            provider,
            lookahead: VecDeque::new(),
            eof: false,
        }
    }

    /// A source whose taint follows `upstream`'s: a fault there shows up
    /// here. Decorators are built this way.
    pub fn derived(proto: &Proto, upstream: &Taint, provider: Box<dyn RowProvider>) -> Self {
        let taint = Taint::new();
        upstream.propagate(&taint);
        Self::with_taint(proto, taint, provider)
    }

    pub fn empty(proto: &Proto) -> Self {
        Self::new(proto, Box::new(Empty))
    }

    pub(crate) fn empty_with_taint(proto: &Proto, taint: Taint) -> Self {
        Self::with_taint(proto, taint, Box::new(Empty))
    }

    pub fn from_records(proto: &Proto, recs: Vec<Record>) -> Self {
        for r in recs.iter() {
            assert_eq!(r.proto().widths(), proto.widths(), "record/prototype mismatch");
        }
        Self::from_reader(proto, Taint::new(), MemReader::from(recs))
    }

    pub(crate) fn from_reader<R: Reader + 'static>(proto: &Proto, taint: Taint, r: R) -> Self {
        Self::with_taint(proto, taint, Box::new(ReaderProvider(r)))
    }

    pub fn proto(&self) -> &Proto {
        &self.proto
    }

    pub fn taint(&self) -> &Taint {
        &self.taint
    }

    fn pull(&mut self) -> Option<Record> {
        if self.eof {
            return None;
        }
        match self.provider.read(&self.taint) {
            Some(rec) => {
                debug_assert_eq!(rec.proto().widths(), self.proto.widths());
                Some(rec)
            }
            None => {
                self.eof = true;
                None
            }
        }
    }

    /// The next record, or `None` once the stream is exhausted (after which
    /// it stays exhausted).
    pub fn read(&mut self) -> Option<Record> {
        match self.lookahead.pop_front() {
            Some(rec) => Some(rec),
            None => self.pull(),
        }
    }

    /// The record `idx` positions ahead of the next `read`, without
    /// consuming anything.
    pub fn peek(&mut self, idx: usize) -> Option<Record> {
        while self.lookahead.len() <= idx {
            let rec = self.pull()?;
            self.lookahead.push_back(rec);
        }
        self.lookahead.get(idx).cloned()
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek(0).is_none()
    }

    /// An independent source replaying the same remaining records. Clones
    /// share this source's taint.
    pub fn fork(&mut self) -> RowSource {
        let provider = match self.provider.fork(&self.taint) {
            Some(p) => p,
            None => {
                let upstream = std::mem::replace(&mut self.provider, Box::new(Empty));
                let (a, b) = fork::shared(upstream, self.taint.clone());
                self.provider = a;
                b
            }
        };
        RowSource {
            proto: self.proto.clone(),
            taint: self.taint.clone(),
            provider,
            lookahead: self.lookahead.clone(),
            eof: self.eof,
        }
    }

    /// Skips up to `n` records and returns how many were skipped.
    pub fn advance(&mut self, n: u64) -> u64 {
        let from_buf = (self.lookahead.len() as u64).min(n);
        self.lookahead.drain(..from_buf as usize);
        if from_buf == n || self.eof {
            return from_buf;
        }
        let skipped = self.provider.skip(n - from_buf, &self.taint);
        if skipped < n - from_buf {
            self.eof = true;
        }
        from_buf + skipped
    }

    /// Records left, when that's known without reading.
    pub fn n_rows(&self) -> Option<u64> {
        if self.eof {
            return Some(self.lookahead.len() as u64);
        }
        self.provider
            .remaining()
            .map(|n| n + self.lookahead.len() as u64)
    }

    /// Records left, counting through a fork if need be.
    pub fn count_rows(&mut self) -> u64 {
        match self.n_rows() {
            Some(n) => n,
            None => {
                let mut f = self.fork();
                f.advance(u64::MAX)
            }
        }
    }

    /// At most the next `n` records.
    pub fn truncate(mut self, n: u64) -> RowSource {
        if self.n_rows().is_some_and(|have| have <= n) {
            return self;
        }
        if n == 0 {
            self.provider = Box::new(Empty);
            self.lookahead.clear();
            self.eof = true;
            return self;
        }
        select::select(self, 0, Some(n), 1)
    }

    /// Writes everything left to `sink`. Faults on either side reach the
    /// sink.
    pub fn transfer(mut self, sink: &mut RowSink) {
        self.taint.propagate(sink.taint());
        while let Some(rec) = self.read() {
            sink.write(rec);
        }
    }

    pub fn error(&self) -> bool {
        self.taint.is_tainted()
    }

    /// Taints this source and everything downstream, and ends it.
    pub fn force_error(&mut self) {
        self.taint.set();
        self.lookahead.clear();
        self.provider = Box::new(Empty);
        self.eof = true;
    }

    /// Releases the source, returning false if it was tainted.
    pub fn destroy(self) -> bool {
        !self.taint.is_tainted()
    }
}

impl Iterator for RowSource {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        self.read()
    }
}
