// Buffering fork for providers that can only be read once (a stateful
// translator, a live transformation chain). All handles pull from one
// upstream through a shared window; the window keeps every record some
// handle has not read yet and drops the rest.

use crate::{Record, RowProvider};
use caseflow_base::Taint;
use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};
use tracing::trace;

struct Shared {
    upstream: Box<dyn RowProvider>,
    taint: Taint,
    window: VecDeque<Record>,
    // Absolute position of window[0].
    base: u64,
    // Handle positions, with how many handles sit at each.
    positions: BTreeMap<u64, usize>,
    eof: bool,
}

impl Shared {
    fn add(&mut self, pos: u64) {
        *self.positions.entry(pos).or_insert(0) += 1;
    }

    fn remove(&mut self, pos: u64) {
        if let Some(n) = self.positions.get_mut(&pos) {
            *n -= 1;
            if *n == 0 {
                self.positions.remove(&pos);
            }
        }
    }

    fn trim(&mut self) {
        let min = match self.positions.keys().next() {
            Some(p) => *p,
            None => self.base + self.window.len() as u64,
        };
        while self.base < min && self.window.pop_front().is_some() {
            self.base += 1;
        }
    }

    fn get(&mut self, pos: u64) -> Option<Record> {
        let idx = (pos - self.base) as usize;
        if let Some(rec) = self.window.get(idx) {
            return Some(rec.clone());
        }
        if self.eof {
            return None;
        }
        match self.upstream.read(&self.taint) {
            Some(rec) => {
                self.window.push_back(rec.clone());
                Some(rec)
            }
            None => {
                self.eof = true;
                None
            }
        }
    }
}

struct ForkHandle {
    shared: Rc<RefCell<Shared>>,
    pos: u64,
}

impl ForkHandle {
    fn at(shared: &Rc<RefCell<Shared>>, pos: u64) -> Box<dyn RowProvider> {
        shared.borrow_mut().add(pos);
        Box::new(ForkHandle {
            shared: shared.clone(),
            pos,
        })
    }
}

impl RowProvider for ForkHandle {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let mut s = self.shared.borrow_mut();
        let rec = s.get(self.pos)?;
        s.remove(self.pos);
        self.pos += 1;
        s.add(self.pos);
        s.trim();
        Some(rec)
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        Some(ForkHandle::at(&self.shared, self.pos))
    }

    fn remaining(&self) -> Option<u64> {
        let s = self.shared.borrow();
        let buffered = s.base + s.window.len() as u64 - self.pos;
        if s.eof {
            Some(buffered)
        } else {
            s.upstream.remaining().map(|n| n + buffered)
        }
    }
}

impl Drop for ForkHandle {
    fn drop(&mut self) {
        let mut s = self.shared.borrow_mut();
        s.remove(self.pos);
        s.trim();
    }
}

/// Splits a one-shot provider into two handles at its current position.
pub(crate) fn shared(
    upstream: Box<dyn RowProvider>,
    taint: Taint,
) -> (Box<dyn RowProvider>, Box<dyn RowProvider>) {
    trace!(target: "caseflow", "inserting buffering fork");
    let shared = Rc::new(RefCell::new(Shared {
        upstream,
        taint,
        window: VecDeque::new(),
        base: 0,
        positions: BTreeMap::new(),
        eof: false,
    }));
    (ForkHandle::at(&shared, 0), ForkHandle::at(&shared, 0))
}
