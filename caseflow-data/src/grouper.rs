// Splits a source that is already sorted on a key into consecutive groups
// of records with equal keys. The grouper never reads ahead of the group
// being handed out, so each group must be read to its end before the next
// one is asked for.

use crate::{KeySpec, Record, RecordBody, RowProvider, RowSource};
use caseflow_base::Taint;
use std::{cell::RefCell, rc::Rc};
use tracing::trace;

struct GroupState {
    upstream: RowSource,
    // A group has been handed out and not yet read to its end.
    open: bool,
}

pub struct Grouper {
    state: Rc<RefCell<GroupState>>,
    // None: the whole input is one group.
    key: Option<Rc<KeySpec>>,
    whole_done: bool,
    n_groups: u64,
}

struct Group {
    state: Rc<RefCell<GroupState>>,
    key: Option<Rc<KeySpec>>,
    exemplar: Record,
}

impl Group {
    fn belongs(&self, rec: &RecordBody) -> bool {
        match &self.key {
            None => true,
            Some(k) => k.equal(rec, &self.exemplar),
        }
    }
}

impl RowProvider for Group {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let mut s = self.state.borrow_mut();
        match s.upstream.peek(0) {
            Some(next) if self.belongs(&next) => s.upstream.read(),
            _ => {
                s.open = false;
                None
            }
        }
    }
}

impl Grouper {
    pub fn new(source: RowSource, key: &KeySpec) -> Self {
        Self::make(source, Some(Rc::new(key.clone())))
    }

    /// A grouper with a single group holding the whole input, or no groups
    /// if the input is empty.
    pub fn whole(source: RowSource) -> Self {
        Self::make(source, None)
    }

    /// Groups on equal values of `fields`.
    pub fn by_vars(source: RowSource, fields: &[usize]) -> Self {
        let mut key = KeySpec::new();
        for i in fields {
            key.add(*i, source.proto().width(*i), crate::Direction::Ascending);
        }
        if key.is_empty() {
            Self::whole(source)
        } else {
            Self::new(source, &key)
        }
    }

    fn make(source: RowSource, key: Option<Rc<KeySpec>>) -> Self {
        Grouper {
            state: Rc::new(RefCell::new(GroupState {
                upstream: source,
                open: false,
            })),
            key,
            whole_done: false,
            n_groups: 0,
        }
    }

    /// The next group, or `None` when the input is used up. Asking while
    /// the previous group still has records is a usage fault.
    pub fn next_group(&mut self) -> Option<RowSource> {
        let mut s = self.state.borrow_mut();
        assert!(!s.open, "grouper advanced before its previous group was drained");
        if self.key.is_none() && self.whole_done {
            return None;
        }
        let exemplar = s.upstream.peek(0)?;
        self.whole_done = true;
        s.open = true;
        self.n_groups += 1;
        trace!(target: "caseflow", group = self.n_groups, "group opened");
        let proto = s.upstream.proto().clone();
        let taint = s.upstream.taint().clone();
        drop(s);
        Some(RowSource::derived(
            &proto,
            &taint,
            Box::new(Group {
                state: self.state.clone(),
                key: self.key.clone(),
                exemplar,
            }),
        ))
    }

    /// Releases the input, returning false if it, or anything read from
    /// it, was tainted.
    pub fn finish(self) -> bool {
        let s = self.state.borrow();
        !s.upstream.taint().has_tainted_successor()
    }
}

impl Iterator for Grouper {
    type Item = RowSource;
    fn next(&mut self) -> Option<RowSource> {
        self.next_group()
    }
}

/// Groups `source`, which must already be sorted on `key`.
pub fn group_by(source: RowSource, key: &KeySpec) -> Grouper {
    Grouper::new(source, key)
}
