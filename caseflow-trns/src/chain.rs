// Transformation chains.
//
// A chain is an ordered list of entries, each of which may change the
// record passed through it and says what should happen next. Composite
// entries (DO IF, LOOP) own chains of their own and run them with the same
// machinery.
//
// END CASE is a cooperative yield: the chain stops, the record goes to the
// caller, and the next run picks up where it stopped. A leaf entry that
// yielded is done with, so resumption starts after it. A composite that
// yielded is still part way through its own chain, so resumption re-enters
// it and it continues from its saved point.

use caseflow_data::{CaseNumber, RecordMut};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Go on to the next entry.
    Continue,
    /// Discard this record and start over with the next one.
    DropCase,
    /// No more records will be produced.
    EndFile,
    /// Fatal. The entry has already reported why.
    Error,
    /// Yield the record now and resume here on the next run.
    EndCase,
    /// Leave the innermost enclosing LOOP.
    Break,
}

pub trait Transformation {
    fn name(&self) -> &str;

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome;

    /// True while the entry holds a resume point of its own, which is only
    /// ever the case right after it returned `EndCase`.
    fn is_suspended(&self) -> bool {
        false
    }

    /// Releases the entry, returning false if that failed.
    fn destroy(&mut self) -> bool {
        true
    }
}

/// How a run over a chain ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Every entry returned `Continue`.
    Finished,
    /// An entry yielded; resume at this index.
    Suspended(usize),
    Dropped,
    Break,
    EndFile,
    Error,
}

#[derive(Default)]
pub struct Chain {
    entries: Vec<Box<dyn Transformation>>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.name()))
            .finish()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, t: Box<dyn Transformation>) {
        self.entries.push(t);
    }

    /// Moves every entry of `other` onto the end of this chain.
    pub fn splice(&mut self, mut other: Chain) {
        self.entries.append(&mut other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Destroys every entry in order. Returns false if any of them failed.
    pub fn clear(&mut self) -> bool {
        let mut ok = true;
        for mut t in self.entries.drain(..) {
            if !t.destroy() {
                debug!(target: "caseflow", name = t.name(), "transformation failed to destroy");
                ok = false;
            }
        }
        ok
    }

    /// Runs entries `start..` over `rec`.
    pub fn run_from(&mut self, start: usize, rec: &mut RecordMut, case_nr: CaseNumber) -> Step {
        for i in start..self.entries.len() {
            let t = &mut self.entries[i];
            match t.execute(rec, case_nr) {
                Outcome::Continue => {}
                Outcome::EndCase => {
                    let at = if t.is_suspended() { i } else { i + 1 };
                    trace!(target: "caseflow", name = t.name(), at, "chain suspended");
                    return Step::Suspended(at);
                }
                Outcome::DropCase => return Step::Dropped,
                Outcome::Break => return Step::Break,
                Outcome::EndFile => return Step::EndFile,
                Outcome::Error => return Step::Error,
            }
        }
        Step::Finished
    }

    /// Runs the whole chain, folding the result back into an outcome.
    pub fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        match self.run_from(0, rec, case_nr) {
            Step::Finished => Outcome::Continue,
            Step::Suspended(_) => Outcome::EndCase,
            Step::Dropped => Outcome::DropCase,
            Step::Break => Outcome::Break,
            Step::EndFile => Outcome::EndFile,
            Step::Error => Outcome::Error,
        }
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// The next pass starts at the first entry.
    Running,
    /// The last pass yielded; the next one starts at this entry.
    Suspended(usize),
    /// END FILE or an error was seen; nothing more runs.
    Terminal,
}

/// What one pass of a `ChainRunner` did with the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Ran to the end of the chain (or hit a BREAK with no loop around it).
    Finished,
    /// Stopped at END CASE; the record should go to the consumer.
    Yielded,
    Dropped,
    EndFile,
    Error,
}

/// Drives a top-level chain across records, remembering where a yield left
/// off.
#[derive(Debug)]
pub struct ChainRunner {
    chain: Chain,
    state: RunState,
}

impl ChainRunner {
    pub fn new(chain: Chain) -> Self {
        ChainRunner {
            chain,
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn into_chain(self) -> Chain {
        self.chain
    }

    pub fn pass(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Pass {
        let start = match self.state {
            RunState::Terminal => return Pass::EndFile,
            RunState::Suspended(at) => at,
            RunState::Running => 0,
        };
        match self.chain.run_from(start, rec, case_nr) {
            Step::Finished | Step::Break => {
                self.state = RunState::Running;
                Pass::Finished
            }
            Step::Suspended(at) => {
                self.state = RunState::Suspended(at);
                Pass::Yielded
            }
            Step::Dropped => {
                self.state = RunState::Running;
                Pass::Dropped
            }
            Step::EndFile => {
                self.state = RunState::Terminal;
                Pass::EndFile
            }
            Step::Error => {
                self.state = RunState::Terminal;
                Pass::Error
            }
        }
    }
}
