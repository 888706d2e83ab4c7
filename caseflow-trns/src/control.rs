// DO IF and LOOP. Both run nested chains through `Chain::run_from` and keep
// the point to resume at when something inside them yields.

use crate::{Chain, Expr, Outcome, Step, Transformation};
use caseflow_data::{CaseNumber, RecordMut, SYSMIS};
use tracing::trace;

pub struct Clause {
    /// `None` for ELSE.
    pub condition: Option<Expr>,
    pub body: Chain,
}

/// DO IF / ELSE IF / ELSE. The first clause whose condition is true runs;
/// a system-missing condition means no clause runs at all.
pub struct DoIf {
    clauses: Vec<Clause>,
    // Clause and entry to resume at after a yield.
    resume: Option<(usize, usize)>,
}

impl DoIf {
    pub fn new(clauses: Vec<Clause>) -> Self {
        DoIf {
            clauses,
            resume: None,
        }
    }

    fn find_clause(&self, rec: &RecordMut, case_nr: CaseNumber) -> Option<usize> {
        for (i, c) in self.clauses.iter().enumerate() {
            let Some(cond) = &c.condition else {
                return Some(i);
            };
            let v = cond.evaluate(rec, case_nr);
            if v == SYSMIS {
                return None;
            }
            if v != 0.0 {
                return Some(i);
            }
        }
        None
    }
}

impl Transformation for DoIf {
    fn name(&self) -> &str {
        "DO IF"
    }

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        let (clause, start) = match self.resume.take() {
            Some(at) => at,
            None => match self.find_clause(rec, case_nr) {
                Some(c) => (c, 0),
                None => return Outcome::Continue,
            },
        };
        match self.clauses[clause].body.run_from(start, rec, case_nr) {
            Step::Finished => Outcome::Continue,
            Step::Suspended(at) => {
                self.resume = Some((clause, at));
                Outcome::EndCase
            }
            Step::Dropped => Outcome::DropCase,
            Step::Break => Outcome::Break,
            Step::EndFile => Outcome::EndFile,
            Step::Error => Outcome::Error,
        }
    }

    fn is_suspended(&self) -> bool {
        self.resume.is_some()
    }

    fn destroy(&mut self) -> bool {
        self.clauses
            .iter_mut()
            .fold(true, |ok, c| c.body.clear() && ok)
    }
}

/// `LOOP index = first TO last BY by`.
pub struct IndexClause {
    pub field: usize,
    pub first: Expr,
    pub last: Expr,
    /// Defaults to 1.
    pub by: Option<Expr>,
}

pub struct Loop {
    index: Option<IndexClause>,
    loop_if: Option<Expr>,
    end_if: Option<Expr>,
    body: Chain,
    mxloops: u64,
    cur: f64,
    by: f64,
    last: f64,
    iteration: u64,
    resume: Option<usize>,
}

impl Loop {
    /// A loop with no index clause runs at most `mxloops` times.
    pub fn new(
        index: Option<IndexClause>,
        loop_if: Option<Expr>,
        end_if: Option<Expr>,
        body: Chain,
        mxloops: u64,
    ) -> Self {
        Loop {
            index,
            loop_if,
            end_if,
            body,
            mxloops,
            cur: 0.0,
            by: 0.0,
            last: 0.0,
            iteration: 0,
            resume: None,
        }
    }

    // Evaluates the index clause and stores the first value. Returns false if
    // the loop shouldn't run at all.
    fn start(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> bool {
        let Some(ix) = &self.index else {
            return true;
        };
        self.cur = ix.first.evaluate(rec, case_nr);
        self.by = match &ix.by {
            Some(by) => by.evaluate(rec, case_nr),
            None => 1.0,
        };
        self.last = ix.last.evaluate(rec, case_nr);
        rec.set_num(ix.field, self.cur);
        let pathological = !self.cur.is_finite()
            || !self.by.is_finite()
            || !self.last.is_finite()
            || self.by == 0.0
            || (self.by > 0.0 && self.cur > self.last)
            || (self.by < 0.0 && self.cur < self.last);
        if pathological {
            trace!(
                target: "caseflow",
                cur = self.cur,
                by = self.by,
                last = self.last,
                "loop skipped"
            );
        }
        !pathological
    }
}

impl Transformation for Loop {
    fn name(&self) -> &str {
        "LOOP"
    }

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        let mut resume = self.resume.take();
        if resume.is_none() {
            if !self.start(rec, case_nr) {
                return Outcome::Continue;
            }
            self.iteration = 0;
        }
        while self.index.is_some() || self.iteration < self.mxloops {
            let start = match resume.take() {
                Some(at) => at,
                None => {
                    if let Some(cond) = &self.loop_if {
                        if cond.evaluate(rec, case_nr) != 1.0 {
                            break;
                        }
                    }
                    0
                }
            };
            match self.body.run_from(start, rec, case_nr) {
                Step::Finished => {}
                Step::Suspended(at) => {
                    self.resume = Some(at);
                    return Outcome::EndCase;
                }
                Step::Break => return Outcome::Continue,
                Step::Dropped => return Outcome::DropCase,
                Step::EndFile => return Outcome::EndFile,
                Step::Error => return Outcome::Error,
            }
            if let Some(cond) = &self.end_if {
                if cond.evaluate(rec, case_nr) != 0.0 {
                    break;
                }
            }
            if let Some(ix) = &self.index {
                self.cur += self.by;
                let past = if self.by > 0.0 {
                    self.cur > self.last
                } else {
                    self.cur < self.last
                };
                if past {
                    break;
                }
                rec.set_num(ix.field, self.cur);
            }
            self.iteration += 1;
        }
        Outcome::Continue
    }

    fn is_suspended(&self) -> bool {
        self.resume.is_some()
    }

    fn destroy(&mut self) -> bool {
        self.body.clear()
    }
}
