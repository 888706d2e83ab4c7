use super::{note, rec, Log};
use crate::{
    expr, Chain, ChainRunner, Compute, EndCase, EndFile, FnTransformation, Outcome, Pass,
    RunState, Step, Transformation,
};
use caseflow_data::{CaseNumber, RecordMut};
use std::{cell::Cell, rc::Rc};
use test_log::test;

#[test]
fn test_resume_after_end_case() {
    let log = Log::default();
    let mut chain = Chain::new();
    chain.push(Box::new(note(&log, "a")));
    chain.push(Box::new(EndCase));
    chain.push(Box::new(note(&log, "b")));
    chain.push(Box::new(EndCase));
    let mut runner = ChainRunner::new(chain);
    let mut r = rec(&[0.0]);

    assert_eq!(runner.pass(&mut r, 1), Pass::Yielded);
    assert_eq!(runner.state(), RunState::Suspended(2));
    assert_eq!(*log.borrow(), vec!["a"]);

    assert_eq!(runner.pass(&mut r, 1), Pass::Yielded);
    assert_eq!(*log.borrow(), vec!["a", "b"]);

    // The trailing END CASE was the last entry: resuming after it
    // finishes the pass without running anything.
    assert_eq!(runner.pass(&mut r, 1), Pass::Finished);
    assert_eq!(runner.state(), RunState::Running);
    assert_eq!(*log.borrow(), vec!["a", "b"]);

    assert_eq!(runner.pass(&mut r, 2), Pass::Yielded);
    assert_eq!(*log.borrow(), vec!["a", "b", "a"]);
}

#[test]
fn test_suspended_matches_unsuspended() {
    // The same computation with and without a yield in the middle ends in
    // the same record.
    let build = |yield_mid: bool| {
        let mut chain = Chain::new();
        chain.push(Box::new(Compute::new(0, expr(|r, _| r.num(0) * 2.0))));
        if yield_mid {
            chain.push(Box::new(EndCase));
        }
        chain.push(Box::new(Compute::new(
            1,
            expr(|r, n: CaseNumber| r.num(0) + n as f64),
        )));
        chain
    };
    let mut plain = rec(&[3.0, 0.0]);
    assert_eq!(build(false).execute(&mut plain, 7), Outcome::Continue);

    let mut runner = ChainRunner::new(build(true));
    let mut split = rec(&[3.0, 0.0]);
    assert_eq!(runner.pass(&mut split, 7), Pass::Yielded);
    assert_eq!(split.num(0), 6.0);
    assert_eq!(runner.pass(&mut split, 7), Pass::Finished);
    assert_eq!(split.values(), plain.values());
    assert_eq!(split.num(1), 13.0);
}

#[test]
fn test_terminal_stays_terminal() {
    let log = Log::default();
    let mut chain = Chain::new();
    chain.push(Box::new(note(&log, "a")));
    chain.push(Box::new(EndFile));
    let mut runner = ChainRunner::new(chain);
    let mut r = rec(&[0.0]);
    assert_eq!(runner.pass(&mut r, 1), Pass::EndFile);
    assert_eq!(runner.state(), RunState::Terminal);
    assert_eq!(runner.pass(&mut r, 2), Pass::EndFile);
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn test_drop_restarts_at_top() {
    let log = Log::default();
    let mut chain = Chain::new();
    chain.push(Box::new(note(&log, "a")));
    chain.push(Box::new(FnTransformation::new("drop odd", |_, n| {
        if n % 2 == 1 {
            Outcome::DropCase
        } else {
            Outcome::Continue
        }
    })));
    chain.push(Box::new(note(&log, "b")));
    let mut runner = ChainRunner::new(chain);
    let mut r = rec(&[0.0]);
    assert_eq!(runner.pass(&mut r, 1), Pass::Dropped);
    assert_eq!(runner.pass(&mut r, 2), Pass::Finished);
    assert_eq!(*log.borrow(), vec!["a", "a", "b"]);
}

#[test]
fn test_run_from_reports_step() {
    let mut chain = Chain::new();
    chain.push(Box::new(EndCase));
    chain.push(Box::new(FnTransformation::new("fail", |_, _| Outcome::Error)));
    let mut r = rec(&[0.0]);
    assert_eq!(chain.run_from(0, &mut r, 1), Step::Suspended(1));
    assert_eq!(chain.run_from(1, &mut r, 1), Step::Error);
    assert_eq!(chain.names(), vec!["END CASE", "fail"]);
}

struct Tracked {
    destroyed: Rc<Cell<u32>>,
    ok: bool,
}

impl Transformation for Tracked {
    fn name(&self) -> &str {
        "tracked"
    }
    fn execute(&mut self, _rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        Outcome::Continue
    }
    fn destroy(&mut self) -> bool {
        self.destroyed.set(self.destroyed.get() + 1);
        self.ok
    }
}

#[test]
fn test_clear_destroys_every_entry() {
    let destroyed = Rc::new(Cell::new(0));
    let mut chain = Chain::new();
    for ok in [true, false, true] {
        chain.push(Box::new(Tracked {
            destroyed: destroyed.clone(),
            ok,
        }));
    }
    assert!(!chain.clear());
    assert_eq!(destroyed.get(), 3);
    assert!(chain.is_empty());
    assert!(chain.clear());
}

#[test]
fn test_drop_destroys() {
    let destroyed = Rc::new(Cell::new(0));
    {
        let mut chain = Chain::new();
        chain.push(Box::new(Tracked {
            destroyed: destroyed.clone(),
            ok: true,
        }));
        let mut other = Chain::new();
        other.push(Box::new(Tracked {
            destroyed: destroyed.clone(),
            ok: true,
        }));
        chain.splice(other);
        assert_eq!(chain.len(), 2);
    }
    assert_eq!(destroyed.get(), 2);
}
