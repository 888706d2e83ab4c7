use crate::{expr, Expr, FnTransformation, Outcome};
use caseflow_data::{Record, RecordMut};
use std::{cell::RefCell, rc::Rc};

mod builder;
mod chain;
mod control;

pub(crate) fn rec(vals: &[f64]) -> RecordMut {
    Record::numbers(vals).unshare()
}

pub(crate) type Log = Rc<RefCell<Vec<&'static str>>>;

/// An entry that notes each time it runs.
pub(crate) fn note(log: &Log, name: &'static str) -> FnTransformation {
    let log = log.clone();
    FnTransformation::new(name, move |_, _| {
        log.borrow_mut().push(name);
        Outcome::Continue
    })
}

pub(crate) fn bool_expr(f: impl Fn(f64) -> bool + 'static) -> Expr {
    expr(move |r, _| if f(r.num(0)) { 1.0 } else { 0.0 })
}

/// field[target] += field[src]
pub(crate) fn add_field(target: usize, src: usize) -> Expr {
    expr(move |r, _| r.num(target) + r.num(src))
}
