use caseflow_data::{CaseNumber, RecordBody};

/// A numeric expression over one record. The expression language itself
/// lives elsewhere; anything that can produce a number from a record and its
/// case number fits here.
pub trait Expression {
    fn evaluate(&self, rec: &RecordBody, case_nr: CaseNumber) -> f64;
}

impl<F: Fn(&RecordBody, CaseNumber) -> f64> Expression for F {
    fn evaluate(&self, rec: &RecordBody, case_nr: CaseNumber) -> f64 {
        self(rec, case_nr)
    }
}

pub type Expr = Box<dyn Expression>;

/// Boxes a closure as an expression.
pub fn expr(f: impl Fn(&RecordBody, CaseNumber) -> f64 + 'static) -> Expr {
    Box::new(f)
}

pub fn constant(v: f64) -> Expr {
    expr(move |_, _| v)
}

pub fn field(idx: usize) -> Expr {
    expr(move |r, _| r.num(idx))
}
