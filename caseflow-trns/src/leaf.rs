use crate::{Expr, Outcome, Transformation};
use caseflow_base::{Diagnostic, Diagnostics};
use caseflow_data::{CaseNumber, MissingClass, MissingValues, RecordMut, RowSource};
use tracing::trace;

/// `COMPUTE target = expr` for a numeric target.
pub struct Compute {
    target: usize,
    expr: Expr,
}

impl Compute {
    pub fn new(target: usize, expr: Expr) -> Self {
        Compute { target, expr }
    }
}

impl Transformation for Compute {
    fn name(&self) -> &str {
        "COMPUTE"
    }

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        let v = self.expr.evaluate(rec, case_nr);
        rec.set_num(self.target, v);
        Outcome::Continue
    }
}

/// Keeps a record only when its condition is exactly 1.
pub struct SelectIf {
    cond: Expr,
}

impl SelectIf {
    pub fn new(cond: Expr) -> Self {
        SelectIf { cond }
    }
}

impl Transformation for SelectIf {
    fn name(&self) -> &str {
        "SELECT IF"
    }

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        if self.cond.evaluate(rec, case_nr) == 1.0 {
            Outcome::Continue
        } else {
            Outcome::DropCase
        }
    }
}

/// Drops records whose filter variable is zero or missing.
pub struct FilterBy {
    field: usize,
    missing: MissingValues,
}

impl FilterBy {
    pub fn new(field: usize, missing: MissingValues) -> Self {
        FilterBy { field, missing }
    }
}

impl Transformation for FilterBy {
    fn name(&self) -> &str {
        "FILTER"
    }

    fn execute(&mut self, rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        let v = rec.value(self.field);
        if v.as_num() == Some(0.0) || self.missing.is_missing(v, MissingClass::Any) {
            Outcome::DropCase
        } else {
            Outcome::Continue
        }
    }
}

/// Passes the first `n` records and drops the rest.
pub struct CaseLimit {
    remaining: u64,
}

impl CaseLimit {
    pub fn new(n: u64) -> Self {
        CaseLimit { remaining: n }
    }
}

impl Transformation for CaseLimit {
    fn name(&self) -> &str {
        "case limit"
    }

    fn execute(&mut self, _rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        if self.remaining == 0 {
            return Outcome::DropCase;
        }
        self.remaining -= 1;
        Outcome::Continue
    }
}

pub struct EndCase;

impl Transformation for EndCase {
    fn name(&self) -> &str {
        "END CASE"
    }

    fn execute(&mut self, _rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        Outcome::EndCase
    }
}

pub struct EndFile;

impl Transformation for EndFile {
    fn name(&self) -> &str {
        "END FILE"
    }

    fn execute(&mut self, _rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        Outcome::EndFile
    }
}

pub struct Break;

impl Transformation for Break {
    fn name(&self) -> &str {
        "BREAK"
    }

    fn execute(&mut self, _rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        Outcome::Break
    }
}

type StepFn = Box<dyn FnMut(&mut RecordMut, CaseNumber) -> Outcome>;

/// An entry backed by a closure, for callers that need something the
/// built-in entries don't do.
pub struct FnTransformation {
    name: String,
    f: StepFn,
}

impl FnTransformation {
    pub fn new(
        name: impl Into<String>,
        f: impl FnMut(&mut RecordMut, CaseNumber) -> Outcome + 'static,
    ) -> Self {
        FnTransformation {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Transformation for FnTransformation {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, rec: &mut RecordMut, case_nr: CaseNumber) -> Outcome {
        (self.f)(rec, case_nr)
    }
}

/// Reads the next record of `source` into the current one, copying each
/// `(from, to)` field pair. The end of the source ends the input; a faulted
/// source is an error.
pub struct ReadFrom {
    source: RowSource,
    fields: Vec<(usize, usize)>,
    diags: Diagnostics,
}

impl ReadFrom {
    pub fn new(source: RowSource, fields: Vec<(usize, usize)>, diags: Diagnostics) -> Self {
        ReadFrom {
            source,
            fields,
            diags,
        }
    }
}

impl Transformation for ReadFrom {
    fn name(&self) -> &str {
        "DATA LIST"
    }

    fn execute(&mut self, rec: &mut RecordMut, _case_nr: CaseNumber) -> Outcome {
        match self.source.read() {
            Some(input) => {
                for (from, to) in self.fields.iter() {
                    rec.set_value(*to, input.value(*from).clone());
                }
                Outcome::Continue
            }
            None if self.source.error() => {
                self.diags
                    .emit(Diagnostic::error("error reading input data"));
                Outcome::Error
            }
            None => {
                trace!(target: "caseflow", "data source exhausted");
                Outcome::EndFile
            }
        }
    }

    fn destroy(&mut self) -> bool {
        !self.source.error()
    }
}
