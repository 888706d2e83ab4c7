// The diagnostic channel carries human-readable notes, warnings and errors
// out of the core without interrupting control flow. What happens to them
// (a pivot table, a terminal, a log) is the embedder's business.

use std::{cell::RefCell, fmt, rc::Rc};
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
}

impl Diagnostic {
    pub fn warning(text: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            text: text.into(),
        }
    }
    pub fn error(text: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", tag, self.text)
    }
}

pub trait DiagnosticSink {
    fn emit(&self, diag: Diagnostic);
}

pub type Diagnostics = Rc<dyn DiagnosticSink>;

/// Routes diagnostics into `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Note => info!(target: "caseflow", "{}", diag.text),
            Severity::Warning => warn!(target: "caseflow", "{}", diag.text),
            Severity::Error => error!(target: "caseflow", "{}", diag.text),
        }
    }
}

/// Keeps diagnostics in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct CollectedDiagnostics(Rc<RefCell<Vec<Diagnostic>>>);

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    pub fn count(&self, severity: Severity) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn emit(&self, diag: Diagnostic) {
        self.0.borrow_mut().push(diag);
    }
}
