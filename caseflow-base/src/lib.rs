mod diag;
mod error;
mod settings;
mod taint;
mod tmpfile;


pub use diag::{
    CollectedDiagnostics, Diagnostic, DiagnosticSink, Diagnostics, Severity, TracingDiagnostics,
};
pub use error::{err, Error, Result};
pub use settings::{
    Settings, DEFAULT_MAX_MERGE_ORDER, DEFAULT_MIN_SORT_RECORDS, DEFAULT_MXLOOPS,
    DEFAULT_WORKSPACE,
};
pub use taint::Taint;
pub use tmpfile::{SystemTempFiles, TempFileProvider};
