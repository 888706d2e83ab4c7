use crate::{CollectedDiagnostics, Diagnostic, DiagnosticSink, Diagnostics, Severity};
use std::rc::Rc;
use test_log::test;

#[test]
fn test_collected_shares_buffer() {
    let c = CollectedDiagnostics::new();
    let sink: Diagnostics = Rc::new(c.clone());
    sink.emit(Diagnostic::warning("bad weight"));
    sink.emit(Diagnostic::error("gone"));
    assert_eq!(c.len(), 2);
    assert_eq!(c.count(Severity::Warning), 1);
    let all = c.take();
    assert_eq!(all[0].to_string(), "warning: bad weight");
    assert!(c.is_empty());
}
