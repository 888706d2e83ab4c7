// Errors here are for operations that can fail for reasons other than bad
// data flowing through a stream: temp files that can't be created, spill
// files that can't be decoded, settings that don't parse, chains that don't
// nest. Every error is logged once, where it's created, so a breakpoint on
// `Error::new` traps all of them.
//
// Data faults inside a row stream never travel as `Err` through `read` or
// `write`; they are turned into taint at the stream boundary.

use std::borrow::Cow;
use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

#[derive(Debug)]
pub struct Error {
    msg: String,
    #[allow(dead_code)]
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl std::fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.msg)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        error!(target: "caseflow", "{:?}", err);
        let msg = err.to_string();
        let inner = DynBacktraceError::from(err);
        Error { msg, inner }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    let err = SimpleErr(msg.into());
    Error::new(err)
}

#[test]
fn test_error() {
    let e = err("test error");
    assert_eq!(e.message(), "test error");
    assert_eq!(e.to_string(), "test error");
}

#[test]
fn test_error_from_io() {
    fn open_missing() -> Result<std::fs::File> {
        Ok(std::fs::File::open("/nonexistent/caseflow/path")?)
    }
    assert!(open_missing().is_err());
}
