use crate::Result;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::trace;

/// Source of scratch files for spilled sinks and sort runs. The returned
/// file is deleted when its last handle drops, sealed or not.
pub trait TempFileProvider {
    fn create(&self) -> Result<NamedTempFile>;
}

#[derive(Clone, Debug, Default)]
pub struct SystemTempFiles {
    dir: Option<PathBuf>,
}

impl SystemTempFiles {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        SystemTempFiles {
            dir: Some(dir.into()),
        }
    }
    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }
}

impl TempFileProvider for SystemTempFiles {
    fn create(&self) -> Result<NamedTempFile> {
        let mut b = tempfile::Builder::new();
        b.prefix("caseflow-");
        let file = match &self.dir {
            Some(dir) => b.tempfile_in(dir)?,
            None => b.tempfile()?,
        };
        trace!(target: "caseflow", path = ?file.path(), "created temp file");
        Ok(file)
    }
}
