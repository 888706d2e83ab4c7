// Settings the core reads but never writes. They are passed explicitly to
// whatever needs them; there is no process-wide instance.

use crate::{err, tmpfile::SystemTempFiles, Result, TempFileProvider};
use std::{fmt, rc::Rc, str::FromStr};

pub const DEFAULT_WORKSPACE: usize = 64 * 1024 * 1024;
pub const DEFAULT_MXLOOPS: u64 = 40;
pub const DEFAULT_MIN_SORT_RECORDS: usize = 64;
pub const DEFAULT_MAX_MERGE_ORDER: usize = 7;

#[derive(Clone)]
pub struct Settings {
    /// Bytes of record data a sink or sort run may hold in memory.
    pub workspace: usize,
    /// Iteration cap for a LOOP with no index clause.
    pub mxloops: u64,
    pub min_sort_records: usize,
    pub max_merge_order: usize,
    pub temp_files: Rc<dyn TempFileProvider>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            workspace: DEFAULT_WORKSPACE,
            mxloops: DEFAULT_MXLOOPS,
            min_sort_records: DEFAULT_MIN_SORT_RECORDS,
            max_merge_order: DEFAULT_MAX_MERGE_ORDER,
            temp_files: Rc::new(SystemTempFiles::new()),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("workspace", &self.workspace)
            .field("mxloops", &self.mxloops)
            .field("min_sort_records", &self.min_sort_records)
            .field("max_merge_order", &self.max_merge_order)
            .finish_non_exhaustive()
    }
}

fn parse_var<T: FromStr>(name: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| err(format!("{name}: can't parse {val:?}")))
}

impl Settings {
    /// Defaults, overlaid with `CASEFLOW_WORKSPACE`, `CASEFLOW_MXLOOPS` and
    /// `CASEFLOW_TMPDIR` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut s = Settings::default();
        if let Some(v) = get("CASEFLOW_WORKSPACE") {
            s.workspace = parse_var("CASEFLOW_WORKSPACE", &v)?;
        }
        if let Some(v) = get("CASEFLOW_MXLOOPS") {
            s.mxloops = parse_var("CASEFLOW_MXLOOPS", &v)?;
        }
        if let Some(v) = get("CASEFLOW_TMPDIR") {
            if v.is_empty() {
                return Err(err("CASEFLOW_TMPDIR: empty directory name"));
            }
            s.temp_files = Rc::new(SystemTempFiles::in_dir(v));
        }
        Ok(s)
    }

    pub fn with_workspace(mut self, workspace: usize) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_mxloops(mut self, mxloops: u64) -> Self {
        self.mxloops = mxloops;
        self
    }

    pub fn with_max_merge_order(mut self, order: usize) -> Self {
        assert!(order >= 2, "merge order must be at least 2");
        self.max_merge_order = order;
        self
    }

    pub fn with_min_sort_records(mut self, n: usize) -> Self {
        self.min_sort_records = n.max(1);
        self
    }

    pub fn with_temp_files(mut self, temp_files: Rc<dyn TempFileProvider>) -> Self {
        self.temp_files = temp_files;
        self
    }

    /// How many records of the given per-record cost fit in the workspace.
    /// Never less than one.
    pub fn workspace_records(&self, cost: usize) -> usize {
        (self.workspace / cost.max(1)).max(1)
    }
}
