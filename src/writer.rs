//! Output file handling and the human-readable run summary.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::ImportError;
use crate::sql::SqlScript;

/// Write `script` to `path`, creating parent directories and replacing any
/// existing file. The file handle is closed before this returns.
pub fn write_script<P: AsRef<Path>>(path: P, script: &SqlScript) -> Result<(), ImportError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
    }

    let file = fs::File::create(path).map_err(|e| ImportError::io(path, e))?;
    let mut out = BufWriter::new(file);

    write!(out, "{}", script)
        .and_then(|_| out.flush())
        .map_err(|e| ImportError::io(path, e))?;

    tracing::info!(path = %path.display(), lines = script.lines().len(), "wrote SQL script");
    Ok(())
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub employees_read: usize,
    pub employees_resolved: usize,
    pub employees_skipped: usize,
    pub companies: usize,
    pub departments: usize,
    pub jobs: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✅ Total employees read: {}", self.employees_read)?;
        writeln!(f, "✅ Total employees to insert: {}", self.employees_resolved)?;
        if self.employees_skipped > 0 {
            writeln!(f, "⚠️  Skipped employees: {}", self.employees_skipped)?;
        }
        writeln!(f, "✅ Total companies: {}", self.companies)?;
        writeln!(f, "✅ Total departments: {}", self.departments)?;
        write!(f, "✅ Total jobs: {}", self.jobs)
    }
}
