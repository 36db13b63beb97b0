use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use result_kernel_core::{Branch, RawRecord, RecordSource, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Directory-backed record store: one `<branch-id>.json` file per branch,
/// each holding a JSON array of loosely-keyed row objects produced by the
/// spreadsheet export pipeline.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchStatus {
    pub branch: Branch,
    pub exists: bool,
}

impl JsonStore {
    #[must_use]
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn branch_path(&self, branch: Branch) -> PathBuf {
        self.data_dir.join(format!("{}.json", branch.as_str()))
    }

    /// Read every record stored for `branch`. A missing file means the
    /// branch simply has no backing data and yields an empty vector; a
    /// present file that is not a JSON array also yields an empty vector.
    /// Rows that are not objects are skipped.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load_branch(&self, branch: Branch) -> Result<Vec<RawRecord>> {
        let path = self.branch_path(branch);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let body = fs::read_to_string(&path)
            .with_context(|| format!("failed to read branch file {}", path.display()))?;
        let parsed: Value = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse branch file {}", path.display()))?;

        let Value::Array(rows) = parsed else {
            tracing::warn!(branch = %branch, path = %path.display(), "branch file is not a JSON array");
            return Ok(Vec::new());
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(fields) => Some(RawRecord(fields)),
                _ => None,
            })
            .collect())
    }

    /// Per-branch backing-store presence, in catalog order.
    #[must_use]
    pub fn branch_statuses(&self) -> Vec<BranchStatus> {
        Branch::ALL
            .iter()
            .map(|branch| BranchStatus { branch: *branch, exists: self.branch_path(*branch).exists() })
            .collect()
    }
}

impl RecordSource for JsonStore {
    fn load(&self, branch: Branch) -> Result<Vec<RawRecord>, StoreError> {
        self.load_branch(branch).map_err(|err| {
            let message = format!("{err:#}");
            tracing::warn!(branch = %branch, error = %message, "branch store unavailable");
            StoreError { branch, message }
        })
    }
}
