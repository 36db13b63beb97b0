use std::path::PathBuf;

use result_kernel_core::{
    resolve_registration, subjects_for, Branch, CanonicalRecord, LookupPolicy, ResolveError,
};
use result_kernel_store_json::{BranchStatus, JsonStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupRequest {
    pub registration: String,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupResponse {
    pub result: Vec<CanonicalRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectEntry {
    pub code: String,
    pub name: String,
}

/// Facade wiring the JSON record store into the resolution engine behind
/// the request/response types shared by the HTTP service and the CLI.
#[derive(Debug, Clone)]
pub struct ResultLookupApi {
    store: JsonStore,
    policy: LookupPolicy,
}

impl ResultLookupApi {
    #[must_use]
    pub fn new(data_dir: PathBuf, policy: LookupPolicy) -> Self {
        Self { store: JsonStore::open(data_dir), policy }
    }

    #[must_use]
    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Resolve one registration identifier across the branch collections.
    ///
    /// # Errors
    /// Returns [`ResolveError::Validation`] for an empty identifier or,
    /// under the strict policy, an unrecognized branch hint;
    /// [`ResolveError::Storage`] when a strict hinted search hits an
    /// unreadable branch store.
    pub fn lookup(&self, request: LookupRequest) -> Result<LookupResponse, ResolveError> {
        let result = resolve_registration(
            &self.store,
            &request.registration,
            request.branch.as_deref(),
            self.policy,
        )?;
        Ok(LookupResponse { result })
    }

    /// Backing-store presence for every catalog branch.
    #[must_use]
    pub fn branches(&self) -> Vec<BranchStatus> {
        self.store.branch_statuses()
    }

    /// The subject table of one branch, in teaching-scheme order.
    #[must_use]
    pub fn subjects(&self, branch: Branch) -> Vec<SubjectEntry> {
        subjects_for(branch)
            .iter()
            .map(|(code, name)| SubjectEntry {
                code: (*code).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }
}
