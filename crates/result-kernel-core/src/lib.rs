use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum ResolveError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A branch backing store could not be read. Recoverable in the permissive
/// search mode; a hard failure only when the search is pinned to one branch.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
#[error("branch store {branch} unavailable: {message}")]
pub struct StoreError {
    pub branch: Branch,
    pub message: String,
}

/// The closed set of branches with independently maintained record
/// collections. Declaration order is the default search order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Branch {
    #[serde(rename = "AI&DS-E")]
    AiDs,
    #[serde(rename = "CS(AI)-F")]
    CsAi,
    #[serde(rename = "CS(DS)-G")]
    CsDs,
    #[serde(rename = "CS")]
    Cs,
    #[serde(rename = "CSR-D")]
    Csr,
    #[serde(rename = "CS(IOT)-H")]
    CsIot,
}

impl Branch {
    pub const ALL: [Self; 6] =
        [Self::AiDs, Self::CsAi, Self::CsDs, Self::Cs, Self::Csr, Self::CsIot];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiDs => "AI&DS-E",
            Self::CsAi => "CS(AI)-F",
            Self::CsDs => "CS(DS)-G",
            Self::Cs => "CS",
            Self::Csr => "CSR-D",
            Self::CsIot => "CS(IOT)-H",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AI&DS-E" => Some(Self::AiDs),
            "CS(AI)-F" => Some(Self::CsAi),
            "CS(DS)-G" => Some(Self::CsDs),
            "CS" => Some(Self::Cs),
            "CSR-D" => Some(Self::Csr),
            "CS(IOT)-H" => Some(Self::CsIot),
            _ => None,
        }
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const AI_DS_SUBJECTS: &[(&str, &str)] = &[
    ("4AID2-01", "Discrete Mathematics Structure"),
    ("4AID1-03", "Managerial Economics and Financial Accounting"),
    ("4AID1-02", "Technical Communication"),
    ("4AID3-04", "Microprocessor & Interfaces"),
    ("4AID4-05", "Database Management System"),
    ("4AID4-06", "Theory of Computation"),
    ("4AID4-07", "Data Communication and Computer Networks"),
    ("4AID4-21", "Microprocessor & Interfaces Lab"),
    ("4AID4-22", "Database Management System Lab"),
    ("4AID4-23", "Network Programming Lab"),
    ("4AID4-24", "Linux Shell Programming Lab"),
    ("4AID4-25", "Java Lab"),
    ("FEC13", "Foundation Courses"),
];

const CS_AI_SUBJECTS: &[(&str, &str)] = &[
    ("4CAI2-01", "Discrete Mathematics Structure"),
    ("4CAI1-03", "Managerial Economics and Financial Accounting"),
    ("4CAI1-02", "Technical Communication"),
    ("4CAI3-04", "Microprocessor & Interfaces"),
    ("4CAI4-05", "Database Management System"),
    ("4CAI4-06", "Theory of Computation"),
    ("4CAI4-07", "Data Communication and Computer Networks"),
    ("4CAI4-21", "Microprocessor & Interfaces Lab"),
    ("4CAI4-22", "Database Management System Lab"),
    ("4CAI4-23", "Network Programming Lab"),
    ("4CAI4-24", "Linux Shell Programming Lab"),
    ("4CAI4-25", "Java Lab"),
    ("FEC13", "Foundation Courses"),
];

const CS_DS_SUBJECTS: &[(&str, &str)] = &[
    ("4CDS2-01", "Discrete Mathematics Structure"),
    ("4CDS1-03", "Managerial Economics and Financial Accounting"),
    ("4CDS1-02", "Technical Communication"),
    ("4CDS3-04", "Microprocessor & Interfaces"),
    ("4CDS4-05", "Database Management System"),
    ("4CDS4-06", "Theory of Computation"),
    ("4CDS4-07", "Data Communication and Computer Networks"),
    ("4CDS4-21", "Microprocessor & Interfaces Lab"),
    ("4CDS4-22", "Database Management System Lab"),
    ("4CDS4-23", "Network Programming Lab"),
    ("4CDS4-24", "Linux Shell Programming Lab"),
    ("4CDS4-25", "Java Lab"),
    ("FEC12", "Foundation Course"),
];

const CS_SUBJECTS: &[(&str, &str)] = &[
    ("4CS2-01", "Discrete Mathematics Structure"),
    ("4CS1-03", "Managerial Economics and Financial Accounting"),
    ("4CS1-02", "Technical Communication"),
    ("4CS3-04", "Microprocessor & Interfaces"),
    ("4CS4-05", "Database Management System"),
    ("4CS4-06", "Theory of Computation"),
    ("4CS4-07", "Data Communication and Computer Networks"),
    ("4CS4-21", "Microprocessor & Interfaces Lab"),
    ("4CS4-22", "Database Management System Lab"),
    ("4CS4-23", "Network Programming Lab"),
    ("4CS4-24", "Linux Shell Programming Lab"),
    ("4CS4-25", "Java Lab"),
    ("FEC13", "Foundation Courses"),
];

const CSR_SUBJECTS: &[(&str, &str)] = &[
    ("4CSR2-01", "Discrete Mathematics Structure"),
    ("4CSR1-03", "Managerial Economics and Financial Accounting"),
    ("4CSR1-02", "Technical Communication"),
    ("4CSR3-04", "Microprocessor & Interfaces"),
    ("4CSR4-05", "Database Management System"),
    ("4CSR4-06", "Theory of Computation"),
    ("4CSR4-07", "Data Communication and Computer Networks"),
    ("4CSR4-21", "Microprocessor & Interfaces Lab"),
    ("4CSR4-22", "Database Management System Lab"),
    ("4CSR4-23", "Network Programming Lab"),
    ("4CSR4-24", "Linux Shell Programming Lab"),
    ("4CSR4-25", "Java Lab"),
    ("FEC13", "Foundation Courses"),
];

const CS_IOT_SUBJECTS: &[(&str, &str)] = &[
    ("4CIT2-01", "Discrete Mathematics Structure"),
    ("4CIT1-03", "Managerial Economics and Financial Accounting"),
    ("4CIT1-02", "Technical Communication"),
    ("4CIT3-04", "Microprocessor & Interfaces"),
    ("4CIT4-05", "Database Management System"),
    ("4CIT4-06", "Theory of Computation"),
    ("4CIT4-07", "Data Communication and Computer Networks"),
    ("4CIT4-21", "Microprocessor & Interfaces Lab"),
    ("4CIT4-22", "Database Management System Lab"),
    ("4CIT4-23", "Network Programming Lab"),
    ("4CIT4-24", "Linux Shell Programming Lab"),
    ("4CIT4-25", "Java Lab"),
    ("FEC13", "Foundation Courses"),
];

/// Subject code to name table for one branch. Codes are branch-scoped; the
/// same code string may name a different subject in another branch.
#[must_use]
pub fn subjects_for(branch: Branch) -> &'static [(&'static str, &'static str)] {
    match branch {
        Branch::AiDs => AI_DS_SUBJECTS,
        Branch::CsAi => CS_AI_SUBJECTS,
        Branch::CsDs => CS_DS_SUBJECTS,
        Branch::Cs => CS_SUBJECTS,
        Branch::Csr => CSR_SUBJECTS,
        Branch::CsIot => CS_IOT_SUBJECTS,
    }
}

#[must_use]
pub fn subject_name(branch: Branch, code: &str) -> Option<&'static str> {
    subjects_for(branch)
        .iter()
        .find_map(|(known, name)| (*known == code).then_some(*name))
}

/// One row of branch data as stored: arbitrary column labels mapped to
/// scalar values. Keys are used trimmed; `null` is read as an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.trim(), value))
    }
}

/// Key substrings that mark a column as registration-like.
pub const REGISTRATION_KEY_TOKENS: &[&str] = &["reg", "registration", "regno", "reg.no", "regno."];

/// Institutional prefix carried by registration identifiers; any value
/// containing it is a candidate regardless of its column label.
pub const REGISTRATION_VALUE_TOKEN: &str = "PIET";

/// Collect the strings in a record that plausibly hold the registration
/// identifier, in record key order. Duplicates are allowed: a value can
/// qualify through its column label and through its own content.
#[must_use]
pub fn registration_candidates(record: &RawRecord) -> Vec<String> {
    let mut candidates = Vec::new();
    for (key, value) in record.entries() {
        let key_lower = key.to_lowercase();
        if REGISTRATION_KEY_TOKENS.iter().any(|token| key_lower.contains(token)) {
            if let Some(text) = value.as_str() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    candidates.push(trimmed.to_string());
                }
            }
        }
        if let Some(text) = value.as_str() {
            if text.to_uppercase().contains(REGISTRATION_VALUE_TOKEN) {
                candidates.push(text.trim().to_string());
            }
        }
    }
    candidates
}

#[must_use]
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Tolerant identifier equality over normalized inputs: exact match, or
/// either side a prefix of the other. Callers accept that one real
/// identifier prefixing another yields a match for both.
#[must_use]
pub fn identifiers_match(query: &str, candidate: &str) -> bool {
    candidate == query || candidate.starts_with(query) || query.starts_with(candidate)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CoreField {
    Registration,
    Name,
    UniversityRoll,
    CollegeRoll,
    TotalBack,
    Result,
    Sgpa,
}

/// One canonical destination and the column-label synonyms that feed it.
/// Labels are compared after dot/space stripping and lowercasing.
#[derive(Debug, Clone, Copy)]
pub struct CoreFieldRule {
    pub field: CoreField,
    pub synonyms: &'static [&'static str],
}

pub const CORE_FIELD_RULES: &[CoreFieldRule] = &[
    CoreFieldRule {
        field: CoreField::Registration,
        synonyms: &["reg. no", "reg", "registration", "regno", "registration no"],
    },
    CoreFieldRule { field: CoreField::Name, synonyms: &["name", "student name"] },
    CoreFieldRule {
        field: CoreField::UniversityRoll,
        synonyms: &["uni-roll no", "uni roll no", "uni roll", "uni-roll", "uniroll"],
    },
    CoreFieldRule { field: CoreField::CollegeRoll, synonyms: &["col roll no", "col roll"] },
    CoreFieldRule {
        field: CoreField::TotalBack,
        synonyms: &["total back", "totalback", "back", "backlog"],
    },
    CoreFieldRule { field: CoreField::Result, synonyms: &["result", "status"] },
    CoreFieldRule { field: CoreField::Sgpa, synonyms: &["sgpa", "gpa", "cgpa"] },
];

/// Fold a column label for synonym comparison: drop dots and spaces,
/// lowercase the rest.
#[must_use]
pub fn fold_key(key: &str) -> String {
    key.chars().filter(|ch| !matches!(*ch, '.' | ' ')).collect::<String>().to_lowercase()
}

/// Duplicate-column artifact from tabular conversion: a label ending in a
/// dot followed by digits, e.g. `4CS4-05.1`.
#[must_use]
pub fn is_artifact_key(key: &str) -> bool {
    key.rsplit_once('.').is_some_and(|(_, suffix)| {
        !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit())
    })
}

/// Heuristic shape of a subject-code column label: at least one ASCII
/// letter and one ASCII digit.
#[must_use]
pub fn is_subject_shaped(key: &str) -> bool {
    key.chars().any(|ch| ch.is_ascii_alphabetic()) && key.chars().any(|ch| ch.is_ascii_digit())
}

/// Behavior switches observed to drift across historical deployments,
/// consolidated behind one value instead of parallel code paths.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct LookupPolicy {
    /// Reject an unrecognized branch hint instead of ignoring it, and pin
    /// the search to a recognized hint's branch alone.
    pub strict_branch_hint: bool,
    /// Emit the college roll number field in normalized output.
    pub include_college_roll: bool,
}

/// Normalized view of one matched record: core fields under presentation
/// names, subject columns enriched with branch-scoped names, and the source
/// branch appended. Absent core fields are omitted, never errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    #[serde(rename = "Reg. No", skip_serializing_if = "Option::is_none")]
    pub registration: Option<Value>,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(rename = "Uni-Roll No", skip_serializing_if = "Option::is_none")]
    pub university_roll: Option<Value>,
    #[serde(rename = "Col Roll No", skip_serializing_if = "Option::is_none")]
    pub college_roll: Option<Value>,
    #[serde(rename = "Total Back", skip_serializing_if = "Option::is_none")]
    pub total_back: Option<Value>,
    #[serde(rename = "Result", skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(rename = "SGPA", skip_serializing_if = "Option::is_none")]
    pub sgpa: Option<Value>,
    #[serde(flatten)]
    pub subjects: Map<String, Value>,
    #[serde(rename = "Branch")]
    pub branch: Branch,
}

impl CanonicalRecord {
    fn empty(branch: Branch) -> Self {
        Self {
            registration: None,
            name: None,
            university_roll: None,
            college_roll: None,
            total_back: None,
            result: None,
            sgpa: None,
            subjects: Map::new(),
            branch,
        }
    }
}

fn cleaned_value(value: &Value) -> Value {
    if value.is_null() {
        Value::String(String::new())
    } else {
        value.clone()
    }
}

/// Shape one raw record into its canonical form for the given branch.
///
/// Artifact columns are dropped first; each core destination takes the
/// first key that folds to one of its synonyms; remaining keys are either
/// enriched through the branch subject table, passed through when
/// subject-code-shaped, or dropped.
#[must_use]
pub fn normalize_record(record: &RawRecord, branch: Branch, policy: LookupPolicy) -> CanonicalRecord {
    let fields: Vec<(String, Value)> = record
        .entries()
        .filter(|(key, _)| !is_artifact_key(key))
        .map(|(key, value)| (key.to_string(), cleaned_value(value)))
        .collect();

    let mut cleaned = CanonicalRecord::empty(branch);
    let mut consumed: BTreeSet<usize> = BTreeSet::new();

    for rule in CORE_FIELD_RULES {
        let mut matched: Option<usize> = None;
        'synonyms: for synonym in rule.synonyms {
            let folded = fold_key(synonym);
            for (index, (key, _)) in fields.iter().enumerate() {
                if fold_key(key) == folded {
                    matched = Some(index);
                    break 'synonyms;
                }
            }
        }
        let Some(index) = matched else {
            continue;
        };
        consumed.insert(index);
        let value = Some(fields[index].1.clone());
        match rule.field {
            CoreField::Registration => cleaned.registration = value,
            CoreField::Name => cleaned.name = value,
            CoreField::UniversityRoll => cleaned.university_roll = value,
            // Consumed either way so the label never leaks through the
            // subject pass; emitted only when the policy asks for it.
            CoreField::CollegeRoll => {
                if policy.include_college_roll {
                    cleaned.college_roll = value;
                }
            }
            CoreField::TotalBack => cleaned.total_back = value,
            CoreField::Result => cleaned.result = value,
            CoreField::Sgpa => cleaned.sgpa = value,
        }
    }

    for (index, (key, value)) in fields.iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }
        if let Some(name) = subject_name(branch, key) {
            cleaned.subjects.insert(format!("{name} ({key})"), value.clone());
        } else if is_subject_shaped(key) {
            cleaned.subjects.insert(key.clone(), value.clone());
        }
    }

    cleaned
}

/// Source of raw records for one branch. Implementations report unreadable
/// backing data as [`StoreError`]; the orchestrator decides whether that is
/// recoverable for the request at hand.
pub trait RecordSource {
    /// Load every raw record stored for `branch`. A branch with no backing
    /// data yields an empty vector, not an error.
    ///
    /// # Errors
    /// Returns [`StoreError`] when backing data exists but cannot be read.
    fn load(&self, branch: Branch) -> Result<Vec<RawRecord>, StoreError>;
}

/// Branch visit order for a request: a recognized hint is searched first
/// (alone under the strict policy), otherwise the catalog order stands.
#[must_use]
pub fn search_order(hint: Option<Branch>, policy: LookupPolicy) -> Vec<Branch> {
    match hint {
        Some(branch) if policy.strict_branch_hint => vec![branch],
        Some(branch) => {
            let mut order = vec![branch];
            order.extend(Branch::ALL.iter().copied().filter(|other| *other != branch));
            order
        }
        None => Branch::ALL.to_vec(),
    }
}

fn resolve_branch_hint(
    hint: Option<&str>,
    policy: LookupPolicy,
) -> Result<Option<Branch>, ResolveError> {
    let Some(raw) = hint else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match Branch::parse(trimmed) {
        Some(branch) => Ok(Some(branch)),
        None if policy.strict_branch_hint => {
            Err(ResolveError::Validation(format!("unknown branch: {trimmed}")))
        }
        None => Ok(None),
    }
}

/// Resolve a registration identifier across branch record collections.
///
/// Branches are visited in the order given by [`search_order`]; within a
/// branch every record is scanned and every match kept, so legacy duplicate
/// rows survive. The first branch that yields at least one match ends the
/// search. An empty result is a successful outcome.
///
/// # Errors
/// Returns [`ResolveError::Validation`] for an empty query (before any
/// storage access) or, under the strict policy, an unrecognized branch
/// hint; [`ResolveError::Storage`] when the strict policy pinned the search
/// to a single branch whose store is unavailable.
pub fn resolve_registration(
    source: &impl RecordSource,
    query: &str,
    branch_hint: Option<&str>,
    policy: LookupPolicy,
) -> Result<Vec<CanonicalRecord>, ResolveError> {
    let query_norm = normalize_identifier(query);
    if query_norm.is_empty() {
        return Err(ResolveError::Validation("registration number is required".to_string()));
    }

    let hint = resolve_branch_hint(branch_hint, policy)?;
    let hinted_only = policy.strict_branch_hint && hint.is_some();

    let mut matches = Vec::new();
    for branch in search_order(hint, policy) {
        let records = match source.load(branch) {
            Ok(records) => records,
            Err(err) if hinted_only => return Err(err.into()),
            // Already reported by the source; this branch contributes
            // nothing and the search moves on.
            Err(_) => Vec::new(),
        };
        for record in &records {
            let matched = registration_candidates(record)
                .iter()
                .map(|candidate| normalize_identifier(candidate))
                .any(|candidate| identifiers_match(&query_norm, &candidate));
            if matched {
                matches.push(normalize_record(record, branch, policy));
            }
        }
        if !matches.is_empty() {
            break;
        }
    }

    Ok(matches)
}
