//! Core types shared across Themis components.

use serde::{Deserialize, Serialize};

/// Account role
///
/// A closed enumeration rather than a raw boolean so the meaning is
/// carried by the type, not by convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User profile as returned to clients.
///
/// Never carries the password hash; the hash stays inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Globally unique 63-bit identifier, assigned once at registration
    pub user_id: i64,

    pub username: String,

    pub email: String,

    pub role: Role,
}

/// A problem definition together with its hidden test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// Unique problem identifier (uuid)
    pub id: String,

    /// Unique title, duplicate-checked at creation
    pub title: String,

    /// Problem statement
    pub content: String,

    /// Difficulty label (free-form, e.g. "easy" / "medium" / "hard")
    pub difficulty: String,

    /// Maximum runtime in milliseconds
    pub max_runtime: i64,

    /// Maximum memory in megabytes
    pub max_memory: i64,

    /// Hidden test cases; at least one exists at creation time
    pub test_cases: Vec<TestCase>,
}

/// A single hidden test case, exclusively owned by one problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique test case identifier (uuid)
    pub id: String,

    /// Owning problem identifier
    pub problem_id: String,

    /// Input fed to the submission
    pub input: String,

    /// Expected output
    pub expected: String,
}

/// Lightweight problem listing entry (no statement, no test cases).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub difficulty: String,
}

/// A submission handed to the judging pipeline.
///
/// The pipeline itself is an external collaborator; this is the shape of
/// what crosses the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub problem_id: String,
    pub user_id: i64,
    pub language: String,
    pub source_code: String,
}
