//! Problem intake: validation and atomic persistence of a problem
//! together with its hidden test cases.
//!
//! All test-case payloads are validated before any identifier is minted
//! or any store call happens; a single malformed element aborts the
//! whole operation with nothing written.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use themis_common::{ApiCode, Problem, ProblemSummary, StoreError, TestCase};

use crate::store::ProblemStore;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("a problem needs at least one test case")]
    NoTestCases,

    #[error("malformed test case payload")]
    TestCaseFormat,

    #[error("problem title already exists")]
    TitleExists,

    #[error("problem does not exist")]
    NotFound,

    #[error("update/delete semantics are not specified yet")]
    Unimplemented,

    #[error("store lookup failed: {0}")]
    Store(StoreError),

    #[error("failed to persist problem: {0}")]
    Persist(StoreError),
}

impl ProblemError {
    pub fn api_code(&self) -> ApiCode {
        match self {
            Self::NoTestCases | Self::TestCaseFormat => ApiCode::TestCaseFormatError,
            Self::TitleExists => ApiCode::ProblemAlreadyExists,
            Self::NotFound => ApiCode::ProblemNotFound,
            Self::Unimplemented => ApiCode::Unimplemented,
            Self::Store(_) | Self::Persist(_) => ApiCode::InternalError,
        }
    }
}

/// Problem definition as submitted, test cases still raw JSON strings.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub max_runtime: i64,
    pub max_memory: i64,
    pub test_cases: Vec<String>,
}

/// Exactly the two required fields; anything else fails the decode.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTestCase {
    input: String,
    expected: String,
}

pub struct ProblemService {
    store: Arc<dyn ProblemStore>,
}

impl ProblemService {
    pub fn new(store: Arc<dyn ProblemStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a problem with its test cases as one unit.
    /// Returns the minted problem identifier.
    pub async fn create(&self, req: NewProblem) -> Result<String, ProblemError> {
        if req.test_cases.is_empty() {
            tracing::warn!(title = %req.title, "problem submitted without test cases");
            return Err(ProblemError::NoTestCases);
        }

        // Decode everything before touching the store.
        let mut decoded = Vec::with_capacity(req.test_cases.len());
        for raw in &req.test_cases {
            let case: RawTestCase = serde_json::from_str(raw).map_err(|e| {
                tracing::warn!(title = %req.title, error = %e, "malformed test case payload");
                ProblemError::TestCaseFormat
            })?;
            if case.input.is_empty() || case.expected.is_empty() {
                tracing::warn!(title = %req.title, "test case with empty payload field");
                return Err(ProblemError::TestCaseFormat);
            }
            decoded.push(case);
        }

        // Fast-path duplicate check; the store constraint is the backstop.
        if self
            .store
            .count_by_title(&req.title)
            .await
            .map_err(ProblemError::Store)?
            > 0
        {
            tracing::warn!(title = %req.title, "problem title already exists");
            return Err(ProblemError::TitleExists);
        }

        let problem_id = Uuid::new_v4().to_string();
        let test_cases = decoded
            .into_iter()
            .map(|case| TestCase {
                id: Uuid::new_v4().to_string(),
                problem_id: problem_id.clone(),
                input: case.input,
                expected: case.expected,
            })
            .collect();

        let problem = Problem {
            id: problem_id.clone(),
            title: req.title.clone(),
            content: req.content,
            difficulty: req.difficulty,
            max_runtime: req.max_runtime,
            max_memory: req.max_memory,
            test_cases,
        };

        self.store.insert_problem(problem).await.map_err(|e| match e {
            StoreError::Duplicate { .. } => ProblemError::TitleExists,
            other => ProblemError::Persist(other),
        })?;

        tracing::info!(problem_id = %problem_id, title = %req.title, "problem created");
        Ok(problem_id)
    }

    pub async fn list(&self) -> Result<Vec<ProblemSummary>, ProblemError> {
        self.store.list().await.map_err(ProblemError::Store)
    }

    pub async fn detail(&self, problem_id: &str) -> Result<Problem, ProblemError> {
        self.store.get_by_id(problem_id).await.map_err(|e| match e {
            StoreError::NotFound => ProblemError::NotFound,
            other => ProblemError::Store(other),
        })
    }

    /// Partial-update semantics are an open contract question; rejected
    /// until specified.
    pub async fn update(&self, problem_id: &str) -> Result<(), ProblemError> {
        tracing::warn!(problem_id = %problem_id, "problem update requested but not specified");
        Err(ProblemError::Unimplemented)
    }

    /// Cascade-delete policy for test cases is unspecified; rejected
    /// until specified.
    pub async fn delete(&self, problem_id: &str) -> Result<(), ProblemError> {
        tracing::warn!(problem_id = %problem_id, "problem delete requested but not specified");
        Err(ProblemError::Unimplemented)
    }
}
