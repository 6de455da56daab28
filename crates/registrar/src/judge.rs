//! Judging pipeline boundary.
//!
//! The sandboxed execution engine is an external collaborator; this is
//! the interface a submission crosses. No implementation ships with the
//! registrar - the submission route answers "not supported" until an
//! engine is wired into [`crate::state::AppState`].

use async_trait::async_trait;

use themis_common::SubmissionRequest;

#[async_trait]
pub trait JudgeQueue: Send + Sync {
    /// Enqueue a submission for asynchronous evaluation.
    async fn submit(&self, request: SubmissionRequest) -> anyhow::Result<()>;
}
