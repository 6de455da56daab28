//! Opaque store adapters.
//!
//! The relational store is an external collaborator; these traits are its
//! full contract as seen by the service layer. Backends must enforce the
//! uniqueness constraints natively - the services treat a
//! [`StoreError::Duplicate`] at write time as the canonical duplicate
//! signal, with the pre-insert existence checks serving only as a fast
//! path (check-then-act is racy across concurrent requests).

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use themis_common::{Problem, ProblemSummary, StoreError, UserProfile};

/// A fully-specified account ready for insertion.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// Account storage contract.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn count_by_email(&self, email: &str) -> Result<u64, StoreError>;

    async fn count_by_username(&self, username: &str) -> Result<u64, StoreError>;

    async fn count_by_id(&self, user_id: i64) -> Result<u64, StoreError>;

    /// Insert a new account. Username and email are unique; a violation
    /// surfaces as [`StoreError::Duplicate`].
    async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError>;

    /// Profile for `user_id`, never including the password hash.
    async fn get_detail(&self, user_id: i64) -> Result<UserProfile, StoreError>;

    /// Partial update: an empty `email` or `password_hash` means
    /// "leave unchanged".
    async fn update_detail(
        &self,
        user_id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// Hard delete, no tombstone.
    async fn delete_account(&self, user_id: i64) -> Result<(), StoreError>;

    async fn id_by_username(&self, username: &str) -> Result<i64, StoreError>;

    /// Compare `password` against the stored hash for `username`.
    async fn check_password(&self, username: &str, password: &str) -> Result<bool, StoreError>;
}

/// Problem storage contract.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn count_by_title(&self, title: &str) -> Result<u64, StoreError>;

    /// Persist a problem together with its full test-case set as one
    /// unit. Titles are unique; a collision surfaces as
    /// [`StoreError::Duplicate`].
    async fn insert_problem(&self, problem: Problem) -> Result<(), StoreError>;

    async fn get_by_id(&self, problem_id: &str) -> Result<Problem, StoreError>;

    async fn list(&self) -> Result<Vec<ProblemSummary>, StoreError>;
}
