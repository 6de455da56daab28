//! In-memory store used for development and tests.
//!
//! Uniqueness is enforced under a single write lock, which gives this
//! backend the same native-constraint behavior the contract demands of a
//! relational one: concurrent duplicate inserts serialize, and the loser
//! gets [`StoreError::Duplicate`].

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use themis_common::{Problem, ProblemSummary, Role, StoreError, UserProfile};

use super::{CredentialStore, NewAccount, ProblemStore};
use crate::auth;

#[derive(Debug, Clone)]
struct AccountRow {
    user_id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: Role,
}

#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<i64, AccountRow>>,
    problems: RwLock<HashMap<String, Problem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored hash for an account, test hook only.
    #[cfg(test)]
    pub(crate) async fn stored_hash(&self, user_id: i64) -> Option<String> {
        let accounts = self.accounts.read().await;
        accounts.get(&user_id).map(|row| row.password_hash.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn count_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().filter(|row| row.email == email).count() as u64)
    }

    async fn count_by_username(&self, username: &str) -> Result<u64, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .filter(|row| row.username == username)
            .count() as u64)
    }

    async fn count_by_id(&self, user_id: i64) -> Result<u64, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.contains_key(&user_id) as u64)
    }

    async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|row| row.email == account.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        if accounts.values().any(|row| row.username == account.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }

        accounts.insert(
            account.user_id,
            AccountRow {
                user_id: account.user_id,
                username: account.username,
                email: account.email,
                password_hash: account.password_hash,
                role: Role::User,
            },
        );
        Ok(())
    }

    async fn get_detail(&self, user_id: i64) -> Result<UserProfile, StoreError> {
        let accounts = self.accounts.read().await;
        let row = accounts.get(&user_id).ok_or(StoreError::NotFound)?;
        Ok(UserProfile {
            user_id: row.user_id,
            username: row.username.clone(),
            email: row.email.clone(),
            role: row.role,
        })
    }

    async fn update_detail(
        &self,
        user_id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;

        if !email.is_empty()
            && accounts
                .values()
                .any(|row| row.user_id != user_id && row.email == email)
        {
            return Err(StoreError::Duplicate { field: "email" });
        }

        let row = accounts.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        if !email.is_empty() {
            row.email = email.to_string();
        }
        if !password_hash.is_empty() {
            row.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn delete_account(&self, user_id: i64) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        accounts
            .remove(&user_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn id_by_username(&self, username: &str) -> Result<i64, StoreError> {
        let accounts = self.accounts.read().await;
        accounts
            .values()
            .find(|row| row.username == username)
            .map(|row| row.user_id)
            .ok_or(StoreError::NotFound)
    }

    async fn check_password(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let hash = {
            let accounts = self.accounts.read().await;
            accounts
                .values()
                .find(|row| row.username == username)
                .map(|row| row.password_hash.clone())
                .ok_or(StoreError::NotFound)?
        };
        auth::verify_password(password, &hash).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn count_by_title(&self, title: &str) -> Result<u64, StoreError> {
        let problems = self.problems.read().await;
        Ok(problems.values().filter(|p| p.title == title).count() as u64)
    }

    async fn insert_problem(&self, problem: Problem) -> Result<(), StoreError> {
        let mut problems = self.problems.write().await;
        if problems.values().any(|p| p.title == problem.title) {
            return Err(StoreError::Duplicate { field: "title" });
        }
        problems.insert(problem.id.clone(), problem);
        Ok(())
    }

    async fn get_by_id(&self, problem_id: &str) -> Result<Problem, StoreError> {
        let problems = self.problems.read().await;
        problems.get(problem_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        let problems = self.problems.read().await;
        Ok(problems
            .values()
            .map(|p| ProblemSummary {
                id: p.id.clone(),
                title: p.title.clone(),
                difficulty: p.difficulty.clone(),
            })
            .collect())
    }
}
