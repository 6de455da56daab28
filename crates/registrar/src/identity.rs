//! Account identity workflows: registration, login, detail retrieval,
//! update, deletion.
//!
//! Every operation is a fixed check -> verify -> mutate sequence; a later
//! step never runs once an earlier one fails. The uniqueness pre-checks
//! are a fast path only - the store's own constraints are the backstop
//! for the check-then-act window, and a duplicate surfaced at insert
//! time maps to the same error as a pre-check hit.

use std::sync::Arc;
use thiserror::Error;

use themis_common::constants::cache_keys::EMAIL_CODE_PREFIX;
use themis_common::{ApiCode, CacheError, StoreError, UserProfile};

use crate::auth::{self, TokenMinter};
use crate::cache::CodeCache;
use crate::ids::SnowflakeGenerator;
use crate::store::{CredentialStore, NewAccount};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email already registered")]
    EmailExists,

    #[error("username already taken")]
    UsernameExists,

    #[error("verification code expired")]
    CodeExpired,

    #[error("wrong verification code")]
    CodeMismatch,

    #[error("username does not exist")]
    UsernameNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("user does not exist")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token minting failed: {0}")]
    Token(String),

    #[error("store lookup failed: {0}")]
    Store(StoreError),

    #[error("failed to persist account: {0}")]
    Persist(StoreError),

    #[error("failed to delete account: {0}")]
    Delete(StoreError),

    #[error("cache backend error: {0}")]
    Cache(String),
}

impl IdentityError {
    /// API result code for this error. Dependency failures collapse to
    /// the generic internal code so storage details never leak.
    pub fn api_code(&self) -> ApiCode {
        match self {
            Self::EmailExists => ApiCode::EmailAlreadyExists,
            Self::UsernameExists => ApiCode::UsernameAlreadyExists,
            Self::CodeExpired => ApiCode::CodeExpired,
            Self::CodeMismatch => ApiCode::CodeMismatch,
            Self::UsernameNotFound => ApiCode::UsernameNotFound,
            Self::WrongPassword => ApiCode::WrongPassword,
            Self::UserNotFound => ApiCode::UserNotFound,
            Self::Hash(_)
            | Self::Token(_)
            | Self::Store(_)
            | Self::Persist(_)
            | Self::Delete(_)
            | Self::Cache(_) => ApiCode::InternalError,
        }
    }
}

/// Registration / login request fields, caller-supplied strings.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub email: String,
    pub code: String,
}

pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    codes: Arc<dyn CodeCache>,
    ids: Arc<SnowflakeGenerator>,
    tokens: Arc<TokenMinter>,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codes: Arc<dyn CodeCache>,
        ids: Arc<SnowflakeGenerator>,
        tokens: Arc<TokenMinter>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            codes,
            ids,
            tokens,
            bcrypt_cost,
        }
    }

    /// Register a new account and return a session token.
    pub async fn register(&self, req: &Credentials) -> Result<String, IdentityError> {
        if self
            .store
            .count_by_email(&req.email)
            .await
            .map_err(IdentityError::Store)?
            > 0
        {
            tracing::warn!(email = %req.email, "email already registered");
            return Err(IdentityError::EmailExists);
        }

        if self
            .store
            .count_by_username(&req.username)
            .await
            .map_err(IdentityError::Store)?
            > 0
        {
            tracing::warn!(username = %req.username, "username already taken");
            return Err(IdentityError::UsernameExists);
        }

        self.verify_email_code(&req.email, &req.code).await?;

        let user_id = self.ids.next();
        let password_hash = auth::hash_password(&req.password, self.bcrypt_cost)
            .map_err(|e| IdentityError::Hash(e.to_string()))?;

        let account = NewAccount {
            user_id,
            username: req.username.clone(),
            password_hash,
            email: req.email.clone(),
        };
        self.store
            .insert_account(account)
            .await
            .map_err(Self::map_insert_error)?;

        tracing::info!(user_id, username = %req.username, "account registered");
        self.mint(&req.username)
    }

    /// Authenticate and return a session token.
    ///
    /// A valid email code is required on every login, not just at
    /// registration; this is deliberate.
    pub async fn login(&self, req: &Credentials) -> Result<String, IdentityError> {
        self.verify_email_code(&req.email, &req.code).await?;

        if self
            .store
            .count_by_username(&req.username)
            .await
            .map_err(IdentityError::Store)?
            == 0
        {
            tracing::warn!(username = %req.username, "login for unknown username");
            return Err(IdentityError::UsernameNotFound);
        }

        let ok = self
            .store
            .check_password(&req.username, &req.password)
            .await
            .map_err(IdentityError::Store)?;
        if !ok {
            tracing::warn!(username = %req.username, "wrong password");
            return Err(IdentityError::WrongPassword);
        }

        tracing::debug!(username = %req.username, "login succeeded");
        self.mint(&req.username)
    }

    /// Stored profile, excluding the password hash.
    pub async fn get_detail(&self, user_id: i64) -> Result<UserProfile, IdentityError> {
        self.require_exists(user_id).await?;
        self.store
            .get_detail(user_id)
            .await
            .map_err(IdentityError::Store)
    }

    /// Hard-delete an account.
    pub async fn delete(&self, user_id: i64) -> Result<(), IdentityError> {
        self.require_exists(user_id).await?;
        self.store
            .delete_account(user_id)
            .await
            .map_err(IdentityError::Delete)?;
        tracing::info!(user_id, "account deleted");
        Ok(())
    }

    /// Update email and/or password. Empty strings mean "leave
    /// unchanged". A new email demands a valid verification code for
    /// that email before any mutation; a new password is hashed only
    /// when supplied.
    pub async fn update_detail(
        &self,
        user_id: i64,
        new_email: &str,
        new_password: &str,
        code: &str,
    ) -> Result<(), IdentityError> {
        self.require_exists(user_id).await?;

        if !new_email.is_empty() {
            self.verify_email_code(new_email, code).await?;
        }

        let password_hash = if new_password.is_empty() {
            String::new()
        } else {
            auth::hash_password(new_password, self.bcrypt_cost)
                .map_err(|e| IdentityError::Hash(e.to_string()))?
        };

        self.store
            .update_detail(user_id, new_email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { field: "email" } => IdentityError::EmailExists,
                other => IdentityError::Store(other),
            })?;

        tracing::info!(user_id, "account updated");
        Ok(())
    }

    /// Identifier lookup by username.
    pub async fn get_id_by_username(&self, username: &str) -> Result<i64, IdentityError> {
        self.store.id_by_username(username).await.map_err(|e| match e {
            StoreError::NotFound => IdentityError::UsernameNotFound,
            other => IdentityError::Store(other),
        })
    }

    /// Fetch and compare the live email challenge.
    ///
    /// The read does not consume the code; within its lifetime a code
    /// can verify more than once (preserved behavior, pinned by tests).
    async fn verify_email_code(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        let key = format!("{EMAIL_CODE_PREFIX}{email}");
        let expected = self.codes.get(&key).await.map_err(|e| match e {
            CacheError::Expired => IdentityError::CodeExpired,
            CacheError::Backend(msg) => IdentityError::Cache(msg),
        })?;

        if expected != code {
            tracing::warn!(email = %email, "wrong verification code");
            return Err(IdentityError::CodeMismatch);
        }
        Ok(())
    }

    async fn require_exists(&self, user_id: i64) -> Result<(), IdentityError> {
        let count = self
            .store
            .count_by_id(user_id)
            .await
            .map_err(IdentityError::Store)?;
        if count == 0 {
            tracing::warn!(user_id, "unknown user id");
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }

    /// Duplicates surfaced by the store's own constraints are the
    /// pre-check failures in disguise, not internal errors.
    fn map_insert_error(e: StoreError) -> IdentityError {
        match e {
            StoreError::Duplicate { field: "email" } => IdentityError::EmailExists,
            StoreError::Duplicate { field: "username" } => IdentityError::UsernameExists,
            other => IdentityError::Persist(other),
        }
    }

    fn mint(&self, username: &str) -> Result<String, IdentityError> {
        self.tokens
            .mint(username)
            .map_err(|e| IdentityError::Token(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use themis_common::constants::EMAIL_CODE_TTL_SECS;

    use crate::cache::MemoryCodeCache;
    use crate::store::MemoryStore;

    const TEST_COST: u32 = 4;

    struct Fixture {
        store: Arc<MemoryStore>,
        cache: Arc<MemoryCodeCache>,
        service: IdentityService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCodeCache::new(EMAIL_CODE_TTL_SECS));
        let service = IdentityService::new(
            store.clone(),
            cache.clone(),
            Arc::new(SnowflakeGenerator::new(1).unwrap()),
            Arc::new(TokenMinter::new("test-secret", 3600)),
            TEST_COST,
        );
        Fixture {
            store,
            cache,
            service,
        }
    }

    fn creds(username: &str, password: &str, email: &str, code: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
            email: email.into(),
            code: code.into(),
        }
    }

    async fn put_code(cache: &MemoryCodeCache, email: &str, code: &str) {
        let now = chrono::Utc::now().timestamp();
        cache
            .put(&format!("email_code:{email}"), code, now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn register_with_live_code_succeeds() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;

        let token = f
            .service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();
        assert!(!token.is_empty());
        assert_eq!(f.store.count_by_username("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn register_rejects_used_email_without_insert() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        put_code(&f.cache, "a@x.com", "654321").await;
        let err = f
            .service
            .register(&creds("bob", "pw2", "a@x.com", "654321"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailExists));
        assert_eq!(f.store.count_by_username("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_rejects_used_username() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        put_code(&f.cache, "b@x.com", "654321").await;
        let err = f
            .service
            .register(&creds("alice", "pw2", "b@x.com", "654321"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UsernameExists));
    }

    #[tokio::test]
    async fn register_with_absent_code_is_code_expired() {
        let f = fixture();
        let err = f
            .service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::CodeExpired));
        assert_eq!(f.store.count_by_username("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_with_stale_code_is_code_expired() {
        let f = fixture();
        let stale = chrono::Utc::now().timestamp() - EMAIL_CODE_TTL_SECS as i64 - 60;
        f.cache
            .put("email_code:a@x.com", "123456", stale)
            .await
            .unwrap();

        let err = f
            .service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::CodeExpired));
    }

    #[tokio::test]
    async fn register_with_wrong_code_is_mismatch() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;

        let err = f
            .service
            .register(&creds("alice", "pw1", "a@x.com", "999999"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::CodeMismatch));
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        put_code(&f.cache, "a@x.com", "222222").await;
        let token = f
            .service
            .login(&creds("alice", "pw1", "a@x.com", "222222"))
            .await
            .unwrap();
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn login_order_is_code_then_username_then_password() {
        let f = fixture();

        // No code cached: fails before the username check even runs.
        let err = f
            .service
            .login(&creds("ghost", "pw", "a@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::CodeExpired));

        // Live code, unknown username.
        put_code(&f.cache, "a@x.com", "123456").await;
        let err = f
            .service
            .login(&creds("ghost", "pw", "a@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UsernameNotFound));
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        put_code(&f.cache, "a@x.com", "222222").await;
        let err = f
            .service
            .login(&creds("alice", "wrong", "a@x.com", "222222"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::WrongPassword));
    }

    #[tokio::test]
    async fn live_code_is_replayable_within_its_lifetime() {
        // The read path does not consume the code. Two uses of the same
        // not-yet-expired code both pass; pinned so a future move to
        // single-use semantics is a deliberate decision.
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        let token = f
            .service
            .login(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn insert_time_duplicate_maps_like_the_pre_check() {
        // A store whose existence checks see nothing, but whose insert
        // hits the uniqueness constraint: the check-then-act window.
        struct RacingStore {
            inner: MemoryStore,
        }

        #[async_trait]
        impl CredentialStore for RacingStore {
            async fn count_by_email(&self, _: &str) -> Result<u64, StoreError> {
                Ok(0)
            }
            async fn count_by_username(&self, _: &str) -> Result<u64, StoreError> {
                Ok(0)
            }
            async fn count_by_id(&self, user_id: i64) -> Result<u64, StoreError> {
                self.inner.count_by_id(user_id).await
            }
            async fn insert_account(&self, account: NewAccount) -> Result<(), StoreError> {
                self.inner.insert_account(account).await
            }
            async fn get_detail(&self, user_id: i64) -> Result<UserProfile, StoreError> {
                self.inner.get_detail(user_id).await
            }
            async fn update_detail(
                &self,
                user_id: i64,
                email: &str,
                hash: &str,
            ) -> Result<(), StoreError> {
                self.inner.update_detail(user_id, email, hash).await
            }
            async fn delete_account(&self, user_id: i64) -> Result<(), StoreError> {
                self.inner.delete_account(user_id).await
            }
            async fn id_by_username(&self, username: &str) -> Result<i64, StoreError> {
                self.inner.id_by_username(username).await
            }
            async fn check_password(&self, u: &str, p: &str) -> Result<bool, StoreError> {
                self.inner.check_password(u, p).await
            }
        }

        let cache = Arc::new(MemoryCodeCache::new(EMAIL_CODE_TTL_SECS));
        let service = IdentityService::new(
            Arc::new(RacingStore {
                inner: MemoryStore::new(),
            }),
            cache.clone(),
            Arc::new(SnowflakeGenerator::new(1).unwrap()),
            Arc::new(TokenMinter::new("test-secret", 3600)),
            TEST_COST,
        );

        put_code(&cache, "a@x.com", "123456").await;
        service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        // Same email again: the blind pre-checks pass, the insert loses.
        let err = service
            .register(&creds("bob", "pw2", "a@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailExists));
    }

    #[tokio::test]
    async fn get_detail_excludes_hash_and_checks_existence() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        let user_id = f.service.get_id_by_username("alice").await.unwrap();
        let profile = f.service.get_detail(user_id).await.unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.email, "a@x.com");

        let err = f.service.get_detail(user_id + 1).await.unwrap_err();
        assert!(matches!(err, IdentityError::UserNotFound));
    }

    #[tokio::test]
    async fn delete_removes_the_account() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();

        let user_id = f.service.get_id_by_username("alice").await.unwrap();
        f.service.delete(user_id).await.unwrap();
        assert!(matches!(
            f.service.get_detail(user_id).await.unwrap_err(),
            IdentityError::UserNotFound
        ));
    }

    #[tokio::test]
    async fn update_without_password_never_rehashes() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();
        let user_id = f.service.get_id_by_username("alice").await.unwrap();
        let before = f.store.stored_hash(user_id).await.unwrap();

        // Same email twice, no password: stored hash is untouched.
        put_code(&f.cache, "a@x.com", "777777").await;
        f.service
            .update_detail(user_id, "a@x.com", "", "777777")
            .await
            .unwrap();
        f.service
            .update_detail(user_id, "a@x.com", "", "777777")
            .await
            .unwrap();

        assert_eq!(f.store.stored_hash(user_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn update_with_new_email_requires_a_live_code() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();
        let user_id = f.service.get_id_by_username("alice").await.unwrap();

        // No code issued for the new address.
        let err = f
            .service
            .update_detail(user_id, "new@x.com", "", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::CodeExpired));

        put_code(&f.cache, "new@x.com", "555555").await;
        f.service
            .update_detail(user_id, "new@x.com", "", "555555")
            .await
            .unwrap();
        let profile = f.service.get_detail(user_id).await.unwrap();
        assert_eq!(profile.email, "new@x.com");
    }

    #[tokio::test]
    async fn update_password_changes_the_hash() {
        let f = fixture();
        put_code(&f.cache, "a@x.com", "123456").await;
        f.service
            .register(&creds("alice", "pw1", "a@x.com", "123456"))
            .await
            .unwrap();
        let user_id = f.service.get_id_by_username("alice").await.unwrap();
        let before = f.store.stored_hash(user_id).await.unwrap();

        f.service
            .update_detail(user_id, "", "pw2", "")
            .await
            .unwrap();

        assert_ne!(f.store.stored_hash(user_id).await.unwrap(), before);
        put_code(&f.cache, "a@x.com", "888888").await;
        f.service
            .login(&creds("alice", "pw2", "a@x.com", "888888"))
            .await
            .unwrap();
    }
}
