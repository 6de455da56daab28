//! # Themis Common
//!
//! Shared types, result codes, and error contracts used across Themis components.
//!
//! ## Modules
//! - `types` - Core data structures (UserProfile, Problem, TestCase, etc.)
//! - `error` - Adapter error contracts (StoreError, CacheError)
//! - `codes` - API result codes and the uniform response envelope
//! - `constants` - Shared configuration constants

pub mod codes;
pub mod constants;
pub mod error;
pub mod types;

pub use codes::{ApiCode, ApiResponse};
pub use error::{CacheError, StoreError};
pub use types::*;
