//! Configuration management for the registrar.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use themis_common::constants::{
    DEFAULT_BCRYPT_COST, DEFAULT_LISTEN_ADDR, DEFAULT_REDIS_URL, DEFAULT_TOKEN_TTL_SECS,
    EMAIL_CODE_TTL_SECS, PICTURE_CODE_TTL_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Snowflake node id (0-1023); must be unique per running instance
    #[serde(default)]
    pub node_id: u16,

    /// Credential and session-token configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Verification challenge configuration
    #[serde(default)]
    pub challenges: ChallengeConfig,
}

/// Session token and password hashing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    /// Token validity in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// bcrypt work factor
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Verification challenge lifetimes
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Emailed code validity in seconds
    #[serde(default = "default_email_code_ttl")]
    pub email_code_ttl_secs: u64,

    /// Picture challenge validity in seconds
    #[serde(default = "default_picture_code_ttl")]
    pub picture_code_ttl_secs: u64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            email_code_ttl_secs: default_email_code_ttl(),
            picture_code_ttl_secs: default_picture_code_ttl(),
        }
    }
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_token_secret() -> String { "themis-dev-secret".to_string() }
fn default_token_ttl() -> u64 { DEFAULT_TOKEN_TTL_SECS }
fn default_bcrypt_cost() -> u32 { DEFAULT_BCRYPT_COST }
fn default_email_code_ttl() -> u64 { EMAIL_CODE_TTL_SECS }
fn default_picture_code_ttl() -> u64 { PICTURE_CODE_TTL_SECS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            listen_addr: default_listen_addr(),
            node_id: 0,
            auth: AuthConfig::default(),
            challenges: ChallengeConfig::default(),
        }
    }
}
