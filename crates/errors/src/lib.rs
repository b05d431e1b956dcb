#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the resguard resource manager
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone for easier handling.

use thiserror::Error;

pub mod avoidance;
pub mod config;

// Re-export all error types at the root
pub use avoidance::AvoidanceError;
pub use config::ConfigError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("avoidance error: {0}")]
    Avoidance(#[from] AvoidanceError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for resguard operations
pub type Result<T> = std::result::Result<T, Error>;
