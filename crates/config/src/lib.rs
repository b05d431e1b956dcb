#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration for the resguard resource manager
//!
//! A system description is a TOML file naming the initially available
//! units and one `[[process]]` table per process with its current
//! allocation and maximum claim:
//!
//! ```toml
//! available = [3, 3, 2]
//!
//! [[process]]
//! allocation = [0, 1, 0]
//! max_claim = [7, 5, 3]
//! ```
//!
//! The config layer only carries the numbers; all semantic validation
//! (shape, signs, claim coverage) happens in the manager's constructor,
//! so a file and a hand-built manager go through the same checks.

use resguard_avoidance::AvoidanceManager;
use resguard_errors::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One process row: what it holds and what it may ever claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub allocation: Vec<i64>,
    pub max_claim: Vec<i64>,
}

/// Full initial-system description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    /// Units of each resource initially unallocated.
    #[serde(default)]
    pub available: Vec<i64>,

    /// Per-process rows, in process-index order.
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessConfig>,
}

impl SystemConfig {
    /// Parse a TOML system description.
    ///
    /// # Errors
    ///
    /// `ConfigError::ParseError` on malformed TOML.
    pub fn parse(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| {
            Error::Config(ConfigError::ParseError {
                message: e.to_string(),
            })
        })
    }

    /// Load a system description from a file.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` if the path does not exist,
    /// `ConfigError::Invalid` on unreadable content, or the errors of
    /// [`SystemConfig::parse`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(ConfigError::NotFound {
                path: path.display().to_string(),
            }));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(ConfigError::Invalid {
                message: format!("failed to read {}: {e}", path.display()),
            })
        })?;
        Self::parse(&content)
    }

    /// Write the description back out as TOML.
    ///
    /// # Errors
    ///
    /// `ConfigError::SerializeError` or `ConfigError::WriteError`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(ConfigError::SerializeError {
                error: e.to_string(),
            })
        })?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })
        })?;
        Ok(())
    }

    /// Build a live manager from this description.
    ///
    /// # Errors
    ///
    /// The construction errors of the manager: `EmptySystem`,
    /// `ShapeMismatch`, `NegativeValue`, `ClaimBelowAllocation`.
    pub fn into_manager(self) -> Result<AvoidanceManager> {
        let (allocation, max_claim) = self
            .processes
            .into_iter()
            .map(|row| (row.allocation, row.max_claim))
            .unzip();
        AvoidanceManager::from_rows(allocation, max_claim, self.available)
    }
}
