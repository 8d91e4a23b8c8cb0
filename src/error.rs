//! Error types.
//!
//! The calculators in [`crate::timeline`] and [`crate::ledger`] cannot
//! fail.  Errors only arise at the edges: the store, configuration and
//! the HTTP surface.

use crate::period::MonthYear;
use thiserror::Error;

/// Failures reported by a [`crate::store::Repository`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("income record for {0} already exists")]
    DuplicatePeriod(MonthYear),
    #[error("employee `{id}` was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { id: String, expected: u64, actual: u64 },
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Failures while reading [`crate::config::Config`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{name}` has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}
