//! Error handling for the contrast governance engine
//!
//! Evaluation, remediation and aggregation are total and never return these
//! errors. They surface only at construction time (malformed configuration)
//! and at the outer edges (contract generation, export, config loading).

use crate::tier::Tier;
use thiserror::Error;

/// Main error type for the governance engine
#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid tier thresholds: {message}")]
    InvalidThresholds { message: String },

    #[error("Invalid weight profile '{profile}': {message}")]
    InvalidWeights { profile: String, message: String },

    #[error("Invalid role table for surface '{surface}': {message}")]
    InvalidRoleTable { surface: String, message: String },

    #[error("Tier {tier} cannot be required by a role")]
    UnsupportedRequiredTier { tier: Tier },

    #[error("Unknown surface: {name}")]
    UnknownSurface { name: String },

    #[error("Contract generation failed: {reason}")]
    Contract { reason: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration source could not be read")]
    ConfigSource {
        #[source]
        source: Box<figment::Error>,
    },

    #[error("Mutex lock failed: {resource}")]
    MutexPoisoned { resource: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

impl GovernanceError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a threshold validation error
    pub fn thresholds(message: impl Into<String>) -> Self {
        Self::InvalidThresholds {
            message: message.into(),
        }
    }

    /// Create a weight profile validation error
    pub fn weights(profile: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidWeights {
            profile: profile.into(),
            message: message.into(),
        }
    }

    /// Create a role table validation error
    pub fn role_table(surface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoleTable {
            surface: surface.into(),
            message: message.into(),
        }
    }

    pub fn unknown_surface(name: impl Into<String>) -> Self {
        Self::UnknownSurface { name: name.into() }
    }

    /// Create a contract generation error
    pub fn contract(reason: impl Into<String>) -> Self {
        Self::Contract {
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn poisoned(resource: impl Into<String>) -> Self {
        Self::MutexPoisoned {
            resource: resource.into(),
        }
    }
}

/// Helper trait for mutex access that reports poisoning instead of panicking
pub trait SafeLock<T: ?Sized> {
    fn safe_lock(&self, resource: &str) -> GovernanceResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self, resource: &str) -> GovernanceResult<std::sync::MutexGuard<'_, T>> {
        self.lock().map_err(|_| GovernanceError::poisoned(resource))
    }
}

/// Helper trait for RwLock read access
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self, resource: &str) -> GovernanceResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self, resource: &str) -> GovernanceResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read().map_err(|_| GovernanceError::poisoned(resource))
    }
}

/// Helper trait for RwLock write access
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self, resource: &str)
        -> GovernanceResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(
        &self,
        resource: &str,
    ) -> GovernanceResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write().map_err(|_| GovernanceError::poisoned(resource))
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for GovernanceError {
    fn from(err: serde_json::Error) -> Self {
        GovernanceError::serialization("json_operation", err)
    }
}

/// Convert from figment extraction errors
impl From<figment::Error> for GovernanceError {
    fn from(err: figment::Error) -> Self {
        GovernanceError::ConfigSource {
            source: Box::new(err),
        }
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for GovernanceError {
    fn from(err: std::io::Error) -> Self {
        GovernanceError::io("io_operation", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = GovernanceError::config("audit capacity must be positive");
        assert!(config_err.to_string().contains("Configuration error"));

        let weights_err = GovernanceError::weights("sidebar", "weights sum to 1.2");
        assert!(weights_err.to_string().contains("sidebar"));

        let tier_err = GovernanceError::UnsupportedRequiredTier { tier: Tier::Fail };
        assert!(tier_err.to_string().contains("fail"));
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = GovernanceError::io("reading config", io_err);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("I/O operation failed"));
    }

    #[test]
    fn poisoned_mutex_is_reported() {
        use std::sync::{Arc, Mutex};

        let shared = Arc::new(Mutex::new(0u32));
        let cloned = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err = shared.safe_lock("counter").unwrap_err();
        assert!(matches!(err, GovernanceError::MutexPoisoned { .. }));
    }
}
