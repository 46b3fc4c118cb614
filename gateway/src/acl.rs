//! Per-consumer method allow-list.
//!
//! Each consumer maps to an ordered list of method patterns. A pattern is
//! either an exact fully qualified method (`/warden.v1.Biz/Check`) or a
//! prefix followed by a single trailing `*` (`/warden.v1.Biz/*`). Consumers
//! absent from the list, including the anonymous empty consumer, may call
//! nothing.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tonic::Status;

const WILDCARD: char = '*';

/// Raised when a consumer calls a method its patterns don't cover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consumer '{consumer}' does not have access to {method}")]
pub struct AccessDenied {
    pub consumer: String,
    pub method: String,
}

impl From<AccessDenied> for Status {
    fn from(err: AccessDenied) -> Self {
        Status::unauthenticated(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AclError {
    #[error("failed to read ACL file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ACL document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable consumer → patterns mapping, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct AccessList {
    rules: HashMap<String, Vec<String>>,
}

impl AccessList {
    pub fn new(rules: HashMap<String, Vec<String>>) -> Self {
        Self { rules }
    }

    /// Parse a JSON document of the form `{"consumer": ["pattern", ...]}`.
    pub fn from_json(data: &str) -> Result<Self, AclError> {
        let rules: HashMap<String, Vec<String>> = serde_json::from_str(data)?;
        Ok(Self::new(rules))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AclError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| AclError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Number of consumers with at least one rule entry.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_allowed(&self, consumer: &str, method: &str) -> bool {
        self.rules
            .get(consumer)
            .is_some_and(|patterns| patterns.iter().any(|p| pattern_matches(p, method)))
    }

    pub fn authorize(&self, consumer: &str, method: &str) -> Result<(), AccessDenied> {
        if self.is_allowed(consumer, method) {
            Ok(())
        } else {
            Err(AccessDenied {
                consumer: consumer.to_string(),
                method: method.to_string(),
            })
        }
    }
}

fn pattern_matches(pattern: &str, method: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => method.starts_with(prefix),
        None => pattern == method,
    }
}
