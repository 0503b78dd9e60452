#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const CRATE_NAME: &str = "apiverge-core";

pub const ENV_APIVERGE_LOG_LEVEL: &str = "APIVERGE_LOG_LEVEL";
pub const ENV_APIVERGE_WORKDIR: &str = "APIVERGE_WORKDIR";
pub const ENV_APIVERGE_API_KEY: &str = "APIVERGE_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_APIVERGE_MODEL: &str = "APIVERGE_MODEL";
pub const ENV_APIVERGE_ENDPOINT: &str = "APIVERGE_ENDPOINT";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::DependencyFailure => "dependency_failure",
            Self::Internal => "internal",
        }
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Working directory for repository checkouts and the `reports/` tree.
///
/// `APIVERGE_WORKDIR` wins when set and non-empty; otherwise the current
/// directory is used.
#[must_use]
pub fn resolve_workdir() -> PathBuf {
    if let Ok(explicit) = std::env::var(ENV_APIVERGE_WORKDIR) {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MachineError {}

pub mod canonical {
    use serde::Serialize;
    use serde_json::{Map, Value};
    use sha2::{Digest, Sha256};

    pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
        let raw = serde_json::to_value(value)?;
        let normalized = normalize_json_value(raw);
        serde_json::to_vec(&normalized)
    }

    #[must_use]
    pub fn stable_hash_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn stable_json_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
        let bytes = stable_json_bytes(value)?;
        Ok(stable_hash_hex(&bytes))
    }

    fn normalize_json_value(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut sorted = Map::new();
                let mut entries: Vec<(String, Value)> = map
                    .into_iter()
                    .map(|(k, v)| (k, normalize_json_value(v)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                for (k, v) in entries {
                    sorted.insert(k, v);
                }
                Value::Object(sorted)
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(normalize_json_value).collect())
            }
            other => other,
        }
    }
}
