// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a contract document comes from.
///
/// The loader dispatches on this three ways: a local file, a plain URL, or a
/// recursive scan of a hosted repository's file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContractSource {
    Path(PathBuf),
    Url(String),
    /// Root listing URL of a repository-contents API.
    RepoTree(String),
}

impl ContractSource {
    /// Parses a CLI-style descriptor: `repo:` prefix selects a tree scan,
    /// an http(s) scheme selects a URL, anything else is a local path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("repo:") {
            return Self::RepoTree(rest.to_string());
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::Url(raw.to_string());
        }
        Self::Path(PathBuf::from(raw))
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::RepoTree(url) => format!("repo:{url}"),
        }
    }
}

impl fmt::Display for ContractSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A parsed OpenAPI/Swagger document.
///
/// `paths` is the path → method → operation mapping lifted out of the raw
/// document; `raw` keeps the full document for the analyzer prompt. Loaded
/// once per run and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct ContractDocument {
    pub source: String,
    pub paths: BTreeMap<String, BTreeMap<String, Value>>,
    pub raw: Value,
}

impl ContractDocument {
    /// Lifts the `paths` object out of a parsed document. Missing or
    /// non-object `paths` yields an empty map; the loader treats that as a
    /// best-effort document, not an error.
    #[must_use]
    pub fn from_raw(source: String, raw: Value) -> Self {
        let mut paths = BTreeMap::new();
        if let Some(path_obj) = raw.get("paths").and_then(Value::as_object) {
            for (path, methods) in path_obj {
                let mut by_method = BTreeMap::new();
                if let Some(method_obj) = methods.as_object() {
                    for (method, operation) in method_obj {
                        by_method.insert(method.to_ascii_lowercase(), operation.clone());
                    }
                }
                paths.insert(path.clone(), by_method);
            }
        }
        Self { source, paths, raw }
    }

    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn declared_paths(&self) -> Vec<&str> {
        self.paths.keys().map(String::as_str).collect()
    }
}
