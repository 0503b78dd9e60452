// SPDX-License-Identifier: Apache-2.0

use crate::ports::{AdapterError, Network};
use apiverge_model::{ContractDocument, ContractSource};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    NotFound { source: String },
    Format { extension: String },
    Validation { detail: String },
    Parse { detail: String },
    Network { detail: String },
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { source } => write!(f, "contract not found: {source}"),
            Self::Format { extension } => {
                write!(f, "unsupported contract format: {extension} (use .json or .yaml)")
            }
            Self::Validation { detail } => write!(f, "contract validation failed: {detail}"),
            Self::Parse { detail } => write!(f, "contract parse failed: {detail}"),
            Self::Network { detail } => write!(f, "contract fetch failed: {detail}"),
        }
    }
}

impl std::error::Error for ContractError {}

impl From<AdapterError> for ContractError {
    fn from(err: AdapterError) -> Self {
        Self::Network {
            detail: err.to_string(),
        }
    }
}

/// Cheap structural sniff: does this blob look like a contract document?
/// A substring check, deliberately not schema validation.
#[must_use]
pub fn structural_sniff(text: &str) -> bool {
    ["openapi", "swagger", "paths"]
        .iter()
        .any(|marker| text.contains(marker))
}

fn parse_json_then_yaml(text: &str) -> Result<Value, ContractError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
            ContractError::Parse {
                detail: format!("not JSON ({json_err}) and not YAML ({yaml_err})"),
            }
        }),
    }
}

fn load_from_path(path: &Path) -> Result<ContractDocument, ContractError> {
    if !path.exists() {
        return Err(ContractError::NotFound {
            source: path.display().to_string(),
        });
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let text = std::fs::read_to_string(path).map_err(|err| ContractError::Parse {
        detail: format!("failed to read {}: {err}", path.display()),
    })?;
    let raw = match extension.as_str() {
        "json" => serde_json::from_str::<Value>(&text).map_err(|err| ContractError::Parse {
            detail: format!("{}: {err}", path.display()),
        })?,
        "yaml" | "yml" => {
            serde_yaml::from_str::<Value>(&text).map_err(|err| ContractError::Parse {
                detail: format!("{}: {err}", path.display()),
            })?
        }
        other => {
            return Err(ContractError::Format {
                extension: if other.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{other}")
                },
            })
        }
    };
    Ok(ContractDocument::from_raw(path.display().to_string(), raw))
}

fn load_from_url(url: &str, network: &dyn Network) -> Result<ContractDocument, ContractError> {
    let body = network.get_text(url)?;
    if !structural_sniff(&body) {
        return Err(ContractError::Validation {
            detail: format!("{url} does not look like an OpenAPI/Swagger document"),
        });
    }
    let raw = parse_json_then_yaml(&body)?;
    Ok(ContractDocument::from_raw(url.to_string(), raw))
}

/// One entry of a repository-contents listing (GitHub-shaped).
#[derive(Debug, Deserialize)]
struct TreeEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

fn is_contract_candidate(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".json") || lower.ends_with(".yaml") || lower.ends_with(".yml")
}

/// Depth-first scan of a repository tree for the first sniff-passing
/// contract candidate.
fn scan_repo_tree(
    listing_url: &str,
    network: &dyn Network,
) -> Result<Option<ContractDocument>, ContractError> {
    let listing = network.get_text(listing_url)?;
    let entries: Vec<TreeEntry> =
        serde_json::from_str(&listing).map_err(|err| ContractError::Parse {
            detail: format!("repository listing at {listing_url} unreadable: {err}"),
        })?;

    for entry in entries {
        match entry.kind.as_str() {
            "file" if is_contract_candidate(&entry.name) => {
                let Some(fetch_url) = entry.download_url.or(entry.url) else {
                    continue;
                };
                let body = network.get_text(&fetch_url)?;
                if !structural_sniff(&body) {
                    continue;
                }
                tracing::info!(path = %entry.path, "contract candidate found in repository tree");
                let raw = parse_json_then_yaml(&body)?;
                return Ok(Some(ContractDocument::from_raw(entry.path, raw)));
            }
            "dir" => {
                if let Some(child_url) = entry.url {
                    if let Some(found) = scan_repo_tree(&child_url, network)? {
                        return Ok(Some(found));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Resolves a contract document from any of the three supported source
/// forms. Best effort: the sniff is a substring check and the tree scan
/// takes the first plausible candidate.
pub fn load_contract(
    source: &ContractSource,
    network: &dyn Network,
) -> Result<ContractDocument, ContractError> {
    match source {
        ContractSource::Path(path) => load_from_path(path),
        ContractSource::Url(url) => load_from_url(url, network),
        ContractSource::RepoTree(listing_url) => scan_repo_tree(listing_url, network)?
            .ok_or_else(|| ContractError::NotFound {
                source: format!("repo:{listing_url}"),
            }),
        _ => unreachable!("ContractSource is non_exhaustive but has no other variants"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeNetwork;

    const JSON_CONTRACT: &str = r#"{
        "openapi": "3.0.0",
        "paths": {"/users": {"get": {}}, "/orders": {"post": {}}}
    }"#;

    const YAML_CONTRACT: &str = "openapi: 3.0.0\npaths:\n  /users:\n    get: {}\n";

    #[test]
    fn local_json_contract_loads_declared_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("openapi.json");
        std::fs::write(&path, JSON_CONTRACT).expect("write");

        let doc = load_from_path(&path).expect("load");
        assert_eq!(doc.declared_paths(), vec!["/orders", "/users"]);
    }

    #[test]
    fn local_yaml_contract_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("swagger.yaml");
        std::fs::write(&path, YAML_CONTRACT).expect("write");

        let doc = load_from_path(&path).expect("load");
        assert_eq!(doc.path_count(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_from_path(Path::new("/nonexistent/openapi.json")).expect_err("absent");
        assert!(matches!(err, ContractError::NotFound { .. }));
    }

    #[test]
    fn unsupported_extension_is_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("openapi.toml");
        std::fs::write(&path, "paths = {}").expect("write");

        let err = load_from_path(&path).expect_err("format");
        assert!(matches!(err, ContractError::Format { .. }));
    }

    #[test]
    fn url_body_failing_sniff_is_validation_error() {
        let network =
            FakeNetwork::default().with_body("https://x/doc", "<html>not a contract</html>");
        let err = load_from_url("https://x/doc", &network).expect_err("sniff");
        assert!(matches!(err, ContractError::Validation { .. }));
    }

    #[test]
    fn url_contract_parses_yaml_fallback() {
        let network = FakeNetwork::default().with_body("https://x/openapi.yaml", YAML_CONTRACT);
        let doc = load_from_url("https://x/openapi.yaml", &network).expect("load");
        assert_eq!(doc.declared_paths(), vec!["/users"]);
    }

    #[test]
    fn repo_tree_scan_finds_nested_contract_depth_first() {
        let root = r#"[
            {"name": "README.md", "path": "README.md", "type": "file",
             "download_url": "https://raw/x/README.md"},
            {"name": "docs", "path": "docs", "type": "dir",
             "url": "https://api/x/contents/docs"}
        ]"#;
        let docs = r#"[
            {"name": "notes.yaml", "path": "docs/notes.yaml", "type": "file",
             "download_url": "https://raw/x/docs/notes.yaml"},
            {"name": "openapi.yaml", "path": "docs/openapi.yaml", "type": "file",
             "download_url": "https://raw/x/docs/openapi.yaml"}
        ]"#;
        let network = FakeNetwork::default()
            .with_body("https://api/x/contents", root)
            .with_body("https://api/x/contents/docs", docs)
            .with_body("https://raw/x/docs/notes.yaml", "just: notes")
            .with_body("https://raw/x/docs/openapi.yaml", YAML_CONTRACT);

        let source = ContractSource::RepoTree("https://api/x/contents".to_string());
        let doc = load_contract(&source, &network).expect("load");
        assert_eq!(doc.source, "docs/openapi.yaml");
        assert_eq!(doc.path_count(), 1);
    }

    #[test]
    fn repo_tree_without_candidates_is_not_found() {
        let root = r#"[
            {"name": "main.py", "path": "main.py", "type": "file",
             "download_url": "https://raw/x/main.py"}
        ]"#;
        let network = FakeNetwork::default().with_body("https://api/x/contents", root);
        let source = ContractSource::RepoTree("https://api/x/contents".to_string());
        let err = load_contract(&source, &network).expect_err("empty tree");
        assert!(matches!(err, ContractError::NotFound { .. }));
    }
}
