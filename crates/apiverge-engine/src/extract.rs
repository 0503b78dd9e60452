// SPDX-License-Identifier: Apache-2.0

use crate::ports::{AdapterError, TextGenerator};
use apiverge_model::{ExtractedRoutes, RouteRecord};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
    Service {
        detail: String,
    },
    Parse {
        detail: String,
    },
    Pattern {
        detail: String,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { op, path, detail } => {
                write!(f, "extract io error: {op} {} ({detail})", path.display())
            }
            Self::Service { detail } => write!(f, "extract service error: {detail}"),
            Self::Parse { detail } => write!(f, "extract parse error: {detail}"),
            Self::Pattern { detail } => write!(f, "extract pattern error: {detail}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<AdapterError> for ExtractError {
    fn from(err: AdapterError) -> Self {
        Self::Service {
            detail: err.to_string(),
        }
    }
}

/// A route-extraction strategy. Strategies are independent and combinable;
/// each returns the same record shape so new frameworks slot in without
/// touching the orchestrator.
pub trait RouteScanner {
    fn scan(&self, root: &Path) -> Result<Vec<RouteRecord>, ExtractError>;
}

/// Recursive file walk collecting paths with one of the given extensions,
/// in sorted order. `.git` and other dot-directories are skipped.
fn walk_source_files(
    root: &Path,
    extensions: &[&str],
    out: &mut Vec<PathBuf>,
) -> Result<(), ExtractError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(root)
        .map_err(|err| ExtractError::Io {
            op: "read_dir",
            path: root.to_path_buf(),
            detail: err.to_string(),
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if path.is_dir() {
            if name.starts_with('.') {
                continue;
            }
            walk_source_files(&path, extensions, out)?;
        } else if extensions
            .iter()
            .any(|ext| name.to_ascii_lowercase().ends_with(ext))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn read_lossy(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|err| ExtractError::Io {
        op: "read",
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fixed-rule scanner for route-registration idioms: Flask/FastAPI
/// decorators and Express router calls. Matches path literals only; the
/// HTTP verb is not recorded and order is not preserved.
#[derive(Debug, Default)]
pub struct PatternScanner;

impl PatternScanner {
    pub const EXTENSIONS: [&'static str; 3] = [".js", ".ts", ".py"];

    fn patterns() -> Result<Vec<Regex>, ExtractError> {
        [
            r#"@app\.(?:get|post|put|delete)\(['"]([^'"]*)['"]"#,
            r#"router\.(?:get|post|put|delete)\(['"]([^'"]*)['"]"#,
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| ExtractError::Pattern {
                detail: err.to_string(),
            })
        })
        .collect()
    }

    /// All literal path strings matched anywhere under `root`,
    /// de-duplicated as a sorted set.
    pub fn scan_paths(&self, root: &Path) -> Result<Vec<String>, ExtractError> {
        let patterns = Self::patterns()?;
        let mut files = Vec::new();
        walk_source_files(root, &Self::EXTENSIONS, &mut files)?;

        let mut found = BTreeSet::new();
        for file in files {
            let content = read_lossy(&file)?;
            for pattern in &patterns {
                for captures in pattern.captures_iter(&content) {
                    if let Some(m) = captures.get(1) {
                        found.insert(m.as_str().to_string());
                    }
                }
            }
        }
        Ok(found.into_iter().collect())
    }
}

impl RouteScanner for PatternScanner {
    fn scan(&self, root: &Path) -> Result<Vec<RouteRecord>, ExtractError> {
        Ok(self
            .scan_paths(root)?
            .into_iter()
            .map(|path| RouteRecord::new(None, path))
            .collect())
    }
}

/// Model-assisted scanner: ships the whole tree's text to the generation
/// service and parses the `{method, path}` list it returns.
///
/// No file-size or file-count cap is applied; the full tree travels in one
/// request. Callers targeting large trees must filter beforehand.
pub struct ModelScanner<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> ModelScanner<'a> {
    pub const EXTENSIONS: [&'static str; 5] = [".js", ".ts", ".py", ".java", ".go"];

    #[must_use]
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    fn build_prompt(root: &Path, files: &[PathBuf]) -> Result<String, ExtractError> {
        let mut prompt = String::from(
            "You are an expert backend analyst.\n\
             Extract all API endpoints and HTTP methods from this backend codebase.\n\n\
             Output only a JSON list like:\n\
             [\n  { \"method\": \"GET\", \"path\": \"/users\" }\n]\n\n\
             Codebase:\n",
        );
        for file in files {
            let rel = file.strip_prefix(root).unwrap_or(file);
            prompt.push_str(&format!("\n--- {} ---\n", rel.display()));
            prompt.push_str(&read_lossy(file)?);
        }
        Ok(prompt)
    }

    fn parse_reply(reply: &str) -> Result<Vec<RouteRecord>, ExtractError> {
        if let Ok(routes) = serde_json::from_str::<Vec<RouteRecord>>(reply) {
            return Ok(routes);
        }
        let fallback = reply
            .find('[')
            .and_then(|start| reply.rfind(']').map(|end| (start, end)))
            .filter(|(start, end)| start < end)
            .map(|(start, end)| &reply[start..=end]);
        match fallback {
            Some(slice) => {
                serde_json::from_str::<Vec<RouteRecord>>(slice).map_err(|err| {
                    ExtractError::Parse {
                        detail: format!("model route list unreadable: {err}"),
                    }
                })
            }
            None => Err(ExtractError::Parse {
                detail: "model reply carries no JSON list".to_string(),
            }),
        }
    }
}

impl RouteScanner for ModelScanner<'_> {
    fn scan(&self, root: &Path) -> Result<Vec<RouteRecord>, ExtractError> {
        let mut files = Vec::new();
        walk_source_files(root, &Self::EXTENSIONS, &mut files)?;
        let prompt = Self::build_prompt(root, &files)?;
        let reply = self.generator.generate(&prompt)?;
        Self::parse_reply(&reply)
    }
}

/// Runs both strategies and returns both result sets side by side.
/// Duplicates across the two sets are expected; the analyzer reconciles.
pub fn extract_routes(
    root: &Path,
    generator: &dyn TextGenerator,
) -> Result<ExtractedRoutes, ExtractError> {
    let pattern_routes = PatternScanner.scan_paths(root)?;
    let model_routes = ModelScanner::new(generator).scan(root)?;
    tracing::info!(
        pattern = pattern_routes.len(),
        model = model_routes.len(),
        "route extraction complete"
    );
    Ok(ExtractedRoutes::new(pattern_routes, model_routes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeGenerator;

    fn scratch_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir");
        std::fs::write(
            src.join("app.py"),
            "@app.get(\"/users\")\ndef users(): ...\n@app.post(\"/users\")\ndef create(): ...\n",
        )
        .expect("write app.py");
        std::fs::write(
            src.join("routes.js"),
            "router.get('/orders', handler);\nrouter.delete('/orders/:id', handler);\n",
        )
        .expect("write routes.js");
        std::fs::write(src.join("README.md"), "@app.get(\"/ignored\")").expect("write readme");
        dir
    }

    #[test]
    fn pattern_scanner_collects_sorted_unique_paths() {
        let dir = scratch_tree();
        let paths = PatternScanner.scan_paths(dir.path()).expect("scan");
        assert_eq!(paths, vec!["/orders", "/orders/:id", "/users"]);
    }

    #[test]
    fn pattern_scanner_ignores_non_source_extensions() {
        let dir = scratch_tree();
        let paths = PatternScanner.scan_paths(dir.path()).expect("scan");
        assert!(!paths.contains(&"/ignored".to_string()));
    }

    #[test]
    fn model_scanner_parses_direct_json_reply() {
        let dir = scratch_tree();
        let generator = FakeGenerator::default()
            .with_reply(r#"[{"method":"GET","path":"/users"},{"method":"POST","path":"/users"}]"#);
        let routes = ModelScanner::new(&generator).scan(dir.path()).expect("scan");
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].method.as_deref(), Some("GET"));
    }

    #[test]
    fn model_scanner_falls_back_to_bracket_substring() {
        let dir = scratch_tree();
        let generator = FakeGenerator::default().with_reply(
            "Here are the endpoints you asked for:\n[{\"method\":\"GET\",\"path\":\"/users\"}]\nHope this helps!",
        );
        let routes = ModelScanner::new(&generator).scan(dir.path()).expect("scan");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/users");
    }

    #[test]
    fn model_scanner_reports_unparseable_reply() {
        let dir = scratch_tree();
        let generator = FakeGenerator::default().with_reply("I could not find any endpoints.");
        let err = ModelScanner::new(&generator)
            .scan(dir.path())
            .expect_err("no list");
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn extract_routes_exposes_both_result_sets() {
        let dir = scratch_tree();
        let generator = FakeGenerator::default()
            .with_reply(r#"[{"method":"GET","path":"/users"}]"#);
        let routes = extract_routes(dir.path(), &generator).expect("extract");
        assert_eq!(routes.pattern_routes.len(), 3);
        assert_eq!(routes.model_routes.len(), 1);
    }
}
