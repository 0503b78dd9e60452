// SPDX-License-Identifier: Apache-2.0

use apiverge_core::canonical;
use apiverge_model::{DivergenceReport, ExecutionResult, GeneratedTests};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
    Serialize {
        detail: String,
    },
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { op, path, detail } => {
                write!(f, "artifact io error: {op} {} ({detail})", path.display())
            }
            Self::Serialize { detail } => write!(f, "artifact serialize error: {detail}"),
        }
    }
}

impl std::error::Error for ArtifactError {}

/// Persists run artifacts as timestamped JSON files under a `reports/`
/// tree: `divergences/`, `testcases/` and `executions/` families. No
/// manifest ties a run's files together; the orchestrator's in-memory
/// summary is the only cross-reference.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    reports_root: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(reports_root: impl Into<PathBuf>) -> Self {
        Self {
            reports_root: reports_root.into(),
        }
    }

    #[must_use]
    pub fn reports_root(&self) -> &Path {
        &self.reports_root
    }

    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string()
    }

    fn write_json<T: Serialize>(
        &self,
        family: &str,
        stem: &str,
        value: &T,
    ) -> Result<PathBuf, ArtifactError> {
        let dir = self.reports_root.join(family);
        std::fs::create_dir_all(&dir).map_err(|err| ArtifactError::Io {
            op: "create_dir_all",
            path: dir.clone(),
            detail: err.to_string(),
        })?;
        let path = dir.join(format!("{stem}_{}.json", Self::timestamp()));
        let text =
            serde_json::to_string_pretty(value).map_err(|err| ArtifactError::Serialize {
                detail: err.to_string(),
            })?;
        std::fs::write(&path, &text).map_err(|err| ArtifactError::Io {
            op: "write",
            path: path.clone(),
            detail: err.to_string(),
        })?;
        let digest = canonical::stable_json_hash_hex(value).unwrap_or_default();
        tracing::info!(path = %path.display(), sha256 = %digest, "artifact written");
        Ok(path)
    }

    pub fn write_divergence(&self, report: &DivergenceReport) -> Result<PathBuf, ArtifactError> {
        self.write_json("divergences", "divergence", report)
    }

    pub fn write_testcases(&self, tests: &GeneratedTests) -> Result<PathBuf, ArtifactError> {
        self.write_json("testcases", "testcases", tests)
    }

    pub fn write_execution(
        &self,
        results: &[ExecutionResult],
    ) -> Result<PathBuf, ArtifactError> {
        self.write_json("executions", "execution", &results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiverge_model::{TestCase, Verdict};

    #[test]
    fn divergence_artifact_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path().join("reports"));
        let mut report = DivergenceReport::default();
        report.missing_endpoints = vec!["GET /orders".to_string()];

        let path = store.write_divergence(&report).expect("write");
        assert!(path.starts_with(dir.path().join("reports").join("divergences")));
        let text = std::fs::read_to_string(&path).expect("read back");
        let back: DivergenceReport = serde_json::from_str(&text).expect("parse");
        assert_eq!(report, back);
    }

    #[test]
    fn testcases_artifact_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path().join("reports"));
        let tests = GeneratedTests::Cases(vec![
            TestCase::new("/b".into(), "GET".into(), "second".into(), Vec::new()),
            TestCase::new("/a".into(), "GET".into(), "first".into(), Vec::new()),
        ]);

        let path = store.write_testcases(&tests).expect("write");
        let text = std::fs::read_to_string(&path).expect("read back");
        let back: GeneratedTests = serde_json::from_str(&text).expect("parse");
        let cases = back.as_cases().expect("cases");
        assert_eq!(cases[0].endpoint, "/b");
        assert_eq!(cases[1].endpoint, "/a");
    }

    #[test]
    fn execution_artifact_filename_is_timestamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path().join("reports"));
        let results = vec![ExecutionResult::new(
            "/a".into(),
            "GET".into(),
            Some(200),
            Verdict::Pass,
            String::new(),
        )];

        let path = store.write_execution(&results).expect("write");
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("execution_"));
        assert!(name.ends_with(".json"));
        // execution_YYYY-MM-DD_HH-MM-SS.json
        assert_eq!(name.len(), "execution_".len() + 19 + ".json".len());
    }
}
