// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// In-memory summary returned by the orchestrator after a full run.
///
/// The artifact paths are the only tie between a run's three persisted
/// reports; no on-disk manifest exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct RunSummary {
    pub repository: String,
    pub contract_source: String,
    pub divergence_report_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testcases_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_report_path: Option<PathBuf>,
    pub divergence_total: usize,
    pub test_case_count: usize,
}

impl RunSummary {
    #[must_use]
    pub fn new(
        repository: String,
        contract_source: String,
        divergence_report_path: PathBuf,
        divergence_total: usize,
    ) -> Self {
        Self {
            repository,
            contract_source,
            divergence_report_path,
            testcases_path: None,
            execution_report_path: None,
            divergence_total,
            test_case_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_round_trips() {
        let mut summary = RunSummary::new(
            "https://example.com/demo.git".to_string(),
            "swagger/swagger.yaml".to_string(),
            PathBuf::from("reports/divergences/divergence_2026-08-06_12-00-00.json"),
            4,
        );
        summary.testcases_path =
            Some(PathBuf::from("reports/testcases/testcases_2026-08-06_12-00-01.json"));
        summary.test_case_count = 6;
        let text = serde_json::to_string(&summary).expect("serialize");
        let back: RunSummary = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(summary, back);
    }
}
