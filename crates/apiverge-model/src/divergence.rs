// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Structured divergence report with the seven fixed analysis categories.
///
/// Each category is an ordered sequence of free-form descriptions produced
/// by the analyzer. Written to `reports/divergences/` once per run and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DivergenceReport {
    #[serde(default)]
    pub missing_endpoints: Vec<String>,
    #[serde(default)]
    pub extra_endpoints: Vec<String>,
    #[serde(default)]
    pub method_mismatches: Vec<String>,
    #[serde(default)]
    pub parameter_mismatches: Vec<String>,
    #[serde(default)]
    pub request_body_mismatches: Vec<String>,
    #[serde(default)]
    pub response_mismatches: Vec<String>,
    #[serde(default)]
    pub status_code_mismatches: Vec<String>,
}

impl DivergenceReport {
    pub const CATEGORY_KEYS: [&'static str; 7] = [
        "missing_endpoints",
        "extra_endpoints",
        "method_mismatches",
        "parameter_mismatches",
        "request_body_mismatches",
        "response_mismatches",
        "status_code_mismatches",
    ];

    /// Total divergences across all seven categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.missing_endpoints.len()
            + self.extra_endpoints.len()
            + self.method_mismatches.len()
            + self.parameter_mismatches.len()
            + self.request_body_mismatches.len()
            + self.response_mismatches.len()
            + self.status_code_mismatches.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}
