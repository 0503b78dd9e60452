// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One generated test case: a live request plus free-text steps, the last
/// of which implies the expected status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TestCase {
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl TestCase {
    #[must_use]
    pub fn new(endpoint: String, method: String, purpose: String, steps: Vec<String>) -> Self {
        Self {
            endpoint,
            method: method.to_ascii_uppercase(),
            purpose,
            steps,
        }
    }

    #[must_use]
    pub fn joined_steps(&self) -> String {
        self.steps.join(" ")
    }
}

/// Diagnostic payload returned when the generator's reply is not valid JSON.
///
/// Carries the raw model output so the caller can inspect what came back;
/// the pipeline continues instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct TestGenDiagnostic {
    pub error: String,
    pub raw: String,
}

impl TestGenDiagnostic {
    #[must_use]
    pub fn new(error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw: raw.into(),
        }
    }
}

/// Outcome of test-case generation: either a usable ordered collection or
/// the degrade-to-diagnostic payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum GeneratedTests {
    Cases(Vec<TestCase>),
    Diagnostic(TestGenDiagnostic),
}

impl GeneratedTests {
    #[must_use]
    pub fn case_count(&self) -> usize {
        match self {
            Self::Cases(cases) => cases.len(),
            Self::Diagnostic(_) => 0,
        }
    }

    #[must_use]
    pub fn as_cases(&self) -> Option<&[TestCase]> {
        match self {
            Self::Cases(cases) => Some(cases),
            Self::Diagnostic(_) => None,
        }
    }
}
