// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Policy for deriving the expected status code from a test case's steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExpectedStatus {
    /// Steps mentioning `404` expect exactly 404, everything else expects
    /// exactly 200.
    #[default]
    Exact,
    /// Steps mentioning `404` expect exactly 404, everything else passes on
    /// any status that is not 404.
    Lenient,
}

impl ExpectedStatus {
    /// Evaluates an observed status against the joined step text.
    /// Returns `(passed, expectation_label)`.
    #[must_use]
    pub fn evaluate(self, steps_text: &str, observed: u16) -> (bool, String) {
        let wants_404 = steps_text.to_ascii_lowercase().contains("404");
        match (self, wants_404) {
            (_, true) => (observed == 404, "404".to_string()),
            (Self::Exact, false) => (observed == 200, "200".to_string()),
            (Self::Lenient, false) => (observed != 404, "!=404".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

/// Per-test-case outcome of a live replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct ExecutionResult {
    pub endpoint: String,
    pub method: String,
    pub status: Option<u16>,
    pub verdict: Verdict,
    #[serde(default)]
    pub details: String,
}

impl ExecutionResult {
    #[must_use]
    pub fn new(
        endpoint: String,
        method: String,
        status: Option<u16>,
        verdict: Verdict,
        details: String,
    ) -> Self {
        Self {
            endpoint,
            method,
            status,
            verdict,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_policy_expects_200_without_404_marker() {
        let (passed, expected) = ExpectedStatus::Exact.evaluate("Send GET request", 200);
        assert!(passed);
        assert_eq!(expected, "200");
        let (passed, _) = ExpectedStatus::Exact.evaluate("Send GET request", 204);
        assert!(!passed);
    }

    #[test]
    fn both_policies_expect_404_when_steps_mention_it() {
        for policy in [ExpectedStatus::Exact, ExpectedStatus::Lenient] {
            let (passed, expected) = policy.evaluate("Expect status 404 Not Found", 404);
            assert!(passed, "{policy:?} should pass on 404");
            assert_eq!(expected, "404");
            let (passed, _) = policy.evaluate("Expect status 404 Not Found", 200);
            assert!(!passed, "{policy:?} should fail on 200");
        }
    }

    #[test]
    fn lenient_policy_accepts_anything_but_404() {
        let (passed, expected) = ExpectedStatus::Lenient.evaluate("Send DELETE request", 500);
        assert!(passed);
        assert_eq!(expected, "!=404");
        let (passed, _) = ExpectedStatus::Lenient.evaluate("Send DELETE request", 404);
        assert!(!passed);
    }

    #[test]
    fn verdict_wire_form_is_uppercase() {
        assert_eq!(
            serde_json::to_string(&Verdict::Pass).expect("serialize"),
            r#""PASS""#
        );
        let back: Verdict = serde_json::from_str(r#""ERROR""#).expect("deserialize");
        assert_eq!(back, Verdict::Error);
    }

    #[test]
    fn execution_result_round_trips() {
        let result = ExecutionResult::new(
            "/users".to_string(),
            "GET".to_string(),
            Some(404),
            Verdict::Fail,
            "Expected 200, got 404".to_string(),
        );
        let text = serde_json::to_string(&result).expect("serialize");
        let back: ExecutionResult = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(result, back);
    }
}
