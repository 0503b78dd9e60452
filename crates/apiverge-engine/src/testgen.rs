// SPDX-License-Identifier: Apache-2.0

use crate::ports::{AdapterError, TextGenerator};
use apiverge_model::{DivergenceReport, GeneratedTests, TestCase, TestGenDiagnostic};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestGenError {
    Service { detail: String },
    Serialize { detail: String },
}

impl std::fmt::Display for TestGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service { detail } => write!(f, "test generation service error: {detail}"),
            Self::Serialize { detail } => write!(f, "test generation serialize error: {detail}"),
        }
    }
}

impl std::error::Error for TestGenError {}

impl From<AdapterError> for TestGenError {
    fn from(err: AdapterError) -> Self {
        Self::Service {
            detail: err.to_string(),
        }
    }
}

fn build_testgen_prompt(report: &DivergenceReport) -> Result<String, TestGenError> {
    let report_json =
        serde_json::to_string_pretty(report).map_err(|err| TestGenError::Serialize {
            detail: err.to_string(),
        })?;
    Ok(format!(
        "You are an expert QA automation engineer. Given the following API \
         divergence report, generate a set of test cases in pure JSON format \
         (no markdown, no text).\n\
         Each test case should include:\n\
         - endpoint\n\
         - method\n\
         - purpose\n\
         - steps (array of strings describing what to do)\n\n\
         Example output:\n\
         [\n\
           {{\n\
             \"endpoint\": \"/hello\",\n\
             \"method\": \"GET\",\n\
             \"purpose\": \"Verify 404 for missing endpoint\",\n\
             \"steps\": [\n\
               \"Send GET request to /hello\",\n\
               \"Expect status 404 Not Found\"\n\
             ]\n\
           }}\n\
         ]\n\n\
         Here is the divergence report:\n{report_json}\n"
    ))
}

/// Pulls the JSON payload out of a model reply: a fenced ```json block if
/// present, else the first bracket- or brace-delimited substring, else the
/// raw text as-is.
#[must_use]
pub fn extract_json_payload(raw: &str) -> String {
    if let Ok(fence) = Regex::new(r"(?s)```json(.*?)```") {
        if let Some(captures) = fence.captures(raw) {
            if let Some(inner) = captures.get(1) {
                return inner.as_str().trim().to_string();
            }
        }
    }
    if let Ok(any_json) = Regex::new(r"(?s)(\[.*\]|\{.*\})") {
        if let Some(captures) = any_json.captures(raw) {
            if let Some(m) = captures.get(1) {
                return m.as_str().trim().to_string();
            }
        }
    }
    raw.trim().to_string()
}

/// Asks the generation service for test cases covering the divergence
/// report. An unreadable reply degrades to a diagnostic payload carrying
/// the raw text so the pipeline can continue and surface it to the caller;
/// only transport failures are errors.
pub fn generate_test_cases(
    report: &DivergenceReport,
    generator: &dyn TextGenerator,
) -> Result<GeneratedTests, TestGenError> {
    let prompt = build_testgen_prompt(report)?;
    let raw = generator.generate(&prompt)?;
    if raw.trim().is_empty() {
        return Ok(GeneratedTests::Diagnostic(TestGenDiagnostic::new(
            "Empty response from model",
            raw,
        )));
    }
    let payload = extract_json_payload(&raw);
    match serde_json::from_str::<Vec<TestCase>>(&payload) {
        Ok(cases) => {
            tracing::info!(count = cases.len(), "test cases generated");
            Ok(GeneratedTests::Cases(cases))
        }
        Err(_) => {
            tracing::warn!("test-generation reply was not valid JSON; degrading to diagnostic");
            Ok(GeneratedTests::Diagnostic(TestGenDiagnostic::new(
                "Model output not JSON",
                raw,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeGenerator;

    const CASES_JSON: &str = r#"[
        {"endpoint": "/hello", "method": "GET",
         "purpose": "Verify 404 for missing endpoint",
         "steps": ["Send GET request to /hello", "Expect status 404 Not Found"]}
    ]"#;

    #[test]
    fn plain_json_reply_yields_cases() {
        let generator = FakeGenerator::default().with_reply(CASES_JSON);
        let tests =
            generate_test_cases(&DivergenceReport::default(), &generator).expect("generate");
        assert_eq!(tests.case_count(), 1);
    }

    #[test]
    fn fenced_reply_is_stripped() {
        let generator =
            FakeGenerator::default().with_reply(format!("```json\n{CASES_JSON}\n```"));
        let tests =
            generate_test_cases(&DivergenceReport::default(), &generator).expect("generate");
        let cases = tests.as_cases().expect("cases");
        assert_eq!(cases[0].endpoint, "/hello");
    }

    #[test]
    fn chatter_around_the_list_is_tolerated() {
        let generator = FakeGenerator::default()
            .with_reply(format!("Sure! Here you go:\n{CASES_JSON}\nGood luck."));
        let tests =
            generate_test_cases(&DivergenceReport::default(), &generator).expect("generate");
        assert_eq!(tests.case_count(), 1);
    }

    #[test]
    fn malformed_reply_degrades_to_diagnostic_with_raw_text() {
        let raw = "I cannot produce JSON today.";
        let generator = FakeGenerator::default().with_reply(raw);
        let tests =
            generate_test_cases(&DivergenceReport::default(), &generator).expect("generate");
        match tests {
            GeneratedTests::Diagnostic(diag) => {
                assert_eq!(diag.error, "Model output not JSON");
                assert_eq!(diag.raw, raw);
            }
            GeneratedTests::Cases(_) => panic!("expected diagnostic"),
            _ => unreachable!("GeneratedTests is non_exhaustive but has no other variants"),
        }
    }

    #[test]
    fn empty_reply_degrades_to_diagnostic() {
        let generator = FakeGenerator::default().with_reply("   ");
        let tests =
            generate_test_cases(&DivergenceReport::default(), &generator).expect("generate");
        assert!(matches!(tests, GeneratedTests::Diagnostic(_)));
    }

    #[test]
    fn transport_failure_is_an_error_not_a_diagnostic() {
        let generator = FakeGenerator::default();
        let err =
            generate_test_cases(&DivergenceReport::default(), &generator).expect_err("service");
        assert!(matches!(err, TestGenError::Service { .. }));
    }

    #[test]
    fn payload_extraction_prefers_fence_over_bare_brackets() {
        let raw = "noise [1,2] noise\n```json\n[3,4]\n```";
        assert_eq!(extract_json_payload(raw), "[3,4]");
    }
}
