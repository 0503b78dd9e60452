// SPDX-License-Identifier: Apache-2.0

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::config::EngineConfig;
use apiverge_model::{ExecutionResult, GeneratedTests, TestCase, Verdict};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
    Parse {
        detail: String,
    },
    /// The persisted collection is a generation diagnostic, not test cases.
    Diagnostic {
        error: String,
    },
    Client {
        detail: String,
    },
    Artifact(ArtifactError),
}

impl std::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { op, path, detail } => {
                write!(f, "execute io error: {op} {} ({detail})", path.display())
            }
            Self::Parse { detail } => write!(f, "execute parse error: {detail}"),
            Self::Diagnostic { error } => {
                write!(f, "test collection is a generation diagnostic: {error}")
            }
            Self::Client { detail } => write!(f, "execute client error: {detail}"),
            Self::Artifact(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ExecuteError {}

impl From<ArtifactError> for ExecuteError {
    fn from(err: ArtifactError) -> Self {
        Self::Artifact(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ExecutionOutcome {
    pub results: Vec<ExecutionResult>,
    pub report_path: PathBuf,
}

fn target_url(base_url: &str, endpoint: &str) -> String {
    format!("{}{endpoint}", base_url.trim_end_matches('/'))
}

fn run_case(
    client: &reqwest::blocking::Client,
    base_url: &str,
    case: &TestCase,
    config: &EngineConfig,
) -> ExecutionResult {
    let url = target_url(base_url, &case.endpoint);
    let method_name = case.method.to_ascii_uppercase();
    let method = match reqwest::Method::from_bytes(method_name.as_bytes()) {
        Ok(method) => method,
        Err(err) => {
            return ExecutionResult::new(
                case.endpoint.clone(),
                method_name,
                None,
                Verdict::Error,
                format!("unsupported method: {err}"),
            )
        }
    };

    let mut request = client.request(method, &url);
    if matches!(method_name.as_str(), "POST" | "PUT" | "PATCH") {
        request = request.json(&serde_json::json!({}));
    }

    match request.send() {
        Ok(response) => {
            let observed = response.status().as_u16();
            let (passed, expected) = config
                .expected_status
                .evaluate(&case.joined_steps(), observed);
            if passed {
                ExecutionResult::new(
                    case.endpoint.clone(),
                    method_name.clone(),
                    Some(observed),
                    Verdict::Pass,
                    String::new(),
                )
            } else {
                ExecutionResult::new(
                    case.endpoint.clone(),
                    method_name.clone(),
                    Some(observed),
                    Verdict::Fail,
                    format!("Expected {expected}, got {observed}"),
                )
            }
        }
        Err(err) => ExecutionResult::new(
            case.endpoint.clone(),
            method_name,
            None,
            Verdict::Error,
            err.to_string(),
        ),
    }
}

/// Replays each test case as one live request, in input order, one at a
/// time. A failing request records an ERROR verdict for that case only;
/// later cases still run. No retries.
pub fn execute_tests(
    cases: &[TestCase],
    base_url: &str,
    config: &EngineConfig,
) -> Result<Vec<ExecutionResult>, ExecuteError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.execution_timeout)
        .build()
        .map_err(|err| ExecuteError::Client {
            detail: err.to_string(),
        })?;

    let mut results = Vec::with_capacity(cases.len());
    for case in cases {
        let result = run_case(&client, base_url, case, config);
        tracing::info!(
            endpoint = %result.endpoint,
            method = %result.method,
            verdict = result.verdict.as_str(),
            "test case executed"
        );
        results.push(result);
    }
    Ok(results)
}

/// Loads a persisted test-case collection, replays it against `base_url`,
/// and writes the execution report artifact.
pub fn execute_tests_from_file(
    cases_path: &Path,
    base_url: &str,
    config: &EngineConfig,
    store: &ArtifactStore,
) -> Result<ExecutionOutcome, ExecuteError> {
    let text = std::fs::read_to_string(cases_path).map_err(|err| ExecuteError::Io {
        op: "read_to_string",
        path: cases_path.to_path_buf(),
        detail: err.to_string(),
    })?;
    let collection: GeneratedTests =
        serde_json::from_str(&text).map_err(|err| ExecuteError::Parse {
            detail: format!("{}: {err}", cases_path.display()),
        })?;
    let cases = match collection {
        GeneratedTests::Cases(cases) => cases,
        GeneratedTests::Diagnostic(diag) => {
            return Err(ExecuteError::Diagnostic { error: diag.error })
        }
        _ => unreachable!("GeneratedTests is non_exhaustive but has no other variants"),
    };

    let results = execute_tests(&cases, base_url, config)?;
    let report_path = store.write_execution(&results)?;
    Ok(ExecutionOutcome {
        results,
        report_path,
    })
}
