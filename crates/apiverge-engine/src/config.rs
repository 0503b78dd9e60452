// SPDX-License-Identifier: Apache-2.0

use apiverge_core::{
    resolve_workdir, ENV_APIVERGE_API_KEY, ENV_APIVERGE_ENDPOINT, ENV_APIVERGE_MODEL,
    ENV_GEMINI_API_KEY,
};
use apiverge_model::ExpectedStatus;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-run engine configuration, passed into component constructors.
///
/// No component reads credentials from the process environment on its own;
/// `from_env` is the single place env vars are consulted, and every field
/// can be overridden per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// API credential for the text-generation service.
    pub credential: Option<String>,
    /// Model identifier sent to the text-generation service.
    pub model: String,
    /// Base endpoint of the text-generation service.
    pub endpoint: String,
    /// Timeout applied to each test-execution HTTP request.
    pub execution_timeout: Duration,
    /// Timeout for contract fetches and tree listings.
    pub fetch_timeout: Duration,
    /// Expected-status heuristic used by the executor.
    pub expected_status: ExpectedStatus,
    /// Delete the checkout before syncing instead of fast-forwarding it.
    pub purge_before_sync: bool,
    /// Parent directory for repository checkouts.
    pub workdir: PathBuf,
    /// Root of the persisted `reports/` tree.
    pub reports_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credential: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            execution_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(30),
            expected_status: ExpectedStatus::default(),
            purge_before_sync: false,
            workdir: PathBuf::from("."),
            reports_root: PathBuf::from("reports"),
        }
    }
}

impl EngineConfig {
    /// Builds a config from the process environment. `APIVERGE_API_KEY`
    /// wins over the legacy `GEMINI_API_KEY` name.
    #[must_use]
    pub fn from_env() -> Self {
        let credential = std::env::var(ENV_APIVERGE_API_KEY)
            .ok()
            .or_else(|| std::env::var(ENV_GEMINI_API_KEY).ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let model = std::env::var(ENV_APIVERGE_MODEL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = std::env::var(ENV_APIVERGE_ENDPOINT)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let workdir = resolve_workdir();
        let reports_root = workdir.join("reports");
        Self {
            credential,
            model,
            endpoint,
            workdir,
            reports_root,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|v| !v.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.reports_root = workdir.join("reports");
        self.workdir = workdir;
        self
    }

    #[must_use]
    pub fn with_expected_status(mut self, policy: ExpectedStatus) -> Self {
        self.expected_status = policy;
        self
    }

    #[must_use]
    pub fn with_purge_before_sync(mut self, purge: bool) -> Self {
        self.purge_before_sync = purge;
        self
    }

    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }
}
