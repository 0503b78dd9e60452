// SPDX-License-Identifier: Apache-2.0

use crate::analyze::{analyze_divergence, AnalyzeError};
use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::config::EngineConfig;
use crate::contract::{load_contract, ContractError};
use crate::execute::{execute_tests, ExecuteError};
use crate::extract::{extract_routes, ExtractError};
use crate::ports::{Git, Network, TextGenerator};
use crate::sync::{sync_repository, SyncError};
use crate::testgen::{generate_test_cases, TestGenError};
use apiverge_core::ExitCode;
use apiverge_model::{ContractSource, DivergenceReport, GeneratedTests, RunSummary};
use std::path::PathBuf;

#[derive(Debug)]
pub enum PipelineError {
    Sync(SyncError),
    Contract(ContractError),
    Extract(ExtractError),
    Analyze(AnalyzeError),
    TestGen(TestGenError),
    Execute(ExecuteError),
    Artifact(ArtifactError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(err) => write!(f, "{err}"),
            Self::Contract(err) => write!(f, "{err}"),
            Self::Extract(err) => write!(f, "{err}"),
            Self::Analyze(err) => write!(f, "{err}"),
            Self::TestGen(err) => write!(f, "{err}"),
            Self::Execute(err) => write!(f, "{err}"),
            Self::Artifact(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SyncError> for PipelineError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

impl From<ContractError> for PipelineError {
    fn from(err: ContractError) -> Self {
        Self::Contract(err)
    }
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> Self {
        Self::Extract(err)
    }
}

impl From<AnalyzeError> for PipelineError {
    fn from(err: AnalyzeError) -> Self {
        Self::Analyze(err)
    }
}

impl From<TestGenError> for PipelineError {
    fn from(err: TestGenError) -> Self {
        Self::TestGen(err)
    }
}

impl From<ExecuteError> for PipelineError {
    fn from(err: ExecuteError) -> Self {
        Self::Execute(err)
    }
}

impl From<ArtifactError> for PipelineError {
    fn from(err: ArtifactError) -> Self {
        Self::Artifact(err)
    }
}

impl PipelineError {
    /// Machine-error code for the `--json` CLI envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sync(_) => "sync_error",
            Self::Contract(ContractError::NotFound { .. }) => "not_found",
            Self::Contract(ContractError::Format { .. }) => "format_error",
            Self::Contract(ContractError::Validation { .. }) => "validation_error",
            Self::Contract(ContractError::Parse { .. }) => "parse_error",
            Self::Contract(ContractError::Network { .. }) => "network_error",
            Self::Extract(ExtractError::Parse { .. }) => "parse_error",
            Self::Extract(ExtractError::Service { .. }) => "service_error",
            Self::Extract(_) => "extract_error",
            Self::Analyze(AnalyzeError::Parse { .. }) => "parse_error",
            Self::Analyze(_) => "service_error",
            Self::TestGen(_) => "service_error",
            Self::Execute(_) => "execution_error",
            Self::Artifact(_) => "artifact_error",
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Contract(ContractError::Format { .. })
            | Self::Contract(ContractError::Validation { .. })
            | Self::Contract(ContractError::Parse { .. })
            | Self::Contract(ContractError::NotFound { .. })
            | Self::Extract(ExtractError::Parse { .. })
            | Self::Analyze(AnalyzeError::Parse { .. }) => ExitCode::Validation,
            Self::Sync(_)
            | Self::Contract(ContractError::Network { .. })
            | Self::Extract(ExtractError::Service { .. })
            | Self::Analyze(_)
            | Self::TestGen(_) => ExitCode::DependencyFailure,
            Self::Extract(_) | Self::Execute(_) | Self::Artifact(_) => ExitCode::Internal,
        }
    }
}

/// Outcome of the compare stage: the report plus its persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CompareOutcome {
    pub report: DivergenceReport,
    pub report_path: PathBuf,
}

/// Sequences the pipeline stages in strict order over injected effects.
///
/// One run is one linear chain of blocking calls; nothing is parallelized
/// and nothing is retried. Artifacts written before a failing stage stay
/// on disk.
pub struct Pipeline<'a> {
    git: &'a dyn Git,
    network: &'a dyn Network,
    generator: &'a dyn TextGenerator,
    config: EngineConfig,
    store: ArtifactStore,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(
        git: &'a dyn Git,
        network: &'a dyn Network,
        generator: &'a dyn TextGenerator,
        config: EngineConfig,
    ) -> Self {
        let store = ArtifactStore::new(config.reports_root.clone());
        Self {
            git,
            network,
            generator,
            config,
            store,
        }
    }

    /// Sync → load → extract → analyze → persist the divergence report.
    pub fn compare(
        &self,
        repo_url: &str,
        contract_source: &ContractSource,
    ) -> Result<CompareOutcome, PipelineError> {
        let checkout = sync_repository(
            self.git,
            &self.config.workdir,
            repo_url,
            self.config.purge_before_sync,
        )?;
        let contract = load_contract(contract_source, self.network)?;
        tracing::info!(
            source = %contract.source,
            paths = contract.path_count(),
            "contract loaded"
        );
        let routes = extract_routes(&checkout, self.generator)?;
        let report = analyze_divergence(&contract, &routes, self.generator)?;
        let report_path = self.store.write_divergence(&report)?;
        Ok(CompareOutcome {
            report,
            report_path,
        })
    }

    /// The full pipeline through test execution, returning the run summary.
    ///
    /// A test-generation parse degradation does not abort: the diagnostic
    /// is persisted, execution is skipped, and the summary reports zero
    /// test cases.
    pub fn run(
        &self,
        repo_url: &str,
        contract_source: &ContractSource,
        base_url: &str,
    ) -> Result<RunSummary, PipelineError> {
        let compared = self.compare(repo_url, contract_source)?;
        let mut summary = RunSummary::new(
            repo_url.to_string(),
            contract_source.describe(),
            compared.report_path.clone(),
            compared.report.total(),
        );

        let tests = generate_test_cases(&compared.report, self.generator)?;
        let testcases_path = self.store.write_testcases(&tests)?;
        summary.testcases_path = Some(testcases_path);
        summary.test_case_count = tests.case_count();

        match tests {
            GeneratedTests::Cases(cases) => {
                let results = execute_tests(&cases, base_url, &self.config)?;
                let report_path = self.store.write_execution(&results)?;
                summary.execution_report_path = Some(report_path);
            }
            GeneratedTests::Diagnostic(diag) => {
                tracing::warn!(
                    error = %diag.error,
                    "test generation degraded to diagnostic; skipping execution"
                );
            }
            _ => unreachable!("GeneratedTests is non_exhaustive but has no other variants"),
        }

        Ok(summary)
    }
}
