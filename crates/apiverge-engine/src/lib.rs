#![forbid(unsafe_code)]
//! apiverge pipeline engine.
//!
//! The pipeline is a strictly sequential chain of blocking stages:
//! repository sync, contract load, route extraction, divergence analysis,
//! test-case generation, test execution. Effects (git, plain HTTP, the
//! text-generation service) sit behind the traits in [`ports`] so every
//! parsing and orchestration path is testable with fakes.

pub mod adapters;
pub mod analyze;
pub mod artifacts;
pub mod config;
pub mod contract;
pub mod execute;
pub mod extract;
pub mod pipeline;
pub mod ports;
pub mod sync;
pub mod testgen;

pub use adapters::{
    DeniedGenerator, DeniedNetwork, FakeGenerator, FakeNetwork, GenerativeClient, HttpNetwork,
    RealGit,
};
pub use analyze::{analyze_divergence, AnalyzeError};
pub use artifacts::{ArtifactError, ArtifactStore};
pub use config::EngineConfig;
pub use contract::{load_contract, structural_sniff, ContractError};
pub use execute::{execute_tests, execute_tests_from_file, ExecuteError, ExecutionOutcome};
pub use extract::{extract_routes, ExtractError, ModelScanner, PatternScanner, RouteScanner};
pub use pipeline::{CompareOutcome, Pipeline, PipelineError};
pub use ports::{AdapterError, Git, Network, TextGenerator};
pub use sync::{repo_dir_name, sync_repository, SyncError};
pub use testgen::{generate_test_cases, TestGenError};

pub const CRATE_NAME: &str = "apiverge-engine";
