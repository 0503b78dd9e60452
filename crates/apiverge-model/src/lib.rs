#![forbid(unsafe_code)]
//! apiverge model SSOT.
//!
//! Every artifact the pipeline produces or consumes is defined here, once.
//! Components exchange these types only; serialization is the wire contract
//! between pipeline stages and the `reports/` tree.

mod contract;
mod divergence;
mod execution;
mod routes;
mod summary;
mod testcase;

pub use contract::{ContractDocument, ContractSource};
pub use divergence::DivergenceReport;
pub use execution::{ExecutionResult, ExpectedStatus, Verdict};
pub use routes::{ExtractedRoutes, RouteRecord};
pub use summary::RunSummary;
pub use testcase::{GeneratedTests, TestCase, TestGenDiagnostic};

pub const CRATE_NAME: &str = "apiverge-model";
