// SPDX-License-Identifier: Apache-2.0

use crate::ports::{AdapterError, TextGenerator};
use apiverge_model::{ContractDocument, DivergenceReport, ExtractedRoutes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    Service { detail: String },
    Parse { detail: String },
    Serialize { detail: String },
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service { detail } => write!(f, "analyze service error: {detail}"),
            Self::Parse { detail } => write!(f, "analyze parse error: {detail}"),
            Self::Serialize { detail } => write!(f, "analyze serialize error: {detail}"),
        }
    }
}

impl std::error::Error for AnalyzeError {}

impl From<AdapterError> for AnalyzeError {
    fn from(err: AdapterError) -> Self {
        Self::Service {
            detail: err.to_string(),
        }
    }
}

fn build_analysis_prompt(
    contract: &ContractDocument,
    routes: &ExtractedRoutes,
) -> Result<String, AnalyzeError> {
    let contract_json =
        serde_json::to_string_pretty(&contract.raw).map_err(|err| AnalyzeError::Serialize {
            detail: err.to_string(),
        })?;
    let routes_json =
        serde_json::to_string_pretty(routes).map_err(|err| AnalyzeError::Serialize {
            detail: err.to_string(),
        })?;
    Ok(format!(
        "You are an API contract validation expert.\n\n\
         Compare the following:\n\
         - Swagger/OpenAPI spec (FULL JSON below)\n\
         - Backend implemented routes (JSON below; `pattern_routes` are path \
         literals from static scanning, `model_routes` carry methods)\n\n\
         Identify:\n\
         1. Missing endpoints (present in the spec but not in the backend)\n\
         2. Extra endpoints (present in the backend but not in the spec)\n\
         3. Method mismatches\n\
         4. Parameter mismatches\n\
         5. Request body mismatches\n\
         6. Response schema mismatches\n\
         7. Status code mismatches\n\n\
         Provide the output in STRICT JSON with keys:\n\
         {{\n\
             \"missing_endpoints\": [],\n\
             \"extra_endpoints\": [],\n\
             \"method_mismatches\": [],\n\
             \"parameter_mismatches\": [],\n\
             \"request_body_mismatches\": [],\n\
             \"response_mismatches\": [],\n\
             \"status_code_mismatches\": []\n\
         }}\n\n\
         Swagger Spec:\n{contract_json}\n\n\
         Backend Routes:\n{routes_json}\n"
    ))
}

/// Parses a divergence reply: direct JSON first, then the substring between
/// the first opening brace and the last closing brace.
pub(crate) fn parse_report_reply(reply: &str) -> Result<DivergenceReport, AnalyzeError> {
    if let Ok(report) = serde_json::from_str::<DivergenceReport>(reply) {
        return Ok(report);
    }
    let fallback = reply
        .find('{')
        .and_then(|start| reply.rfind('}').map(|end| (start, end)))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &reply[start..=end]);
    match fallback {
        Some(slice) => {
            serde_json::from_str::<DivergenceReport>(slice).map_err(|err| AnalyzeError::Parse {
                detail: format!("divergence reply unreadable: {err}"),
            })
        }
        None => Err(AnalyzeError::Parse {
            detail: "divergence reply carries no JSON object".to_string(),
        }),
    }
}

/// One generation call comparing the contract against the extracted routes.
/// Transport failures surface as `Service` and are not retried.
pub fn analyze_divergence(
    contract: &ContractDocument,
    routes: &ExtractedRoutes,
    generator: &dyn TextGenerator,
) -> Result<DivergenceReport, AnalyzeError> {
    let prompt = build_analysis_prompt(contract, routes)?;
    let reply = generator.generate(&prompt)?;
    let report = parse_report_reply(&reply)?;
    tracing::info!(total = report.total(), "divergence analysis complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeGenerator;
    use serde_json::json;

    fn contract() -> ContractDocument {
        ContractDocument::from_raw(
            "test".to_string(),
            json!({"openapi": "3.0.0", "paths": {"/users": {"get": {}}}}),
        )
    }

    fn routes() -> ExtractedRoutes {
        ExtractedRoutes::new(vec!["/users".to_string()], Vec::new())
    }

    #[test]
    fn direct_json_reply_parses() {
        let generator = FakeGenerator::default().with_reply(
            r#"{"missing_endpoints":["GET /orders"],"extra_endpoints":[],"method_mismatches":[],
                "parameter_mismatches":[],"request_body_mismatches":[],"response_mismatches":[],
                "status_code_mismatches":[]}"#,
        );
        let report = analyze_divergence(&contract(), &routes(), &generator).expect("analyze");
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn fenced_reply_parses_via_brace_fallback() {
        let generator = FakeGenerator::default().with_reply(
            "```json\n{\"missing_endpoints\": [\"GET /orders\"], \"extra_endpoints\": []}\n```",
        );
        let report = analyze_divergence(&contract(), &routes(), &generator).expect("analyze");
        assert_eq!(report.missing_endpoints.len(), 1);
        let value = serde_json::to_value(&report).expect("serialize");
        for key in DivergenceReport::CATEGORY_KEYS {
            assert!(value.get(key).is_some(), "category {key} missing");
        }
    }

    #[test]
    fn reply_without_object_is_parse_error() {
        let generator = FakeGenerator::default().with_reply("no divergences to speak of");
        let err = analyze_divergence(&contract(), &routes(), &generator).expect_err("parse");
        assert!(matches!(err, AnalyzeError::Parse { .. }));
    }

    #[test]
    fn transport_failure_is_service_error() {
        let generator = FakeGenerator::default();
        let err = analyze_divergence(&contract(), &routes(), &generator).expect_err("service");
        assert!(matches!(err, AnalyzeError::Service { .. }));
    }

    #[test]
    fn prompt_embeds_contract_and_routes() {
        let prompt = build_analysis_prompt(&contract(), &routes()).expect("prompt");
        assert!(prompt.contains("/users"));
        assert!(prompt.contains("pattern_routes"));
        assert!(prompt.contains("status_code_mismatches"));
    }
}
