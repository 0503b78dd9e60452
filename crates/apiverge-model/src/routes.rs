// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One route believed to be implemented by the backend.
///
/// `method` is absent for pattern-strategy hits, which match path literals
/// without distinguishing the verb. No uniqueness is enforced across
/// extraction strategies; reconciling duplicates is the analyzer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RouteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(method: Option<String>, path: String) -> Self {
        Self {
            method: method.map(|m| m.to_ascii_uppercase()),
            path,
            origin: None,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Combined output of both extraction strategies.
///
/// Both result sets travel to the analyzer side by side; neither is merged
/// into the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct ExtractedRoutes {
    pub pattern_routes: Vec<String>,
    pub model_routes: Vec<RouteRecord>,
}

impl ExtractedRoutes {
    #[must_use]
    pub fn new(pattern_routes: Vec<String>, model_routes: Vec<RouteRecord>) -> Self {
        Self {
            pattern_routes,
            model_routes,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pattern_routes.is_empty() && self.model_routes.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.pattern_routes.len() + self.model_routes.len()
    }
}
