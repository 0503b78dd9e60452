// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    Git {
        detail: String,
    },
    Network {
        detail: String,
    },
    /// Text-generation service transport or protocol failure.
    Service {
        detail: String,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
    EffectDenied {
        effect: &'static str,
        detail: String,
    },
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git { detail } => write!(f, "git error: {detail}"),
            Self::Network { detail } => write!(f, "network error: {detail}"),
            Self::Service { detail } => write!(f, "service error: {detail}"),
            Self::Io { op, path, detail } => {
                write!(f, "io error: {op} {} ({detail})", path.display())
            }
            Self::EffectDenied { effect, detail } => {
                write!(f, "effect denied: {effect} ({detail})")
            }
        }
    }
}

impl std::error::Error for AdapterError {}

/// Version-control effect: clone and fast-forward a remote repository.
pub trait Git {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), AdapterError>;
    fn update(&self, dest: &Path) -> Result<(), AdapterError>;
    fn is_work_tree(&self, dest: &Path) -> bool;
}

/// Plain HTTP GET, used for URL-hosted contracts and repository-tree APIs.
pub trait Network {
    fn get_text(&self, url: &str) -> Result<String, AdapterError>;
}

/// The external text-generation service: prompt in, free text out.
///
/// The reply carries JSON by convention only; callers own the parsing and
/// its fallbacks. Implementations must not retry.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AdapterError>;
}
