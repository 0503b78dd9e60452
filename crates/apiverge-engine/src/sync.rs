// SPDX-License-Identifier: Apache-2.0

use crate::ports::{AdapterError, Git};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Git {
        detail: String,
    },
    /// Destination exists but is not a git work tree.
    NotAWorkTree {
        path: PathBuf,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git { detail } => write!(f, "sync error: {detail}"),
            Self::NotAWorkTree { path } => {
                write!(f, "sync error: {} is not a git work tree", path.display())
            }
            Self::Io { op, path, detail } => {
                write!(f, "sync io error: {op} {} ({detail})", path.display())
            }
        }
    }
}

impl std::error::Error for SyncError {}

impl From<AdapterError> for SyncError {
    fn from(err: AdapterError) -> Self {
        Self::Git {
            detail: err.to_string(),
        }
    }
}

/// Local checkout directory name for a remote URL: the last path segment
/// with a trailing `.git` stripped.
#[must_use]
pub fn repo_dir_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Ensures `workdir/<repo-name>` holds an up-to-date checkout of `url`.
///
/// Absent destination: full clone. Existing work tree: fast-forward update.
/// Existing directory that is not a work tree: error, never overwritten
/// unless `purge` is set. Returns the resolved checkout path; calling twice
/// yields the same path, with the second call updating in place.
pub fn sync_repository(
    git: &dyn Git,
    workdir: &Path,
    url: &str,
    purge: bool,
) -> Result<PathBuf, SyncError> {
    let dest = workdir.join(repo_dir_name(url));

    if purge && dest.exists() {
        tracing::info!(dest = %dest.display(), "purging checkout before sync");
        std::fs::remove_dir_all(&dest).map_err(|err| SyncError::Io {
            op: "remove_dir_all",
            path: dest.clone(),
            detail: err.to_string(),
        })?;
    }

    if dest.exists() {
        if !git.is_work_tree(&dest) {
            return Err(SyncError::NotAWorkTree { path: dest });
        }
        tracing::info!(dest = %dest.display(), "updating existing checkout");
        git.update(&dest)?;
    } else {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|err| SyncError::Io {
                op: "create_dir_all",
                path: parent.to_path_buf(),
                detail: err.to_string(),
            })?;
        }
        tracing::info!(url, dest = %dest.display(), "cloning repository");
        git.clone_repo(url, &dest)?;
    }

    Ok(dest)
}
