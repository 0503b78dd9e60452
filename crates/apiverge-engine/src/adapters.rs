// SPDX-License-Identifier: Apache-2.0

use crate::config::EngineConfig;
use crate::ports::{AdapterError, Git, Network, TextGenerator};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String, AdapterError> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output().map_err(|err| AdapterError::Git {
        detail: err.to_string(),
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AdapterError::Git {
            detail: format!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or(""),
                output.status,
                stderr.trim()
            ),
        });
    }
    String::from_utf8(output.stdout)
        .map(|text| text.trim().to_string())
        .map_err(|err| AdapterError::Git {
            detail: err.to_string(),
        })
}

#[derive(Debug, Default)]
pub struct RealGit;

impl Git for RealGit {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), AdapterError> {
        run_git(&["clone", url, &dest.display().to_string()], None).map(|_| ())
    }

    fn update(&self, dest: &Path) -> Result<(), AdapterError> {
        run_git(&["pull", "--ff-only"], Some(dest)).map(|_| ())
    }

    fn is_work_tree(&self, dest: &Path) -> bool {
        run_git(&["rev-parse", "--is-inside-work-tree"], Some(dest))
            .map(|out| out == "true")
            .unwrap_or(false)
    }
}

/// Blocking HTTP GET with a per-client timeout.
#[derive(Debug)]
pub struct HttpNetwork {
    timeout: Duration,
}

impl HttpNetwork {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Network for HttpNetwork {
    fn get_text(&self, url: &str) -> Result<String, AdapterError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| AdapterError::Network {
                detail: format!("client build failed: {err}"),
            })?;
        let response = client.get(url).send().map_err(|err| AdapterError::Network {
            detail: err.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(AdapterError::Network {
                detail: format!("GET {url} returned status {}", response.status().as_u16()),
            });
        }
        response.text().map_err(|err| AdapterError::Network {
            detail: err.to_string(),
        })
    }
}

/// Client for a `generateContent`-style text-generation API.
///
/// One POST per call, no retries. No request timeout is applied; generation
/// latency is unbounded and the run blocks on it.
#[derive(Debug)]
pub struct GenerativeClient {
    endpoint: String,
    model: String,
    credential: String,
}

impl GenerativeClient {
    pub fn from_config(config: &EngineConfig) -> Result<Self, AdapterError> {
        let credential = config
            .credential
            .clone()
            .ok_or_else(|| AdapterError::Service {
                detail: "missing API credential (set APIVERGE_API_KEY)".to_string(),
            })?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            credential,
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.credential
        )
    }

    fn extract_reply_text(body: &Value) -> Option<String> {
        let parts = body
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let mut text = String::new();
        for part in parts {
            if let Some(chunk) = part.get("text").and_then(Value::as_str) {
                text.push_str(chunk);
            }
        }
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl TextGenerator for GenerativeClient {
    fn generate(&self, prompt: &str) -> Result<String, AdapterError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| AdapterError::Service {
                detail: format!("client build failed: {err}"),
            })?;
        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });
        let response = client
            .post(self.request_url())
            .json(&payload)
            .send()
            .map_err(|err| AdapterError::Service {
                detail: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Service {
                detail: format!("generation request returned status {}", status.as_u16()),
            });
        }
        let body: Value = response.json().map_err(|err| AdapterError::Service {
            detail: format!("generation response body unreadable: {err}"),
        })?;
        Self::extract_reply_text(&body).ok_or_else(|| AdapterError::Service {
            detail: "generation response carried no candidate text".to_string(),
        })
    }
}

#[derive(Debug, Default)]
pub struct DeniedNetwork;

impl Network for DeniedNetwork {
    fn get_text(&self, url: &str) -> Result<String, AdapterError> {
        Err(AdapterError::EffectDenied {
            effect: "network",
            detail: format!("attempted to fetch `{url}`"),
        })
    }
}

#[derive(Debug, Default)]
pub struct DeniedGenerator;

impl TextGenerator for DeniedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, AdapterError> {
        Err(AdapterError::EffectDenied {
            effect: "text_generation",
            detail: "generation requires an API credential".to_string(),
        })
    }
}

/// Test double returning canned bodies by exact URL.
#[derive(Debug, Default)]
pub struct FakeNetwork {
    bodies: BTreeMap<String, String>,
}

impl FakeNetwork {
    #[must_use]
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }
}

impl Network for FakeNetwork {
    fn get_text(&self, url: &str) -> Result<String, AdapterError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| AdapterError::Network {
                detail: format!("url not stubbed in FakeNetwork: {url}"),
            })
    }
}

/// Test double replaying a fixed sequence of replies.
#[derive(Debug, Default)]
pub struct FakeGenerator {
    replies: std::cell::RefCell<Vec<String>>,
}

impl FakeGenerator {
    #[must_use]
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.borrow_mut().push(reply.into());
        self
    }
}

impl TextGenerator for FakeGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, AdapterError> {
        let mut replies = self.replies.borrow_mut();
        if replies.is_empty() {
            return Err(AdapterError::Service {
                detail: "no reply stubbed in FakeGenerator".to_string(),
            });
        }
        Ok(replies.remove(0))
    }
}
