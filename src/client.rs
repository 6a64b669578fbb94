//! HTTP client for the remote analysis service.
//!
//! Two endpoints: `/analyze` returns the vulnerability list for one
//! document, `/fix` returns replacement source text for one finding. Fix
//! generation is expected to be slower than analysis, so it gets the longer
//! deadline.

use crate::language::Language;
use crate::vulnerability::Vulnerability;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANALYZE_TIMEOUT: Duration = Duration::from_secs(30);
const FIX_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure classes callers branch on. Only `ConnectionRefused` gets special
/// treatment upstream (a user-visible notice naming the endpoint); the rest
/// are logged or surfaced as-is.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot connect to the analysis service at {url}")]
    ConnectionRefused { url: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("analysis service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
}

fn classify(url: &str, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        ClientError::ConnectionRefused {
            url: url.to_string(),
        }
    } else {
        ClientError::Transport(err)
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    code: &'a str,
    language: &'a str,
    privacy_first_mode: bool,
}

#[derive(Deserialize, Default)]
struct AnalyzeResponse {
    #[serde(default)]
    vulnerabilities: Vec<Vulnerability>,
}

#[derive(Serialize)]
struct FixRequest<'a> {
    code: &'a str,
    vulnerability: &'a Vulnerability,
    language: &'a str,
}

#[derive(Deserialize, Default)]
struct FixResponse {
    #[serde(default)]
    fixed_code: String,
}

#[derive(Clone)]
pub struct FrameworkClient {
    http: reqwest::Client,
    base_url: String,
}

impl FrameworkClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the service for the vulnerabilities in `code`.
    ///
    /// A 2xx body that is missing the list, or that does not parse at all,
    /// reads as "no findings"; only transport problems and non-2xx statuses
    /// are errors.
    pub async fn analyze(
        &self,
        code: &str,
        language: Language,
        privacy_first_mode: bool,
    ) -> Result<Vec<Vulnerability>, ClientError> {
        let url = format!("{}/analyze", self.base_url);
        let request = AnalyzeRequest {
            code,
            language: language.id(),
            privacy_first_mode,
        };

        let response = self
            .http
            .post(&url)
            .timeout(ANALYZE_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|err| classify(&self.base_url, err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify(&self.base_url, err))?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: snippet(&body),
            });
        }

        let parsed: AnalyzeResponse = serde_json::from_str(&body).unwrap_or_else(|err| {
            tracing::warn!("unparseable analyze response ({err}); treating as no findings");
            AnalyzeResponse::default()
        });
        Ok(parsed.vulnerabilities)
    }

    /// Ask the service to rewrite `code` so that `vulnerability` is fixed.
    ///
    /// Returns the replacement text verbatim; an empty string means the
    /// service produced nothing and the caller must not edit anything.
    pub async fn fix(
        &self,
        code: &str,
        vulnerability: &Vulnerability,
        language: Language,
    ) -> Result<String, ClientError> {
        let url = format!("{}/fix", self.base_url);
        let request = FixRequest {
            code,
            vulnerability,
            language: language.id(),
        };

        let response = self
            .http
            .post(&url)
            .timeout(FIX_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|err| classify(&self.base_url, err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify(&self.base_url, err))?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: snippet(&body),
            });
        }

        let parsed: FixResponse = serde_json::from_str(&body).unwrap_or_else(|err| {
            tracing::warn!("unparseable fix response ({err}); treating as no fix");
            FixResponse::default()
        });
        Ok(parsed.fixed_code)
    }
}

/// Truncate a response body for error display (Unicode-safe).
fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{cut}…")
    }
}
