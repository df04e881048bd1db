/**
 * Moderation Client
 *
 * HTTP client for an external profanity classifier. The service receives
 *
 * ```json
 * { "message": "text to classify" }
 * ```
 *
 * and its JSON answer is normalised by `moderation::verdict`.
 */

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backend::moderation::verdict;

/// Default classifier endpoint
pub const DEFAULT_MODERATION_URL: &str = "https://vector.profanity.dev";

/// Default bound for one classification request
pub const DEFAULT_MODERATION_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Moderation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Moderation service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Moderation response is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Moderation request timed out")]
    Timeout,
}

/// Something that can classify text as profane or clean
#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// `Ok(true)` if the text should be reverted
    async fn check(&self, text: &str) -> Result<bool, ModerationError>;
}

pub type SharedModerator = Arc<dyn ContentModerator>;

#[derive(Serialize)]
struct ModerationRequest<'a> {
    message: &'a str,
}

/// `ContentModerator` backed by a remote HTTP service
#[derive(Debug, Clone)]
pub struct ModerationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ModerationClient {
    /// Create a client for `endpoint`
    ///
    /// # Arguments
    ///
    /// * `endpoint` - URL the request is POSTed to
    /// * `timeout` - Bound for the whole request, body included
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ModerationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContentModerator for ModerationClient {
    async fn check(&self, text: &str) -> Result<bool, ModerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ModerationRequest { message: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModerationError::Status(status));
        }

        let body = response.bytes().await?;
        let decoded: serde_json::Value = serde_json::from_slice(&body)?;
        let verdict = verdict::evaluate(&decoded);

        tracing::debug!(
            "[Moderation] Verdict flagged={} (rule {:?})",
            verdict.flagged,
            verdict.rule
        );
        Ok(verdict.flagged)
    }
}
