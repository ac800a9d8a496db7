//! Generation client: the credential × model fallback sweep.
//!
//! This module drives the Generative Language API and is intentionally
//! split in two — a [`TextGenerator`] transport trait with a production
//! [`GeminiClient`], and the [`generate_with_fallback`] sweep that walks
//! (credential, model) combinations until one succeeds.
//!
//! ## Sweep Strategy
//!
//! Credentials are shuffled per call so load spreads across keys instead of
//! always burning the first one's quota; models keep their fixed
//! highest-capability-first order within each credential. The first success
//! returns immediately. A failed attempt waits a fixed short delay — the
//! next attempt targets a different key or model, so exponential backoff
//! would only slow the sweep down without protecting anything.
//!
//! Nothing is remembered between sweeps: a key that failed once is eligible
//! again on the next call, and each call reshuffles independently.

use crate::config::AssessmentConfig;
use crate::error::{AttemptError, LessonLensError};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One successful generation: the text plus which combination produced it.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The generated response body.
    pub text: String,
    /// The credential that succeeded. Treat as a secret; log only the hint.
    pub credential: String,
    /// The model identifier that succeeded.
    pub model: String,
    /// Total attempts made, including the successful one.
    pub attempts: usize,
}

impl Generation {
    /// Last few characters of the winning credential, safe to show a user.
    pub fn credential_hint(&self) -> String {
        key_hint(&self.credential)
    }
}

/// Shorten a credential to a displayable tail.
fn key_hint(key: &str) -> String {
    let n = key.chars().count();
    let tail: String = key.chars().skip(n.saturating_sub(5)).collect();
    format!("…{tail}")
}

/// Transport seam for one generation attempt.
///
/// The sweep only ever sees this trait, so tests inject deterministic
/// generators and count calls without any network.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Attempt a single generation call with one credential and one model.
    async fn generate(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, AttemptError>;
}

// ── Production transport ─────────────────────────────────────────────────

/// Sampling parameters as the API expects them on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl GenerationOptions {
    fn from_config(config: &AssessmentConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<ResponseCandidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

/// Generative Language API client over plain REST.
///
/// The key travels as a query parameter per attempt, which is what lets the
/// sweep rotate credentials without rebuilding any client state.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    options: GenerationOptions,
}

impl GeminiClient {
    /// Build a client from the assessment configuration.
    pub fn new(config: &AssessmentConfig) -> Result<Self, LessonLensError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LessonLensError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            options: GenerationOptions::from_config(config),
        })
    }
}

/// Keep API error text short enough for a log line.
fn truncate_message(msg: &str) -> String {
    const MAX: usize = 200;
    if msg.chars().count() <= MAX {
        msg.to_string()
    } else {
        let head: String = msg.chars().take(MAX).collect();
        format!("{head}…")
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, AttemptError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, credential
        );

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.options.clone(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Error bodies are usually {"error":{"message":...}}; fall back
            // to the raw body when they are not.
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AttemptError::Api {
                message: format!("HTTP {}: {}", status.as_u16(), truncate_message(&message)),
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| AttemptError::Api {
                message: format!("unparseable response: {e}"),
            })?;

        if let Some(error) = parsed.error {
            return Err(AttemptError::Api {
                message: truncate_message(&error.message),
            });
        }

        let text = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AttemptError::EmptyBody);
        }
        Ok(text)
    }
}

// ── Fallback sweep ───────────────────────────────────────────────────────

/// Walk (credential, model) combinations until one generation succeeds.
///
/// ## Attempt Order
///
/// The credential list is copied and shuffled with the caller's RNG —
/// deterministic under a seeded RNG, spread-out in production. Within each
/// credential every model is tried in its fixed declared order. Each
/// combination is attempted at most once per sweep.
///
/// ## Failure Policy
///
/// Per-attempt errors are logged and swallowed; after a failure the sweep
/// pauses `attempt_delay_ms` before the next combination. Only when every
/// combination has failed does the sweep return
/// [`LessonLensError::Exhausted`] with the attempt count and the last
/// attempt's message.
pub async fn generate_with_fallback<R>(
    generator: &dyn TextGenerator,
    prompt: &str,
    credentials: &[String],
    config: &AssessmentConfig,
    rng: &mut R,
) -> Result<Generation, LessonLensError>
where
    R: Rng + ?Sized,
{
    if credentials.is_empty() {
        return Err(LessonLensError::KeyListEmpty);
    }

    let mut order: Vec<&String> = credentials.iter().collect();
    order.shuffle(rng);

    let mut attempts = 0usize;
    let mut last_error: Option<AttemptError> = None;

    for credential in order {
        for model in &config.models {
            attempts += 1;
            debug!(
                "Attempt {attempts}: key {} × model {model}",
                key_hint(credential)
            );

            match generator.generate(credential, model, prompt).await {
                Ok(text) => {
                    info!(
                        "Generation succeeded with {model} (key {})",
                        key_hint(credential)
                    );
                    return Ok(Generation {
                        text,
                        credential: credential.clone(),
                        model: model.clone(),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(
                        "Attempt failed [key {}] [model {model}]: {e}",
                        key_hint(credential)
                    );
                    last_error = Some(e);
                    if config.attempt_delay_ms > 0 {
                        sleep(Duration::from_millis(config.attempt_delay_ms)).await;
                    }
                }
            }
        }
    }

    Err(LessonLensError::Exhausted {
        attempts,
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".into()),
    })
}
