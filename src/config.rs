//! Configuration types for a lesson-plan assessment.
//!
//! All behaviour is controlled through [`AssessmentConfig`], built via its
//! [`AssessmentConfigBuilder`]. Keeping every knob in one struct means there
//! are no process-wide singletons: the whole request-scoped state travels
//! down through function parameters.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::LessonLensError;
use crate::pipeline::format::FormatterOptions;
use serde::{Deserialize, Serialize};

/// Model identifiers tried in priority order, highest capability first.
///
/// The order is fixed for every credential: a cheaper model is only
/// consulted once the better one has failed on the same key.
pub const DEFAULT_MODELS: &[&str] = &["gemini-3-pro-preview", "gemini-3-flash-preview"];

/// Share link of the hosted JSON credential list.
pub const DEFAULT_KEYS_URL: &str =
    "https://drive.google.com/file/d/1iBZqNSs6VyhFB5hQldG_5XBPKFtMfGuV/view?usp=sharing";

/// Base URL of the Generative Language API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for one assessment run.
///
/// Built via [`AssessmentConfig::builder()`] or [`AssessmentConfig::default()`].
///
/// # Example
/// ```rust
/// use lessonlens::AssessmentConfig;
///
/// let config = AssessmentConfig::builder()
///     .models(["gemini-3-flash-preview"])
///     .attempt_delay_ms(250)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Model identifiers in fixed priority order. Default: [`DEFAULT_MODELS`].
    pub models: Vec<String>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// The review is meant to be opinionated and suggest alternatives, so
    /// the temperature sits well above the near-zero values used for
    /// transcription work.
    pub temperature: f32,

    /// Nucleus-sampling probability mass. Default: 0.95.
    pub top_p: f32,

    /// Top-k sampling cutoff. Default: 64.
    pub top_k: u32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A full four-section review of a long lesson plan can exceed 4 000
    /// output tokens; 8 192 leaves headroom without letting a runaway
    /// response bill indefinitely.
    pub max_output_tokens: u32,

    /// Delay after a failed attempt before trying the next (credential,
    /// model) combination, in milliseconds. Default: 500.
    ///
    /// A fixed pause, not exponential backoff: the sweep moves to a
    /// *different* key or model on each step, so the next request does not
    /// hit the endpoint that just rejected us.
    pub attempt_delay_ms: u64,

    /// Share link of the hosted credential list. Default: [`DEFAULT_KEYS_URL`].
    pub keys_url: String,

    /// Generative Language API base URL. Default: [`DEFAULT_API_BASE_URL`].
    ///
    /// Overridable so tests can point the client at a local stub.
    pub api_base_url: String,

    /// Per-HTTP-request timeout in seconds (credential download and each
    /// generation attempt). Default: 120.
    pub request_timeout_secs: u64,

    /// Report formatter options (annotation denylist).
    pub formatter: FormatterOptions,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            temperature: 0.7,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            attempt_delay_ms: 500,
            keys_url: DEFAULT_KEYS_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 120,
            formatter: FormatterOptions::default(),
        }
    }
}

impl AssessmentConfig {
    /// Create a new builder for `AssessmentConfig`.
    pub fn builder() -> AssessmentConfigBuilder {
        AssessmentConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AssessmentConfig`].
#[derive(Debug)]
pub struct AssessmentConfigBuilder {
    config: AssessmentConfig,
}

impl AssessmentConfigBuilder {
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k.max(1);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn attempt_delay_ms(mut self, ms: u64) -> Self {
        self.config.attempt_delay_ms = ms;
        self
    }

    pub fn keys_url(mut self, url: impl Into<String>) -> Self {
        self.config.keys_url = url.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn formatter(mut self, options: FormatterOptions) -> Self {
        self.config.formatter = options;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssessmentConfig, LessonLensError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(LessonLensError::InvalidConfig(
                "At least one model identifier is required".into(),
            ));
        }
        if c.models.iter().any(|m| m.trim().is_empty()) {
            return Err(LessonLensError::InvalidConfig(
                "Model identifiers must be non-empty".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(LessonLensError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
