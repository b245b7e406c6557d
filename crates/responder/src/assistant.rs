//! Wiring of the AI matcher from configuration.
//!
//! The matcher stack is Gemini transport → retrying generator → fit matcher.
//! Nothing is built when AI is disabled.

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use ai::gemini::{self, GeminiTransport};
use ai::{FitMatcher, Matcher, PromptOverrides, RetryPolicy, RetryingGenerator};
use pipeline::filters::{AiSettings, is_supported_provider};

/// Consulted in order when no API key is configured
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Pick the configured API key, else the first non-empty variable from
/// [`API_KEY_ENV_VARS`] as returned by `lookup`.
pub fn resolve_api_key(
    configured: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    let configured = configured.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }

    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "gemini api key is required (set ai.gemini.api_key or {})",
                API_KEY_ENV_VARS.join("/")
            )
        })
}

/// Build the matcher for `settings`, or `None` when AI is disabled.
///
/// A negative minimum score is clamped to zero here; the AI filter still
/// reports the configured value during validation.
pub fn build_matcher(
    settings: &AiSettings,
    api_key: &str,
    overrides: &PromptOverrides,
) -> Result<Option<Arc<dyn Matcher>>> {
    if !settings.enabled {
        return Ok(None);
    }
    if !is_supported_provider(&settings.provider) {
        bail!("unsupported ai provider: {}", settings.provider);
    }

    let api_key = resolve_api_key(api_key, |name| std::env::var(name).ok())?;
    let transport = GeminiTransport::new(api_key, settings.model.trim())?;
    let policy = RetryPolicy::default().with_max_attempts(settings.max_retries);
    let generator = RetryingGenerator::new(transport).with_policy(policy);

    let min_score = settings.minimum_fit_score.max(0.0);
    info!(
        provider = gemini::PROVIDER,
        model = %settings.model,
        minimum_fit_score = min_score,
        ai_retry_attempts = policy.max_attempts,
        "ai assistance enabled"
    );

    let matcher = FitMatcher::new(generator, min_score)
        .with_max_log_length(settings.max_log_length)
        .with_overrides(overrides);
    Ok(Some(Arc::new(matcher)))
}
