//! Gemini `generateContent` REST transport.
//!
//! Errors are mapped into [`GenerateError`] so the retry layer can classify
//! them. Quota errors usually carry a `google.rpc.RetryInfo` detail with a
//! `retryDelay` such as `"37s"`; older responses only mention the delay in
//! the message ("retry after 60 seconds", "Please retry in 12.5s"). Both are
//! turned into [`ApiError::retry_delay`].

use crate::error::{ApiError, GenerateError};
use crate::generator::{Completion, ModelInfo, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const PROVIDER: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn into_completion(self) -> Completion {
        Completion::new(
            self.candidates
                .into_iter()
                .filter_map(|c| c.content)
                .flat_map(|c| c.parts)
                .filter_map(|p| p.text),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

pub struct GeminiTransport {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiTransport {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerateError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(GenerateError::Transport("gemini api key is required".into()));
        }

        let model = model.into().trim().to_string();
        let model = if model.is_empty() { DEFAULT_MODEL.to_string() } else { model };

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl ModelInfo for GeminiTransport {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn send(&self, prompt: &str) -> Result<Completion, GenerateError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &body);
            debug!(
                code = err.code,
                status = %err.status,
                retry_delay = ?err.retry_delay,
                "gemini error response"
            );
            return Err(err.into());
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Transport(format!("cannot decode gemini response: {e}")))?;

        Ok(parsed.into_completion())
    }

    fn model_info(&self) -> Option<&dyn ModelInfo> {
        Some(self)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GenerateError {
    if err.is_timeout() {
        GenerateError::Timeout
    } else {
        GenerateError::Transport(err.to_string())
    }
}

/// Build an [`ApiError`] from a non-2xx response body.
fn parse_error(code: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).map(|e| e.error).ok();
    let Some(error) = parsed else {
        return ApiError::new(code, "", body.trim());
    };

    let retry_delay = error
        .details
        .iter()
        .filter(|d| d.get("@type").and_then(|t| t.as_str()) == Some(RETRY_INFO_TYPE))
        .find_map(|d| d.get("retryDelay").and_then(|v| v.as_str()).and_then(parse_duration))
        .or_else(|| retry_hint_from_message(&error.message));

    ApiError {
        code: if error.code == 0 { code } else { error.code },
        status: error.status,
        message: error.message,
        retry_delay,
    }
}

/// Parse protobuf-style durations: `"37s"`, `"1.5s"`, `"250ms"`.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (number, divisor) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 1000.0)
    } else if let Some(s) = value.strip_suffix('s') {
        (s, 1.0)
    } else {
        return None;
    };

    let seconds = number.trim().parse::<f64>().ok()? / divisor;
    seconds_to_duration(seconds)
}

/// Negative and NaN delays are dropped; delays beyond [`Duration::MAX`]
/// saturate so the retry layer reports them as too long.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_nan() || seconds < 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
}

/// Find "retry after 60 seconds" / "retry in 12.5s" in a free-text message.
fn retry_hint_from_message(message: &str) -> Option<Duration> {
    let lower = message.to_ascii_lowercase();
    let start = ["retry after ", "retry in "]
        .iter()
        .find_map(|marker| lower.find(marker).map(|idx| idx + marker.len()))?;

    let rest = &lower[start..];
    let number_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let seconds: f64 = rest[..number_len].trim_end_matches('.').parse().ok()?;

    let unit: String = rest[number_len..]
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    let seconds = match unit.as_str() {
        "ms" | "millisecond" | "milliseconds" => seconds / 1000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => seconds * 60.0,
        _ => seconds,
    };

    seconds_to_duration(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_info_detail() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted",
            "status":"RESOURCE_EXHAUSTED",
            "details":[{"@type":"type.googleapis.com/google.rpc.QuotaFailure"},
                       {"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"37s"}]}}"#;

        let err = parse_error(429, body);

        assert_eq!(err.code, 429);
        assert_eq!(err.status, "RESOURCE_EXHAUSTED");
        assert_eq!(err.retry_delay, Some(Duration::from_secs(37)));
    }

    #[test]
    fn test_retry_hint_in_message() {
        let body = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED",
            "message":"quota exhausted, retry after 60 seconds"}}"#;
        assert_eq!(parse_error(429, body).retry_delay, Some(Duration::from_secs(60)));

        assert_eq!(
            retry_hint_from_message("Please retry in 12.5s."),
            Some(Duration::from_millis(12_500))
        );
        assert_eq!(
            retry_hint_from_message("Retry after 2 minutes"),
            Some(Duration::from_secs(120))
        );
        assert_eq!(retry_hint_from_message("internal error"), None);
    }

    #[test]
    fn test_only_minute_units_scale_the_hint() {
        assert_eq!(
            retry_hint_from_message("retry in 30 more seconds"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(retry_hint_from_message("retry in 3 min"), Some(Duration::from_secs(180)));
        assert_eq!(retry_hint_from_message("retry in 1m"), Some(Duration::from_secs(60)));
        assert_eq!(retry_hint_from_message("retry in 500ms"), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_huge_delays_saturate() {
        let body = r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED",
            "details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo",
                        "retryDelay":"1e20s"}]}}"#;
        assert_eq!(parse_error(429, body).retry_delay, Some(Duration::MAX));

        assert_eq!(
            retry_hint_from_message("retry after 99999999999999999999999 seconds"),
            Some(Duration::MAX)
        );
        assert_eq!(parse_duration("infs"), Some(Duration::MAX));
        assert_eq!(parse_duration("-5s"), None);
    }

    #[test]
    fn test_server_error_without_hint() {
        let body =
            r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let err = parse_error(503, body);
        assert!(err.retry_delay.is_none());
        assert!(err.is_retryable_status());
    }

    #[test]
    fn test_non_json_error_body() {
        let err = parse_error(502, "<html>Bad Gateway</html>");
        assert_eq!(err.code, 502);
        assert_eq!(err.message, "<html>Bad Gateway</html>");
        assert!(err.is_retryable_status());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn test_response_parts_are_collected() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"{\"fit\":true,"},{"text":"\"score\":0.9}"}]}},
            {"finishReason":"SAFETY"}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_completion().text().unwrap(), "{\"fit\":true,\n\"score\":0.9}");
    }

    #[test]
    fn test_new_requires_api_key_and_defaults_model() {
        assert!(GeminiTransport::new("  ", "gemini-pro").is_err());

        let transport = GeminiTransport::new("key", " ").unwrap();
        assert_eq!(transport.model(), DEFAULT_MODEL);
        assert_eq!(transport.provider(), PROVIDER);
        assert!(transport.endpoint().ends_with("/models/gemini-2.5-pro:generateContent"));
    }
}
