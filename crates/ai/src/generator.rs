//! Seams between the fit matcher and the content-generation provider.
//!
//! - [`Transport`] sends exactly one request and reports what happened.
//! - [`Generator`] turns a prompt into text; [`crate::RetryingGenerator`]
//!   implements it on top of a transport.

use crate::error::GenerateError;
use async_trait::async_trait;

/// Identity of the model behind a generator, for logs and status output.
pub trait ModelInfo: Send + Sync {
    fn provider(&self) -> &str;
    fn model(&self) -> &str;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;

    /// Provider and model, when the generator knows them.
    fn model_info(&self) -> Option<&dyn ModelInfo> {
        None
    }
}

/// Raw result of one provider call: the textual parts of every candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub parts: Vec<String>,
}

impl Completion {
    pub fn new<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Non-empty parts, trimmed and joined with newlines.
    pub fn text(&self) -> Option<String> {
        let text = self
            .parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        (!text.is_empty()).then_some(text)
    }
}

/// One request/response round trip with the provider. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, prompt: &str) -> Result<Completion, GenerateError>;

    fn model_info(&self) -> Option<&dyn ModelInfo> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text_joins_non_empty_parts() {
        let completion = Completion::new(["  {\"fit\": true", "", "   ", "\"score\": 1}  "]);
        assert_eq!(completion.text().unwrap(), "{\"fit\": true\n\"score\": 1}");
    }

    #[test]
    fn test_completion_without_text() {
        assert!(Completion::default().text().is_none());
        assert!(Completion::new([" ", "\n"]).text().is_none());
    }
}
