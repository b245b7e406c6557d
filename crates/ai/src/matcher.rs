//! Fit evaluation of one vacancy against the operator's resume.
//!
//! ## Algorithm
//! 1. Serialize the resume and the detailed vacancy to JSON
//! 2. Render the prompt (see [`crate::prompt`])
//! 3. Call the [`Generator`]; errors are returned as-is, retries live there
//! 4. Parse the reply: strip a Markdown code fence, parse a JSON object and
//!    coerce loosely typed fields
//! 5. Force `fit = false` when a threshold is set and the score is below it
//!
//! Providers do not reliably follow the schema. A reply that is not JSON at
//! all is an error; a JSON object with odd field types is coerced:
//!
//! | field     | accepted                                     |
//! |-----------|----------------------------------------------|
//! | `fit`     | bool, `"true"`/`"yes"`, non-zero number       |
//! | `score`   | number or numeric string, otherwise 0         |
//! | `reason`  | string, otherwise the JSON text of the value  |
//! | `message` | string, otherwise the JSON text of the value  |

use crate::error::MatchError;
use crate::generator::{Generator, ModelInfo};
use crate::preview::{DEFAULT_MAX_LOG_LENGTH, truncate_for_log};
use crate::prompt::{PromptBuilder, PromptOverrides};
use async_trait::async_trait;
use listing::{AiAssessment, Vacancy};
use serde_json::{Map, Value};
use tracing::debug;

/// Outcome of one successful evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitAssessment {
    pub fit: bool,
    pub score: f64,
    pub reason: String,
    pub message: String,
    /// Provider reply exactly as received
    pub raw: String,
}

impl From<FitAssessment> for AiAssessment {
    fn from(assessment: FitAssessment) -> Self {
        AiAssessment {
            fit: assessment.fit,
            score: assessment.score,
            reason: assessment.reason,
            message: assessment.message,
            raw: assessment.raw,
            error: String::new(),
        }
    }
}

#[async_trait]
pub trait Matcher: Send + Sync {
    async fn evaluate(
        &self,
        resume: &Value,
        vacancy: &Vacancy,
    ) -> Result<FitAssessment, MatchError>;

    fn model_info(&self) -> Option<&dyn ModelInfo> {
        None
    }
}

/// [`Matcher`] backed by a content [`Generator`].
pub struct FitMatcher<G> {
    generator: G,
    min_score: f64,
    max_log_length: usize,
    prompt: PromptBuilder,
}

impl<G: Generator> FitMatcher<G> {
    /// `min_score` of zero disables thresholding.
    pub fn new(generator: G, min_score: f64) -> Self {
        Self {
            generator,
            min_score,
            max_log_length: DEFAULT_MAX_LOG_LENGTH,
            prompt: PromptBuilder::default(),
        }
    }

    /// Zero keeps the default.
    pub fn with_max_log_length(mut self, max_log_length: usize) -> Self {
        if max_log_length > 0 {
            self.max_log_length = max_log_length;
        }
        self
    }

    pub fn with_overrides(mut self, overrides: &PromptOverrides) -> Self {
        self.prompt = PromptBuilder::new(overrides);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn build_prompt(&self, resume: &Value, vacancy: &Vacancy) -> Result<String, MatchError> {
        let resume_json = serde_json::to_string_pretty(resume)
            .map_err(|source| MatchError::Serialize { what: "resume", source })?;
        let vacancy_json = serde_json::to_string_pretty(vacancy)
            .map_err(|source| MatchError::Serialize { what: "vacancy", source })?;

        Ok(self.prompt.render(&resume_json, &vacancy_json))
    }
}

#[async_trait]
impl<G: Generator> Matcher for FitMatcher<G> {
    async fn evaluate(
        &self,
        resume: &Value,
        vacancy: &Vacancy,
    ) -> Result<FitAssessment, MatchError> {
        let prompt = self.build_prompt(resume, vacancy)?;

        debug!(
            vacancy_id = %vacancy.id,
            prompt_length = prompt.chars().count(),
            prompt_preview = %truncate_for_log(&prompt, self.max_log_length),
            user_instructions = %self.prompt.overrides().user_instructions.join(" | "),
            "generate content request"
        );

        let raw = self.generator.generate(&prompt).await?;

        debug!(
            vacancy_id = %vacancy.id,
            response_length = raw.chars().count(),
            response_preview = %truncate_for_log(&raw, self.max_log_length),
            "generate content response"
        );

        let mut assessment = parse_response(&raw)?;

        if self.min_score > 0.0 && assessment.score < self.min_score {
            debug!(
                vacancy_id = %vacancy.id,
                score = assessment.score,
                threshold = self.min_score,
                "fit set to false by score threshold"
            );
            assessment.fit = false;
        }

        assessment.raw = raw;
        Ok(assessment)
    }

    fn model_info(&self) -> Option<&dyn ModelInfo> {
        self.generator.model_info()
    }
}

/// Parse a provider reply into an assessment (without `raw`).
pub fn parse_response(raw: &str) -> Result<FitAssessment, MatchError> {
    let cleaned = strip_code_fence(raw);
    let data: Map<String, Value> =
        serde_json::from_str(cleaned).map_err(|source| MatchError::Parse { source })?;

    Ok(FitAssessment {
        fit: coerce_bool(data.get("fit")),
        score: coerce_score(data.get("score")),
        reason: coerce_text(data.get("reason")),
        message: coerce_text(data.get("message")),
        raw: String::new(),
    })
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(inner) = text.strip_prefix("```") {
        let inner = inner.strip_prefix("json").unwrap_or(inner).trim_start();
        text = match inner.rfind("```") {
            Some(idx) => &inner[..idx],
            None => inner,
        };
    }

    text.trim_matches('`').trim()
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

fn coerce_score(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    score.filter(|s| !s.is_nan()).unwrap_or(0.0)
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}
