//! Content-generation client and fit evaluation.
//!
//! This crate turns "does this resume fit this vacancy?" into a typed
//! [`FitAssessment`]. It handles:
//! - Rendering the prompt with sanitized operator overrides
//! - Calling the provider (Gemini) with retries, backoff and quota handling
//! - Parsing and coercing the provider's free-text JSON reply
//!
//! ## Example Usage
//!
//! ```ignore
//! use ai::{FitMatcher, Matcher, RetryPolicy, RetryingGenerator, gemini::GeminiTransport};
//!
//! let transport = GeminiTransport::new(api_key, "gemini-2.5-pro")?;
//! let generator = RetryingGenerator::new(transport)
//!     .with_policy(RetryPolicy::default().with_max_attempts(3));
//! let matcher = FitMatcher::new(generator, 0.6);
//!
//! let assessment = matcher.evaluate(&resume, &vacancy).await?;
//! ```

pub mod error;
pub mod gemini;
pub mod generator;
pub mod matcher;
pub mod preview;
pub mod prompt;
pub mod retry;

pub use error::{ApiError, GenerateError, MatchError};
pub use generator::{Completion, Generator, ModelInfo, Transport};
pub use matcher::{FitAssessment, FitMatcher, Matcher, parse_response, strip_code_fence};
pub use preview::{DEFAULT_MAX_LOG_LENGTH, truncate_for_log};
pub use prompt::{PromptBuilder, PromptOverrides, SanitizedOverrides};
pub use retry::{RetryPolicy, RetryingGenerator};
