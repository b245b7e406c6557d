//! Prompt rendering and sanitization of operator-supplied overrides.
//!
//! Overrides are interpolated into a dedicated section of the prompt. They
//! come from configuration and may contain anything, so before rendering:
//!
//! - single-line fields lose newlines, tabs and control characters, collapse
//!   whitespace, and are cut to [`MAX_SINGLE_LINE_OVERRIDE`] characters
//! - backticks become `'` and square brackets become parentheses, so a value
//!   cannot open a code block or fake a `[Section]` header
//! - free-form instructions keep their line breaks but are limited to
//!   [`MAX_USER_INSTRUCTION_LINES`] non-blank lines and
//!   [`MAX_USER_INSTRUCTION_CHARS`] characters in total
//!
//! Placeholders are substituted in a single left-to-right pass. Text that
//! looks like a placeholder inside a substituted value (for example a resume
//! containing `{{tone}}`) is copied verbatim and never expanded.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OVERRIDE_VALUE: &str = "none";
pub const DEFAULT_TONE_VALUE: &str = "Friendly";
pub const MAX_SINGLE_LINE_OVERRIDE: usize = 160;
pub const MAX_USER_INSTRUCTION_CHARS: usize = 400;
pub const MAX_USER_INSTRUCTION_LINES: usize = 5;

const DEFAULT_TEMPLATE: &str = include_str!("prompt.md");

/// Optional prompt customizations from the operator, as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub extra_criteria: String,
    pub deal_breakers: String,
    pub custom_keywords: String,
    pub tone: String,
    pub region_constraints: String,
    pub user_instructions: String,
}

/// Overrides after sanitization; safe to interpolate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedOverrides {
    pub extra_criteria: String,
    pub deal_breakers: String,
    pub custom_keywords: String,
    pub tone: String,
    pub region_constraints: String,
    pub user_instructions: Vec<String>,
}

impl PromptOverrides {
    pub fn sanitize(&self) -> SanitizedOverrides {
        SanitizedOverrides {
            extra_criteria: sanitize_single_line(&self.extra_criteria, DEFAULT_OVERRIDE_VALUE),
            deal_breakers: sanitize_single_line(&self.deal_breakers, DEFAULT_OVERRIDE_VALUE),
            custom_keywords: sanitize_single_line(&self.custom_keywords, DEFAULT_OVERRIDE_VALUE),
            tone: sanitize_single_line(&self.tone, DEFAULT_TONE_VALUE),
            region_constraints: sanitize_single_line(
                &self.region_constraints,
                DEFAULT_OVERRIDE_VALUE,
            ),
            user_instructions: sanitize_user_instructions(&self.user_instructions),
        }
    }
}

impl SanitizedOverrides {
    /// Render instructions as an indented bullet list.
    pub fn format_user_instructions(&self) -> String {
        if self.user_instructions.is_empty() {
            return "  - none".to_string();
        }

        self.user_instructions
            .iter()
            .map(|line| format!("  - {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Clean a single-line override; empty results fall back to `default`.
pub fn sanitize_single_line(value: &str, default: &str) -> String {
    let cleaned = sanitize_text(value, false);
    let cleaned = if cleaned.is_empty() { default } else { cleaned.as_str() };
    cleaned.chars().take(MAX_SINGLE_LINE_OVERRIDE).collect()
}

/// Clean the free-form instructions into at most five bounded lines.
pub fn sanitize_user_instructions(value: &str) -> Vec<String> {
    let cleaned = sanitize_text(value, true);
    let mut lines = Vec::new();
    let mut total = 0;

    for line in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let remaining = MAX_USER_INSTRUCTION_CHARS - total;
        if remaining == 0 {
            break;
        }

        let line: String = line.chars().take(remaining).collect();
        total += line.chars().count();
        lines.push(line);

        if lines.len() == MAX_USER_INSTRUCTION_LINES {
            break;
        }
    }

    lines
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_text(value: &str, allow_newlines: bool) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let normalized = trimmed.replace("\r\n", "\n").replace('\r', "\n");

    let mut cleaned = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match c {
            '`' => cleaned.push('\''),
            '[' => cleaned.push('('),
            ']' => cleaned.push(')'),
            '\n' if allow_newlines => cleaned.push('\n'),
            '\n' | '\t' | '\u{00A0}' => cleaned.push(' '),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }

    if allow_newlines {
        cleaned
            .split('\n')
            .map(collapse_whitespace)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    } else {
        collapse_whitespace(&cleaned)
    }
}

/// Renders the evaluation prompt from a template and sanitized overrides.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    overrides: SanitizedOverrides,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&PromptOverrides::default())
    }
}

impl PromptBuilder {
    pub fn new(overrides: &PromptOverrides) -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            overrides: overrides.sanitize(),
        }
    }

    /// Replace the built-in template. A blank template keeps the built-in one.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        if !template.trim().is_empty() {
            self.template = template;
        }
        self
    }

    pub fn overrides(&self) -> &SanitizedOverrides {
        &self.overrides
    }

    pub fn render(&self, resume_json: &str, vacancy_json: &str) -> String {
        let instructions = self.overrides.format_user_instructions();

        substitute(&self.template, |key| match key {
            "RESUME_JSON" => Some(resume_json),
            "VACANCY_JSON" => Some(vacancy_json),
            "extra_criteria" => Some(self.overrides.extra_criteria.as_str()),
            "deal_breakers" => Some(self.overrides.deal_breakers.as_str()),
            "custom_keywords" => Some(self.overrides.custom_keywords.as_str()),
            "tone" => Some(self.overrides.tone.as_str()),
            "region_constraints" => Some(self.overrides.region_constraints.as_str()),
            "user_instructions_sanitized" => Some(instructions.as_str()),
            _ => None,
        })
    }
}

/// Single pass over `template`, replacing `{{key}}` with `lookup(key)`.
/// Unknown keys are left as they are.
fn substitute<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}").and_then(|end| lookup(&after[..end]).map(|v| (end, v))) {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
