//! Configuration loader.
//!
//! Uses Figment to merge the TOML config file with `JOBSIFT_*` environment
//! variables (`__` separates nested keys, e.g. `JOBSIFT_AI__GEMINI__MODEL`).

use crate::secrets::{SecretSource, load_secret};
use ai::PromptOverrides;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use listing::SearchParams;
use pipeline::filters::AiSettings;
use responder::RunOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "jobsift.toml";
pub const ENV_PREFIX: &str = "JOBSIFT_";
/// Consulted when `token_file` is not configured
pub const TOKEN_FILE_ENV: &str = "HH_TOKEN_FILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchParams,
    pub exclude_file: Option<PathBuf>,
    pub user_agent: String,
    #[serde(alias = "token-file")]
    pub token_file: Option<PathBuf>,
    /// Inline listing token, used when no token file is set
    #[serde(skip_serializing)]
    pub token: String,
    pub apply: ApplySettings,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplySettings {
    /// Title of the resume to apply with
    pub resume: String,
    pub message: String,
    pub exclude: ExcludeSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeSettings {
    pub employers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub provider: String,
    pub minimum_fit_score: f64,
    pub gemini: GeminiConfig,
    pub prompt: PromptOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing, alias = "api-key")]
    pub api_key: String,
    pub model: String,
    pub max_retries: i64,
    pub max_log_length: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            max_retries: 0,
            max_log_length: ai::DEFAULT_MAX_LOG_LENGTH,
        }
    }
}

impl Settings {
    /// Sources in merge order: the TOML file, then the environment.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .with_context(|| format!("loading configuration from {}", path.display()))
    }

    /// Listing service token from the token file (or `HH_TOKEN_FILE`) or the
    /// inline value.
    pub fn resolve_token(&self) -> Result<String> {
        let env_file = std::env::var_os(TOKEN_FILE_ENV).map(PathBuf::from);
        let file = self.token_file.as_deref().or(env_file.as_deref());

        load_secret(SecretSource {
            name: "headhunter token",
            value: &self.token,
            file,
        })
        .with_context(|| {
            format!("set {TOKEN_FILE_ENV} or the 'token_file' key in the configuration file")
        })
    }

    pub fn ai_settings(&self) -> AiSettings {
        AiSettings {
            enabled: self.ai.enabled,
            provider: self.ai.provider.clone(),
            minimum_fit_score: self.ai.minimum_fit_score,
            model: self.ai.gemini.model.clone(),
            max_retries: self.ai.gemini.max_retries,
            max_log_length: self.ai.gemini.max_log_length,
        }
    }

    pub fn run_options(&self, ignore_applied: bool) -> RunOptions {
        RunOptions {
            search: self.search.clone(),
            resume_title: self.apply.resume.clone(),
            message: self.apply.message.clone(),
            employers: self.apply.exclude.employers.clone(),
            exclude_file: self.exclude_file.clone(),
            ai: self.ai_settings(),
            ignore_applied,
        }
    }
}
