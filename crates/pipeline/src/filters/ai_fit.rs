//! Filter that asks the AI provider whether each vacancy fits the resume.
//!
//! ## Algorithm
//! 1. Fetch the full resume once (failure aborts the stage)
//! 2. For each vacancy, in order:
//!    a. Fetch the detailed record; on failure drop the vacancy with a warning
//!    b. Evaluate it with the [`Matcher`]
//!    c. Evaluation error: attach the error and keep the vacancy
//!    d. `fit == false`: drop it and record it in the exclude file (actor AI)
//!    e. `fit == true`: keep it with its assessment
//!
//! Evaluation errors fail open: a vacancy is only dropped on an explicit
//! rejection, never because the provider was unavailable.

use crate::traits::{Filter, Step};
use ai::{FitAssessment, Matcher, gemini};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use listing::{
    AiAssessment, ExcludeActor, ExcludeFile, ExcludedVacancy, ListingClient, VacancyCollection,
    VacancyId,
};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// AI settings the filter is validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub enabled: bool,
    /// Empty or `gemini`
    pub provider: String,
    /// Zero disables thresholding
    pub minimum_fit_score: f64,
    pub model: String,
    pub max_retries: i64,
    pub max_log_length: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: String::new(),
            minimum_fit_score: 0.0,
            model: String::new(),
            max_retries: 0,
            max_log_length: ai::DEFAULT_MAX_LOG_LENGTH,
        }
    }
}

/// Whether `provider` names a supported content-generation provider.
pub fn is_supported_provider(provider: &str) -> bool {
    let provider = provider.trim();
    provider.is_empty() || provider.eq_ignore_ascii_case(gemini::PROVIDER)
}

pub struct AiFitFilter {
    settings: AiSettings,
    client: Arc<dyn ListingClient>,
    matcher: Option<Arc<dyn Matcher>>,
    resume_id: Option<String>,
    exclude_file: Option<ExcludeFile>,
    assessments: HashMap<VacancyId, FitAssessment>,
}

impl AiFitFilter {
    pub fn new(settings: AiSettings, client: Arc<dyn ListingClient>) -> Self {
        Self {
            settings,
            client,
            matcher: None,
            resume_id: None,
            exclude_file: None,
            assessments: HashMap::new(),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn Matcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn with_resume(mut self, resume_id: impl Into<String>) -> Self {
        self.resume_id = Some(resume_id.into());
        self
    }

    /// Rejected vacancies are appended here.
    pub fn with_exclude_file(mut self, path: Option<PathBuf>) -> Self {
        self.exclude_file = path.filter(|p| !p.as_os_str().is_empty()).map(ExcludeFile::new);
        self
    }

    /// Assessments of the vacancies approved by the last run, by vacancy ID.
    pub fn assessments(&self) -> &HashMap<VacancyId, FitAssessment> {
        &self.assessments
    }

    fn record_rejection(&self, entry: ExcludedVacancy) {
        let Some(file) = &self.exclude_file else {
            return;
        };

        let vacancy_id = entry.id.clone();
        if let Err(err) = file.append([entry]) {
            warn!(
                vacancy_id = %vacancy_id,
                error = %err,
                "failed to append vacancy to exclude file"
            );
        }
    }
}

#[async_trait]
impl Filter for AiFitFilter {
    fn name(&self) -> &str {
        "ai_fit"
    }

    fn validate(&mut self) -> Result<()> {
        if self.settings.model.trim().is_empty() {
            bail!("model is required when the ai filter is enabled");
        }
        if !is_supported_provider(&self.settings.provider) {
            bail!("unsupported ai provider {:?}", self.settings.provider);
        }
        if !(self.settings.minimum_fit_score >= 0.0) {
            bail!("minimum fit score must be >= 0, got {}", self.settings.minimum_fit_score);
        }
        if self.matcher.is_none() {
            bail!("ai matcher is not configured");
        }
        if self.resume_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
            bail!("resume is required for ai evaluation");
        }
        Ok(())
    }

    async fn apply(&mut self, vacancies: VacancyCollection) -> Result<(VacancyCollection, Step)> {
        let initial = vacancies.len();
        let matcher = self.matcher.clone().context("ai matcher is not configured")?;
        let resume_id = self.resume_id.clone().context("resume is required for ai evaluation")?;

        let resume = self
            .client
            .resume_raw(&resume_id)
            .await
            .context("get resume details")?;

        self.assessments.clear();
        let mut approved = Vec::with_capacity(initial);

        for vacancy in vacancies {
            let mut detailed = match self.client.vacancy(&vacancy.id).await {
                Ok(detailed) => detailed,
                Err(err) => {
                    warn!(
                        vacancy_id = %vacancy.id,
                        error = %err,
                        "fetching detailed vacancy failed, skipping it"
                    );
                    continue;
                }
            };

            let assessment = match matcher.evaluate(&resume, &detailed).await {
                Ok(assessment) => assessment,
                Err(err) => {
                    warn!(vacancy_id = %detailed.id, error = %err, "ai evaluation failed");
                    detailed.ai = Some(AiAssessment::failed(err.to_string()));
                    approved.push(detailed);
                    continue;
                }
            };

            if !assessment.fit {
                info!(
                    vacancy_id = %detailed.id,
                    ai_score = assessment.score,
                    reason = %assessment.reason,
                    "vacancy rejected by ai provider"
                );
                detailed.ai = Some(assessment.into());
                let entry = ExcludedVacancy::from_vacancy(&detailed, ExcludeActor::Ai, "");
                self.record_rejection(entry);
                continue;
            }

            info!(vacancy_id = %detailed.id, ai_score = assessment.score, "vacancy approved by ai");
            detailed.ai = Some(assessment.clone().into());
            self.assessments.insert(detailed.id.clone(), assessment);
            approved.push(detailed);
        }

        if approved.len() != initial {
            info!(
                initial_vacancies = initial,
                approved_vacancies = approved.len(),
                "ai filtering completed"
            );
        }

        let step = Step::new(initial, approved.len());
        Ok((VacancyCollection::from(approved), step))
    }

    fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        let provider = if self.settings.provider.trim().is_empty() {
            gemini::PROVIDER
        } else {
            self.settings.provider.trim()
        };
        details.insert("provider".to_string(), provider.to_string());
        details.insert("model".to_string(), self.settings.model.clone());
        details.insert(
            "minimum_fit_score".to_string(),
            format!("{:.2}", self.settings.minimum_fit_score),
        );
        if let Some(file) = &self.exclude_file {
            details.insert("exclude_file".to_string(), file.path().display().to_string());
        }
        details
    }

    fn disabled_reason(&self) -> Option<String> {
        (!self.settings.enabled).then(|| "ai is disabled in configuration".to_string())
    }
}
