//! # Responder Orchestrator
//!
//! This module coordinates one run of the responder:
//! 1. Select the operator's resume by title
//! 2. Search vacancies (all pages)
//! 3. Assemble the filter pipeline in its fixed order
//! 4. Run the pipeline and collect per-stage counts and filter statuses
//! 5. Optionally apply to what is left, or append it to the exclude file
//!
//! The pipeline order is fixed here: with_test, applied_history, employers,
//! exclude_file, ai_fit.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, warn};

use ai::Matcher;
use listing::{
    EXCLUDE_REASON_MANUAL, ExcludeActor, ExcludeFile, ExcludedVacancy, ListingClient, Resume,
    SearchParams, Vacancy, VacancyCollection,
};
use pipeline::filters::{
    AiFitFilter, AiSettings, AppliedHistoryFilter, EmployersFilter, ExcludeFileFilter,
    WithTestFilter,
};
use pipeline::{FilterPipeline, FilterStatus, StepReport};

/// Sent when neither the AI nor the configuration provides a message
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Hello! I would like to apply for this vacancy.";

#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("resume title is required under apply.resume")]
    ResumeTitleMissing,

    #[error("resume {title:?} not found, known titles: {}", known.join(", "))]
    ResumeNotFound { title: String, known: Vec<String> },

    #[error("exclude file is not configured")]
    ExcludeFileMissing,
}

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub search: SearchParams,
    /// Title of the resume to apply with
    pub resume_title: String,
    /// Configured cover message
    pub message: String,
    /// Employer blocklist
    pub employers: Vec<String>,
    pub exclude_file: Option<PathBuf>,
    pub ai: AiSettings,
    /// Keep vacancies the operator already applied to
    pub ignore_applied: bool,
}

/// Outcome of [`Responder::run`]
#[derive(Debug, Clone)]
pub struct RunReport {
    pub resume: Resume,
    /// Search results before filtering
    pub found: usize,
    pub vacancies: VacancyCollection,
    pub steps: Vec<StepReport>,
    pub statuses: Vec<FilterStatus>,
}

/// Main orchestrator that coordinates a responder run
pub struct Responder {
    client: Arc<dyn ListingClient>,
    options: RunOptions,
    matcher: Option<Arc<dyn Matcher>>,
}

impl Responder {
    pub fn new(client: Arc<dyn ListingClient>, options: RunOptions) -> Self {
        Self {
            client,
            options,
            matcher: None,
        }
    }

    /// Matcher used by the AI filter; `None` leaves it unconfigured.
    pub fn with_matcher(mut self, matcher: Option<Arc<dyn Matcher>>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Find the operator's resume whose title matches the configured one.
    pub async fn select_resume(&self) -> Result<Resume> {
        let title = self.options.resume_title.trim();
        if title.is_empty() {
            return Err(ResponderError::ResumeTitleMissing.into());
        }

        let resumes = self.client.my_resumes().await.context("getting mine resumes")?;
        info!(count = resumes.len(), "getting mine resumes");

        let known: Vec<String> = resumes.iter().map(|r| r.title.clone()).collect();
        resumes.into_iter().find(|r| r.title == title).ok_or_else(|| {
            ResponderError::ResumeNotFound {
                title: title.to_string(),
                known,
            }
            .into()
        })
    }

    /// Build the pipeline for `resume` in the fixed filter order.
    pub fn assemble_pipeline(&self, resume: &Resume) -> FilterPipeline {
        let mut ai_filter = AiFitFilter::new(self.options.ai.clone(), self.client.clone())
            .with_resume(resume.id.clone())
            .with_exclude_file(self.options.exclude_file.clone());
        if let Some(matcher) = &self.matcher {
            ai_filter = ai_filter.with_matcher(matcher.clone());
        }

        FilterPipeline::new()
            .add_filter(WithTestFilter)
            .add_filter(AppliedHistoryFilter::new(self.client.clone(), self.options.ignore_applied))
            .add_filter(EmployersFilter::new(self.options.employers.clone()))
            .add_filter(ExcludeFileFilter::new(self.options.exclude_file.clone()))
            .add_filter(ai_filter)
    }

    /// Main entry point: select the resume, search and filter.
    pub async fn run(&self) -> Result<RunReport> {
        let start_time = Instant::now();

        let resume = self.select_resume().await?;
        info!(resume_id = %resume.id, title = %resume.title, "selected resume");

        info!(search = %self.options.search.text, "starting the search");
        let found = self.client.search(&self.options.search).await.context("search")?;
        let found_count = found.len();
        info!(count = found_count, "getting vacancies");

        let mut pipeline = self.assemble_pipeline(&resume);
        let outcome = pipeline.run(found).await?;
        let statuses = pipeline.statuses();

        info!(
            found = found_count,
            left = outcome.vacancies.len(),
            elapsed = ?start_time.elapsed(),
            "run complete"
        );

        Ok(RunReport {
            resume,
            found: found_count,
            vacancies: outcome.vacancies,
            steps: outcome.steps,
            statuses,
        })
    }

    /// Apply to every vacancy in order; the first failure stops the loop.
    ///
    /// Returns the number of applications sent.
    pub async fn apply(&self, resume: &Resume, vacancies: &VacancyCollection) -> Result<usize> {
        let mut applied = 0;

        for vacancy in vacancies {
            let message = choose_message(vacancy, &self.options.message);
            if self.options.message.trim().is_empty() && message == DEFAULT_FALLBACK_MESSAGE {
                warn!(vacancy_id = %vacancy.id, "falling back to default message");
            }

            self.client
                .apply(&resume.id, &vacancy.id, &message)
                .await
                .with_context(|| format!("apply to vacancy {}", vacancy.id))?;
            applied += 1;

            match vacancy.ai.as_ref().filter(|ai| !ai.is_error()) {
                Some(ai) => info!(
                    vacancy_id = %vacancy.id,
                    vacancy_name = %vacancy.name,
                    ai_score = ai.score,
                    "successfully applied to vacancy"
                ),
                None => info!(
                    vacancy_id = %vacancy.id,
                    vacancy_name = %vacancy.name,
                    "successfully applied to vacancy"
                ),
            }
        }

        info!(count = applied, "successfully applied to vacancies");
        Ok(applied)
    }

    /// Append every vacancy to the exclude file as a manual exclusion.
    ///
    /// Returns the number of entries in the file afterwards.
    pub fn exclude_remaining(&self, vacancies: &VacancyCollection) -> Result<usize> {
        let path = self
            .options
            .exclude_file
            .as_ref()
            .ok_or(ResponderError::ExcludeFileMissing)?;

        let file = ExcludeFile::new(path);
        let entries = vacancies
            .iter()
            .map(|v| ExcludedVacancy::from_vacancy(v, ExcludeActor::Human, EXCLUDE_REASON_MANUAL));
        let total = file.append(entries)?;

        info!(filename = %path.display(), appended = vacancies.len(), "appended to exclude file");
        Ok(total)
    }
}

/// Message to send with an application.
///
/// ## Algorithm
/// 1. The AI-generated message, if any
/// 2. The configured message
/// 3. The AI reason, only when no message is configured
/// 4. [`DEFAULT_FALLBACK_MESSAGE`]
pub fn choose_message(vacancy: &Vacancy, configured: &str) -> String {
    let configured = configured.trim();
    let ai = vacancy.ai.as_ref().filter(|ai| !ai.is_error());

    if let Some(message) = ai.map(|ai| ai.message.trim()).filter(|m| !m.is_empty()) {
        return message.to_string();
    }
    if !configured.is_empty() {
        return configured.to_string();
    }
    if let Some(reason) = ai.map(|ai| ai.reason.trim()).filter(|r| !r.is_empty()) {
        return reason.to_string();
    }
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

/// Write `vacancies` to `path` as pretty JSON.
pub fn dump_to_file(vacancies: &VacancyCollection, path: &Path) -> Result<()> {
    let data = serde_json::to_vec_pretty(vacancies).context("serialize vacancies")?;
    std::fs::write(path, data).with_context(|| format!("dump vacancies to {}", path.display()))?;
    info!(filename = %path.display(), count = vacancies.len(), "dumping result to file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai::{FitAssessment, MatchError};
    use async_trait::async_trait;
    use listing::{AiAssessment, VacancyId};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClient {
        found: Vec<Vacancy>,
        applied_before: Vec<VacancyId>,
        sent: Mutex<Vec<(String, String, String)>>,
        fail_apply_on: Option<String>,
    }

    #[async_trait]
    impl ListingClient for FakeClient {
        async fn search(&self, _params: &SearchParams) -> listing::Result<VacancyCollection> {
            Ok(VacancyCollection::from(self.found.clone()))
        }

        async fn vacancy(&self, id: &str) -> listing::Result<Vacancy> {
            self.found
                .iter()
                .find(|v| v.id == id)
                .cloned()
                .ok_or(listing::ListingError::MissingArgument("vacancy"))
        }

        async fn negotiated_vacancy_ids(&self) -> listing::Result<Vec<VacancyId>> {
            Ok(self.applied_before.clone())
        }

        async fn resume_raw(&self, id: &str) -> listing::Result<Value> {
            Ok(json!({ "id": id }))
        }

        async fn my_resumes(&self) -> listing::Result<Vec<Resume>> {
            Ok(vec![
                Resume {
                    id: "r1".to_string(),
                    title: "Rust developer".to_string(),
                },
                Resume {
                    id: "r2".to_string(),
                    title: "Go developer".to_string(),
                },
            ])
        }

        async fn apply(
            &self,
            resume_id: &str,
            vacancy_id: &str,
            message: &str,
        ) -> listing::Result<()> {
            if self.fail_apply_on.as_deref() == Some(vacancy_id) {
                return Err(listing::ListingError::BadStatus {
                    status: 403,
                    url: "/negotiations".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((resume_id.to_string(), vacancy_id.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct ApproveAll;

    #[async_trait]
    impl Matcher for ApproveAll {
        async fn evaluate(
            &self,
            _resume: &Value,
            vacancy: &Vacancy,
        ) -> Result<FitAssessment, MatchError> {
            Ok(FitAssessment {
                fit: true,
                score: 0.9,
                message: format!("Cover letter for {}", vacancy.id),
                ..FitAssessment::default()
            })
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            resume_title: "Rust developer".to_string(),
            ..RunOptions::default()
        }
    }

    fn with_ai(fit: bool, message: &str, reason: &str) -> Vacancy {
        let mut vacancy = Vacancy::new("1", "Engineer");
        vacancy.ai = Some(AiAssessment {
            fit,
            score: 0.7,
            message: message.to_string(),
            reason: reason.to_string(),
            ..AiAssessment::default()
        });
        vacancy
    }

    #[test]
    fn test_choose_message() {
        assert_eq!(choose_message(&with_ai(true, "AI hello", "fits"), "Configured"), "AI hello");
        assert_eq!(choose_message(&with_ai(true, "", "fits"), "Configured"), "Configured");
        assert_eq!(choose_message(&with_ai(true, "", "fits"), "  "), "fits");
        assert_eq!(choose_message(&Vacancy::new("2", "Plain"), ""), DEFAULT_FALLBACK_MESSAGE);

        let mut failed = Vacancy::new("3", "Failed");
        failed.ai = Some(AiAssessment::failed("timeout"));
        assert_eq!(choose_message(&failed, ""), DEFAULT_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_select_resume_by_title() {
        let responder = Responder::new(Arc::new(FakeClient::default()), options());
        let resume = responder.select_resume().await.unwrap();
        assert_eq!(resume.id, "r1");
    }

    #[tokio::test]
    async fn test_unknown_resume_lists_known_titles() {
        let responder = Responder::new(
            Arc::new(FakeClient::default()),
            RunOptions {
                resume_title: "Designer".to_string(),
                ..RunOptions::default()
            },
        );

        let err = responder.select_resume().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Rust developer, Go developer"), "{message}");
        assert!(matches!(
            err.downcast_ref::<ResponderError>(),
            Some(ResponderError::ResumeNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_resume_title() {
        let responder = Responder::new(Arc::new(FakeClient::default()), RunOptions::default());
        let err = responder.select_resume().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResponderError>(),
            Some(ResponderError::ResumeTitleMissing)
        ));
    }

    #[test]
    fn test_pipeline_order() {
        let responder = Responder::new(Arc::new(FakeClient::default()), options());
        let pipeline = responder.assemble_pipeline(&Resume::default());

        let names: Vec<String> = pipeline.statuses().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["with_test", "applied_history", "employers", "exclude_file", "ai_fit"]);
        assert!(!pipeline.is_enabled("ai_fit"));
    }

    #[tokio::test]
    async fn test_run_and_apply() {
        let client = Arc::new(FakeClient {
            found: vec![
                Vacancy::new("1", "First"),
                Vacancy::new("2", "Applied before"),
                Vacancy::new("3", "Has test").with_test(true),
            ],
            applied_before: vec!["2".to_string()],
            ..FakeClient::default()
        });
        let responder = Responder::new(
            client.clone(),
            RunOptions {
                ai: AiSettings {
                    enabled: true,
                    model: "gemini-2.5-pro".to_string(),
                    ..AiSettings::default()
                },
                ..options()
            },
        )
        .with_matcher(Some(Arc::new(ApproveAll)));

        let report = responder.run().await.unwrap();
        assert_eq!(report.found, 3);
        assert_eq!(report.vacancies.ids(), vec!["1"]);
        assert_eq!(report.steps.len(), 5);
        assert!(report.statuses.iter().all(|s| s.enabled));

        let applied = responder.apply(&report.resume, &report.vacancies).await.unwrap();
        assert_eq!(applied, 1);
        let sent = client.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![("r1".to_string(), "1".to_string(), "Cover letter for 1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_apply_stops_on_first_failure() {
        let client = Arc::new(FakeClient {
            fail_apply_on: Some("2".to_string()),
            ..FakeClient::default()
        });
        let responder = Responder::new(client.clone(), options());
        let vacancies = VacancyCollection::from(vec![
            Vacancy::new("1", "A"),
            Vacancy::new("2", "B"),
            Vacancy::new("3", "C"),
        ]);

        let err = responder.apply(&Resume::default(), &vacancies).await.unwrap_err();

        assert!(err.to_string().contains("apply to vacancy 2"));
        assert_eq!(client.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_exclude_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("excluded.json");
        let responder = Responder::new(
            Arc::new(FakeClient::default()),
            RunOptions {
                exclude_file: Some(path.clone()),
                ..options()
            },
        );
        let vacancies =
            VacancyCollection::from(vec![Vacancy::new("1", "A"), Vacancy::new("2", "B")]);

        assert_eq!(responder.exclude_remaining(&vacancies).unwrap(), 2);

        let excluded = ExcludeFile::new(&path).load().unwrap();
        assert!(excluded.items.iter().all(|e| e.actor == ExcludeActor::Human));
        assert!(excluded.items.iter().all(|e| e.reason == EXCLUDE_REASON_MANUAL));
    }

    #[test]
    fn test_exclude_remaining_requires_a_file() {
        let responder = Responder::new(Arc::new(FakeClient::default()), options());
        let err = responder.exclude_remaining(&VacancyCollection::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResponderError>(),
            Some(ResponderError::ExcludeFileMissing)
        ));
    }

    #[test]
    fn test_dump_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        let vacancies = VacancyCollection::from(vec![Vacancy::new("1", "A")]);

        dump_to_file(&vacancies, &path).unwrap();

        let dumped = std::fs::read_to_string(&path).unwrap();
        let loaded: VacancyCollection = serde_json::from_str(&dumped).unwrap();
        assert_eq!(loaded.ids(), vec!["1"]);
    }
}
