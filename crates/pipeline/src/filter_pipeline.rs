//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::error::PipelineError;
use crate::traits::{Filter, FilterStatus, Step};
use anyhow::anyhow;
use listing::VacancyCollection;
use tracing::{debug, info};

struct Stage {
    filter: Box<dyn Filter>,
    disabled: Option<String>,
}

impl Stage {
    fn name(&self) -> &str {
        self.filter.name()
    }
}

/// Counts for one stage of a run, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub filter: String,
    pub step: Step,
    /// The stage was disabled and did not run
    pub skipped: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub vacancies: VacancyCollection,
    pub steps: Vec<StepReport>,
}

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let mut pipeline = FilterPipeline::new()
///     .add_filter(WithTestFilter)
///     .add_filter(AppliedHistoryFilter::new(client.clone(), false))
///     .add_filter(EmployersFilter::new(blocklist));
///
/// pipeline.disable("employers", "blocklist under review");
/// let outcome = pipeline.run(vacancies).await?;
/// ```
///
/// Order is whatever the caller added; the pipeline only guarantees that
/// stages run one after another.
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a filter to the pipeline (builder pattern).
    ///
    /// A filter that reports [`Filter::disabled_reason`] is added disabled.
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        let disabled = filter.disabled_reason();
        self.stages.push(Stage {
            filter: Box::new(filter),
            disabled,
        });
        self
    }

    /// Disable every stage called `name`, keeping it for status output.
    ///
    /// Disabling an already disabled stage keeps the first reason. Returns
    /// whether any stage matched.
    pub fn disable(&mut self, name: &str, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let mut found = false;
        for stage in self.stages.iter_mut().filter(|s| s.filter.name() == name) {
            found = true;
            if stage.disabled.is_none() {
                stage.disabled = Some(reason.clone());
            }
        }
        found
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.stages
            .iter()
            .any(|s| s.name() == name && s.disabled.is_none())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn statuses(&self) -> Vec<FilterStatus> {
        self.stages
            .iter()
            .map(|stage| {
                let mut details = stage.filter.details();
                let reason = stage.disabled.clone().or_else(|| details.remove("reason"));
                FilterStatus {
                    name: stage.name().to_string(),
                    enabled: stage.disabled.is_none(),
                    reason,
                    details,
                }
            })
            .collect()
    }

    /// Validate every enabled stage, then apply them in order.
    ///
    /// ## Algorithm
    /// 1. For each enabled filter call `validate`; the first error aborts
    ///    the run before anything is applied
    /// 2. For each filter in order:
    ///    a. Disabled: record an unchanged step and move on
    ///    b. Apply the filter; an error aborts the run
    ///    c. Reject a stage that grew the collection
    ///    d. Log the step counts
    /// 3. Return the final collection and every step
    pub async fn run(
        &mut self,
        vacancies: VacancyCollection,
    ) -> Result<PipelineOutcome, PipelineError> {
        for stage in self.stages.iter_mut().filter(|s| s.disabled.is_none()) {
            stage
                .filter
                .validate()
                .map_err(|source| PipelineError::Validation {
                    filter: stage.filter.name().to_string(),
                    source,
                })?;
        }

        let mut current = vacancies;
        let mut steps = Vec::with_capacity(self.stages.len());

        for stage in &mut self.stages {
            let name = stage.filter.name().to_string();

            if let Some(reason) = &stage.disabled {
                info!(filter = %name, reason = %reason, "filter disabled");
                steps.push(StepReport {
                    filter: name,
                    step: Step::unchanged(current.len()),
                    skipped: true,
                });
                continue;
            }

            let initial = current.len();
            debug!(filter = %name, initial, "applying filter");

            let (next, step) = stage
                .filter
                .apply(current)
                .await
                .map_err(|source| PipelineError::Apply {
                    filter: name.clone(),
                    source,
                })?;

            if next.len() > initial {
                return Err(PipelineError::Apply {
                    filter: name,
                    source: anyhow!("collection grew from {} to {} vacancies", initial, next.len()),
                });
            }

            info!(
                filter = %name,
                initial = step.initial,
                dropped = step.dropped,
                left = step.left,
                "filter step"
            );

            steps.push(StepReport {
                filter: name,
                step,
                skipped: false,
            });
            current = next;
        }

        Ok(PipelineOutcome {
            vacancies: current,
            steps,
        })
    }
}
