//! The listing service contract.
//!
//! Everything above this crate (filters, orchestrator, CLI) talks to the
//! listing service only through [`ListingClient`], so tests can substitute a
//! scripted fake for [`crate::HeadhunterClient`].

use crate::collection::VacancyCollection;
use crate::error::Result;
use crate::types::{Resume, Vacancy, VacancyId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Largest page size the service accepts
pub const MAX_PER_PAGE: u32 = 100;

#[async_trait]
pub trait ListingClient: Send + Sync {
    /// Run a search and collect the results of every page.
    async fn search(&self, params: &SearchParams) -> Result<VacancyCollection>;

    /// Fetch the detailed record of one vacancy.
    async fn vacancy(&self, id: &str) -> Result<Vacancy>;

    /// IDs of vacancies the operator already applied to (non-archived only).
    async fn negotiated_vacancy_ids(&self) -> Result<Vec<VacancyId>>;

    /// Full resume payload, kept as raw JSON for the AI prompt.
    async fn resume_raw(&self, id: &str) -> Result<serde_json::Value>;

    /// The operator's own resumes.
    async fn my_resumes(&self) -> Result<Vec<Resume>>;

    /// Submit an application for `vacancy_id` with `message`.
    async fn apply(&self, resume_id: &str, vacancy_id: &str, message: &str) -> Result<()>;
}

/// Search parameters as written in the configuration file.
///
/// Zero and empty values are left out of the query so the service applies
/// its own defaults, except `per_page` which falls back to [`MAX_PER_PAGE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub text: String,
    #[serde(alias = "area")]
    pub areas: Vec<u32>,
    pub clusters: bool,
    pub order_by: String,
    pub employer_id: u64,
    pub search_field: String,
    #[serde(alias = "schedule")]
    pub schedules: Vec<String>,
    pub per_page: u32,
    pub experience: String,
    /// Only vacancies published within this many days
    pub period: u32,
}

impl SearchParams {
    /// Build the query pairs for `GET /vacancies`.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        push_non_empty(&mut query, "text", &self.text);
        for area in &self.areas {
            query.push(("area", area.to_string()));
        }
        if self.clusters {
            query.push(("clusters", "true".to_string()));
        }
        push_non_empty(&mut query, "order_by", &self.order_by);
        if self.employer_id != 0 {
            query.push(("employer_id", self.employer_id.to_string()));
        }
        push_non_empty(&mut query, "search_field", &self.search_field);
        for schedule in self.schedules.iter().filter(|s| !s.is_empty()) {
            query.push(("schedule", schedule.clone()));
        }

        let per_page = if self.per_page == 0 {
            MAX_PER_PAGE
        } else {
            self.per_page.min(MAX_PER_PAGE)
        };
        query.push(("per_page", per_page.to_string()));

        push_non_empty(&mut query, "experience", &self.experience);
        if self.period != 0 {
            query.push(("period", self.period.to_string()));
        }

        query
    }
}

fn push_non_empty(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        query.push((key, value.to_string()));
    }
}
