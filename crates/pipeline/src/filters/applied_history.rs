//! Filter to remove vacancies the operator already applied to.
//!
//! Uses the non-archived negotiation history from the listing service.
//! The `--do-not-exclude-applied` flag turns it into a pass-through.

use crate::traits::{Filter, Step};
use anyhow::{Context, Result};
use async_trait::async_trait;
use listing::{ListingClient, VacancyCollection, VacancyField};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const SKIP_REASON: &str = "skip requested via flag";

pub struct AppliedHistoryFilter {
    client: Arc<dyn ListingClient>,
    ignore: bool,
}

impl AppliedHistoryFilter {
    /// `ignore` keeps already applied vacancies in the collection.
    pub fn new(client: Arc<dyn ListingClient>, ignore: bool) -> Self {
        Self { client, ignore }
    }
}

#[async_trait]
impl Filter for AppliedHistoryFilter {
    fn name(&self) -> &str {
        "applied_history"
    }

    async fn apply(
        &mut self,
        mut vacancies: VacancyCollection,
    ) -> Result<(VacancyCollection, Step)> {
        let initial = vacancies.len();

        if self.ignore {
            info!(reason = SKIP_REASON, "ignoring already applied vacancies");
            return Ok((vacancies, Step::unchanged(initial)));
        }

        let applied = self
            .client
            .negotiated_vacancy_ids()
            .await
            .context("get my negotiations")?;

        let excluded = vacancies.exclude(VacancyField::Id, &applied);
        if !excluded.is_empty() {
            info!(
                excluded_vacancies = ?excluded,
                vacancies_left = vacancies.len(),
                "excluding vacancies based on my negotiations"
            );
        }

        let step = Step::new(initial, vacancies.len());
        Ok((vacancies, step))
    }

    fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        details.insert("exclude_applied".to_string(), (!self.ignore).to_string());
        if self.ignore {
            details.insert("reason".to_string(), SKIP_REASON.to_string());
        }
        details
    }
}
