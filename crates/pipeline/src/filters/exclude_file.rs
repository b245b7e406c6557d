//! Filter to remove vacancies listed in the exclude file.

use crate::traits::{Filter, Step};
use anyhow::{Context, Result};
use async_trait::async_trait;
use listing::{ExcludeFile, VacancyCollection, VacancyField};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Removes every vacancy whose ID appears in the exclude file.
///
/// Without a configured path the filter lets everything through. A missing
/// file counts as empty; an unreadable or malformed one fails the stage.
pub struct ExcludeFileFilter {
    file: Option<ExcludeFile>,
}

impl ExcludeFileFilter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            file: path.filter(|p| !p.as_os_str().is_empty()).map(ExcludeFile::new),
        }
    }
}

#[async_trait]
impl Filter for ExcludeFileFilter {
    fn name(&self) -> &str {
        "exclude_file"
    }

    async fn apply(
        &mut self,
        mut vacancies: VacancyCollection,
    ) -> Result<(VacancyCollection, Step)> {
        let initial = vacancies.len();
        let Some(file) = &self.file else {
            return Ok((vacancies, Step::unchanged(initial)));
        };

        let excluded = file.load().context("getting excluded vacancies from file")?;
        let removed = vacancies.exclude(VacancyField::Id, &excluded.ids());

        if !removed.is_empty() {
            info!(
                path = %file.path().display(),
                excluded_vacancies = ?removed,
                vacancies_left = vacancies.len(),
                "excluding vacancies based on exclude file"
            );
        }

        let step = Step::new(initial, vacancies.len());
        Ok((vacancies, step))
    }

    fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        if let Some(file) = &self.file {
            details.insert("path".to_string(), file.path().display().to_string());
        }
        details
    }
}
