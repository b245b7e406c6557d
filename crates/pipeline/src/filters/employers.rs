//! Filter to remove vacancies from blocklisted employers.

use crate::traits::{Filter, Step};
use anyhow::{Result, bail};
use async_trait::async_trait;
use listing::{VacancyCollection, VacancyField};
use std::collections::BTreeMap;
use tracing::info;

/// Removes vacancies whose employer ID is on the configured blocklist.
///
/// ## Algorithm
/// `validate` normalizes the configured list once (trim, drop blanks,
/// dedupe) and caches it; `apply` removes every vacancy whose employer ID
/// matches. An empty blocklist lets everything through.
pub struct EmployersFilter {
    configured: Vec<String>,
    employers: Vec<String>,
}

impl EmployersFilter {
    pub fn new(employers: Vec<String>) -> Self {
        Self {
            configured: employers,
            employers: Vec::new(),
        }
    }
}

#[async_trait]
impl Filter for EmployersFilter {
    fn name(&self) -> &str {
        "employers"
    }

    fn validate(&mut self) -> Result<()> {
        let mut employers: Vec<String> = Vec::with_capacity(self.configured.len());
        for raw in &self.configured {
            let id = raw.trim();
            if id.is_empty() {
                continue;
            }
            if id.chars().any(char::is_whitespace) {
                bail!("employer id {id:?} contains whitespace");
            }
            if !employers.iter().any(|e| e == id) {
                employers.push(id.to_string());
            }
        }

        self.employers = employers;
        Ok(())
    }

    async fn apply(
        &mut self,
        mut vacancies: VacancyCollection,
    ) -> Result<(VacancyCollection, Step)> {
        let initial = vacancies.len();
        if self.employers.is_empty() {
            return Ok((vacancies, Step::unchanged(initial)));
        }

        let excluded = vacancies.exclude(VacancyField::EmployerId, &self.employers);
        if !excluded.is_empty() {
            info!(
                excluded_employers = ?self.employers,
                excluded_vacancies = ?excluded,
                vacancies_left = vacancies.len(),
                "excluding vacancies by employers"
            );
        }

        let step = Step::new(initial, vacancies.len());
        Ok((vacancies, step))
    }

    fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        let employers = if self.employers.is_empty() {
            &self.configured
        } else {
            &self.employers
        };
        if !employers.is_empty() {
            details.insert("employers".to_string(), employers.join(","));
        }
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing::Vacancy;

    fn vacancies() -> VacancyCollection {
        VacancyCollection::from(vec![
            Vacancy::new("1", "A").with_employer("10", "Acme"),
            Vacancy::new("2", "B").with_employer("20", "Globex"),
            Vacancy::new("3", "C").with_employer("10", "Acme"),
            Vacancy::new("4", "D").with_employer("", "Anonymous"),
        ])
    }

    #[tokio::test]
    async fn test_blocklisted_employers_are_removed() {
        let employers = vec![" 10 ".to_string(), "".to_string(), "10".to_string()];
        let mut filter = EmployersFilter::new(employers);
        filter.validate().unwrap();
        assert_eq!(filter.details()["employers"], "10");

        let (filtered, step) = filter.apply(vacancies()).await.unwrap();

        let mut ids = filtered.ids();
        ids.sort();
        assert_eq!(ids, vec!["2", "4"]);
        assert_eq!(step.dropped, 2);
    }

    #[tokio::test]
    async fn test_empty_blocklist_passes_everything() {
        let mut filter = EmployersFilter::new(vec!["  ".to_string()]);
        filter.validate().unwrap();

        let (filtered, step) = filter.apply(vacancies()).await.unwrap();

        assert_eq!(filtered.len(), 4);
        assert_eq!(step, Step::unchanged(4));
    }

    #[test]
    fn test_malformed_id_fails_validation() {
        let mut filter = EmployersFilter::new(vec!["10 20".to_string()]);
        assert!(filter.validate().is_err());
    }
}
