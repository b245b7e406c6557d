//! Filter to remove vacancies that require a test.
//!
//! The listing service does not accept applications to these without the
//! test being completed in the browser, so they can never be applied to here.

use crate::traits::{Filter, Step};
use anyhow::Result;
use async_trait::async_trait;
use listing::VacancyCollection;
use tracing::info;

pub struct WithTestFilter;

#[async_trait]
impl Filter for WithTestFilter {
    fn name(&self) -> &str {
        "with_test"
    }

    async fn apply(
        &mut self,
        mut vacancies: VacancyCollection,
    ) -> Result<(VacancyCollection, Step)> {
        let initial = vacancies.len();
        let excluded = vacancies.exclude_with_test();

        if !excluded.is_empty() {
            info!(
                excluded_vacancies = ?excluded,
                vacancies_left = vacancies.len(),
                "excluding vacancies with tests"
            );
        }

        let step = Step::new(initial, vacancies.len());
        Ok((vacancies, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing::Vacancy;

    #[tokio::test]
    async fn test_with_test_filter() {
        let vacancies = VacancyCollection::from(vec![
            Vacancy::new("100", "A").with_test(true),
            Vacancy::new("101", "B"),
            Vacancy::new("200", "C").with_test(true),
            Vacancy::new("300", "D"),
        ]);

        let (filtered, step) = WithTestFilter.apply(vacancies).await.unwrap();

        let mut ids = filtered.ids();
        ids.sort();
        assert_eq!(ids, vec!["101", "300"]);
        assert_eq!(step, Step { initial: 4, dropped: 2, left: 2 });
    }
}
