//! The working set of vacancies that flows through the filter pipeline.
//!
//! ## Removal semantics
//! Removal swaps the victim with the last element and truncates
//! (`Vec::swap_remove`), so it is O(1) per removed item but does **not**
//! preserve order. Nothing downstream relies on the order of the collection.
//! If a future consumer needs stable order, switch to marking indices and
//! compacting once at the end.

use crate::types::{Vacancy, VacancyId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Field used as the key for set-like removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyField {
    Id,
    EmployerId,
}

impl VacancyField {
    fn key<'a>(&self, vacancy: &'a Vacancy) -> &'a str {
        match self {
            VacancyField::Id => &vacancy.id,
            VacancyField::EmployerId => &vacancy.employer.id,
        }
    }
}

/// An owned list of vacancies with keyed removal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyCollection {
    items: Vec<Vacancy>,
}

impl VacancyCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vacancy> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Vacancy] {
        &self.items
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Vacancy> {
        self.items.iter().find(|v| v.id == id)
    }

    pub fn ids(&self) -> Vec<VacancyId> {
        self.items.iter().map(|v| v.id.clone()).collect()
    }

    /// Remove every vacancy whose `field` equals one of `targets`.
    ///
    /// Empty targets never match, so anonymous employers (empty ID) are not
    /// swept up by an accidental blank entry in a blocklist.
    ///
    /// Returns the IDs of the removed vacancies.
    pub fn exclude<S: AsRef<str>>(&mut self, field: VacancyField, targets: &[S]) -> Vec<VacancyId> {
        let targets: HashSet<&str> = targets
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() {
            return Vec::new();
        }

        self.remove_where(|vacancy| targets.contains(field.key(vacancy)))
    }

    /// Remove every vacancy that requires a test before applying.
    pub fn exclude_with_test(&mut self) -> Vec<VacancyId> {
        self.remove_where(|vacancy| vacancy.has_test)
    }

    fn remove_where<F>(&mut self, mut predicate: F) -> Vec<VacancyId>
    where
        F: FnMut(&Vacancy) -> bool,
    {
        let mut removed = Vec::new();
        let mut idx = 0;
        while idx < self.items.len() {
            if predicate(&self.items[idx]) {
                // The former last element now sits at `idx` and is checked next.
                let vacancy = self.items.swap_remove(idx);
                removed.push(vacancy.id);
            } else {
                idx += 1;
            }
        }
        removed
    }

    /// Group vacancies by `"<employer name> (<employer id>)"` for display.
    pub fn report_by_employer(&self) -> BTreeMap<String, Vec<BTreeMap<&'static str, String>>> {
        let mut report: BTreeMap<String, Vec<BTreeMap<&'static str, String>>> = BTreeMap::new();

        for vacancy in &self.items {
            let key = format!("{} ({})", vacancy.employer.name, vacancy.employer.id);

            let mut entry = BTreeMap::new();
            entry.insert("name", vacancy.name.clone());
            entry.insert("url", vacancy.alternate_url.clone());
            entry.insert("area", vacancy.area.name.clone());
            entry.insert(
                "salary",
                vacancy.salary.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            );
            entry.insert("brief requirement", vacancy.snippet.requirement.clone());
            entry.insert("brief responsibility", vacancy.snippet.responsibility.clone());

            if let Some(ai) = &vacancy.ai {
                if ai.is_error() {
                    entry.insert("ai_error", ai.error.clone());
                } else {
                    entry.insert("ai_fit", ai.fit.to_string());
                    entry.insert("ai_score", format!("{:.2}", ai.score));
                    if !ai.reason.is_empty() {
                        entry.insert("ai_reason", ai.reason.clone());
                    }
                    if !ai.message.is_empty() {
                        entry.insert("ai_message", ai.message.clone());
                    }
                }
            }

            report.entry(key).or_default().push(entry);
        }

        report
    }

    pub fn into_vec(self) -> Vec<Vacancy> {
        self.items
    }
}

impl From<Vec<Vacancy>> for VacancyCollection {
    fn from(items: Vec<Vacancy>) -> Self {
        Self { items }
    }
}

impl FromIterator<Vacancy> for VacancyCollection {
    fn from_iter<I: IntoIterator<Item = Vacancy>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for VacancyCollection {
    type Item = Vacancy;
    type IntoIter = std::vec::IntoIter<Vacancy>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a VacancyCollection {
    type Item = &'a Vacancy;
    type IntoIter = std::slice::Iter<'a, Vacancy>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AiAssessment;

    fn sample() -> VacancyCollection {
        VacancyCollection::from(vec![
            Vacancy::new("1", "Backend").with_employer("10", "Acme"),
            Vacancy::new("2", "Frontend").with_employer("20", "Globex").with_test(true),
            Vacancy::new("3", "Platform").with_employer("10", "Acme"),
            Vacancy::new("4", "SRE").with_employer("", "Anonymous"),
            Vacancy::new("5", "QA").with_employer("30", "Initech").with_test(true),
        ])
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[test]
    fn test_exclude_by_id() {
        let mut vacancies = sample();
        let removed = vacancies.exclude(VacancyField::Id, &["2", "4", "missing"]);

        assert_eq!(sorted(removed), vec!["2", "4"]);
        assert_eq!(vacancies.len(), 3);
        assert!(vacancies.find_by_id("2").is_none());
        assert!(vacancies.find_by_id("1").is_some());
    }

    #[test]
    fn test_exclude_by_employer_removes_every_match() {
        let mut vacancies = sample();
        let removed = vacancies.exclude(VacancyField::EmployerId, &["10"]);

        assert_eq!(sorted(removed), vec!["1", "3"]);
        assert_eq!(sorted(vacancies.ids()), vec!["2", "4", "5"]);
    }

    #[test]
    fn test_empty_target_never_matches_anonymous_employer() {
        let mut vacancies = sample();
        let removed = vacancies.exclude(VacancyField::EmployerId, &[""]);

        assert!(removed.is_empty());
        assert_eq!(vacancies.len(), 5);
    }

    #[test]
    fn test_exclude_with_test_removes_all_flagged() {
        let mut vacancies = sample();
        let removed = vacancies.exclude_with_test();

        assert_eq!(sorted(removed), vec!["2", "5"]);
        assert!(vacancies.iter().all(|v| !v.has_test));
    }

    #[test]
    fn test_adjacent_matches_after_swap() {
        // After swap_remove the last element lands on the current index and
        // must be checked too.
        let mut vacancies = VacancyCollection::from(vec![
            Vacancy::new("a", "").with_test(true),
            Vacancy::new("b", ""),
            Vacancy::new("c", "").with_test(true),
        ]);

        let removed = vacancies.exclude_with_test();
        assert_eq!(sorted(removed), vec!["a", "c"]);
        assert_eq!(vacancies.ids(), vec!["b"]);
    }

    #[test]
    fn test_report_by_employer() {
        let mut vacancies = sample();
        vacancies.exclude(VacancyField::Id, &["4", "5"]);
        let mut items = vacancies.into_vec();
        items[0].ai = Some(AiAssessment {
            fit: true,
            score: 0.87,
            reason: "Strong Rust".to_string(),
            ..AiAssessment::default()
        });
        let vacancies = VacancyCollection::from(items);

        let report = vacancies.report_by_employer();

        assert_eq!(report.len(), 2);
        assert_eq!(report["Acme (10)"].len(), 2);
        let with_ai = report
            .values()
            .flatten()
            .find(|entry| entry.contains_key("ai_score"))
            .unwrap();
        assert_eq!(with_ai["ai_score"], "0.87");
        assert_eq!(with_ai["ai_reason"], "Strong Rust");
    }
}
