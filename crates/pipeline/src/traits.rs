//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! independently validated filters to be applied to a vacancy collection.

use anyhow::Result;
use async_trait::async_trait;
use listing::VacancyCollection;
use std::collections::BTreeMap;

/// Counts reported by one filter stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    pub initial: usize,
    pub dropped: usize,
    pub left: usize,
}

impl Step {
    pub fn new(initial: usize, left: usize) -> Self {
        Self {
            initial,
            dropped: initial.saturating_sub(left),
            left,
        }
    }

    /// Stage that let everything through.
    pub fn unchanged(count: usize) -> Self {
        Self::new(count, count)
    }
}

/// Runtime information about a filter, for status output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStatus {
    pub name: String,
    pub enabled: bool,
    pub reason: Option<String>,
    pub details: BTreeMap<String, String>,
}

/// Core trait for filtering vacancies.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - Filters take ownership of the collection and hand it back, so removal
///   never clones vacancies
/// - `validate` runs for every enabled filter before any `apply`; it may
///   cache derived configuration on the filter but must not touch shared
///   state
/// - `&mut self` on `apply` lets a filter keep per-run results (the AI
///   filter stores its assessments)
#[async_trait]
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging and status output)
    fn name(&self) -> &str;

    /// Check configuration and dependencies.
    fn validate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Apply this filter to the collection.
    ///
    /// # Returns
    /// * `Ok((collection, step))` - The remaining vacancies and the counts
    /// * `Err` - A collaborator failed; the run is aborted
    async fn apply(&mut self, vacancies: VacancyCollection) -> Result<(VacancyCollection, Step)>;

    /// Key/value details shown in status output.
    fn details(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Set when the filter was constructed in a disabled state.
    fn disabled_reason(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counts() {
        let step = Step::new(10, 7);
        assert_eq!(step.dropped, 3);
        assert_eq!(Step::unchanged(4), Step { initial: 4, dropped: 0, left: 4 });
    }
}
