//! Persistent list of vacancies that must never resurface.
//!
//! The file is plain JSON, `{"Items": [...]}`, with the field names used by
//! earlier versions of the tool so existing exclude files keep working.
//! A missing or empty file is an empty list, not an error.
//!
//! Updates are read-append-rewrite. Two runs writing the same file at once
//! can lose entries; only one run at a time is supported.

use crate::error::{ListingError, Result};
use crate::types::{Vacancy, VacancyId, null_as_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reason recorded when the AI rejected a vacancy without explaining why
pub const EXCLUDE_REASON_AI_FALLBACK: &str = "ai_rejected";
/// Reason recorded when the operator excluded vacancies by hand
pub const EXCLUDE_REASON_MANUAL: &str = "manual_apply";

/// Who decided a vacancy should be excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeActor {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "Human")]
    Human,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedVacancy {
    #[serde(rename = "ID")]
    pub id: VacancyId,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "EmployerName", default)]
    pub employer_name: String,
    #[serde(rename = "ExcludedAt")]
    pub excluded_at: DateTime<Utc>,
    #[serde(rename = "Actor")]
    pub actor: ExcludeActor,
    #[serde(rename = "Reason", default)]
    pub reason: String,
}

impl ExcludedVacancy {
    /// Build an entry for `vacancy`, stamped with the current time.
    ///
    /// For [`ExcludeActor::Ai`] the reason comes from the attached assessment
    /// (falling back to [`EXCLUDE_REASON_AI_FALLBACK`]); `reason` is used for
    /// human exclusions.
    pub fn from_vacancy(vacancy: &Vacancy, actor: ExcludeActor, reason: &str) -> Self {
        let reason = match actor {
            ExcludeActor::Ai => vacancy
                .ai
                .as_ref()
                .map(|ai| ai.reason.trim())
                .filter(|r| !r.is_empty())
                .unwrap_or(EXCLUDE_REASON_AI_FALLBACK),
            ExcludeActor::Human => reason,
        };

        Self {
            id: vacancy.id.clone(),
            url: vacancy.alternate_url.clone(),
            employer_name: vacancy.employer.name.clone(),
            excluded_at: Utc::now(),
            actor,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludedVacancies {
    #[serde(rename = "Items", default, deserialize_with = "null_as_default")]
    pub items: Vec<ExcludedVacancy>,
}

impl ExcludedVacancies {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<VacancyId> {
        self.items.iter().map(|v| v.id.clone()).collect()
    }

    pub fn append(&mut self, entries: impl IntoIterator<Item = ExcludedVacancy>) {
        self.items.extend(entries);
    }
}

/// Handle to an exclude file on disk.
#[derive(Debug, Clone)]
pub struct ExcludeFile {
    path: PathBuf,
}

impl ExcludeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current list. Missing and empty files yield an empty list.
    pub fn load(&self) -> Result<ExcludedVacancies> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ExcludedVacancies::default()),
            Err(source) => {
                return Err(ListingError::ExcludeFileIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(ExcludedVacancies::default());
        }

        serde_json::from_str(&content).map_err(|source| ListingError::ExcludeFileFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with `excluded`.
    pub fn save(&self, excluded: &ExcludedVacancies) -> Result<()> {
        let json = serde_json::to_string_pretty(excluded).map_err(|source| {
            ListingError::ExcludeFileFormat {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json + "\n").map_err(|source| ListingError::ExcludeFileIo {
            path: self.path.clone(),
            source,
        })
    }

    /// Load, append `entries` and write the result back.
    ///
    /// Returns the number of entries in the file afterwards.
    pub fn append(&self, entries: impl IntoIterator<Item = ExcludedVacancy>) -> Result<usize> {
        let mut excluded = self.load()?;
        excluded.append(entries);
        self.save(&excluded)?;
        Ok(excluded.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AiAssessment;

    fn rejected(id: &str, reason: &str) -> Vacancy {
        let mut vacancy = Vacancy::new(id, "Engineer").with_employer("7", "Acme");
        vacancy.alternate_url = format!("https://hh.ru/vacancy/{id}");
        vacancy.ai = Some(AiAssessment {
            fit: false,
            score: 0.2,
            reason: reason.to_string(),
            ..AiAssessment::default()
        });
        vacancy
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = ExcludeFile::new(dir.path().join("absent.json"));

        let excluded = file.load().unwrap();
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, "").unwrap();

        let excluded = ExcludeFile::new(&path).load().unwrap();
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = ExcludeFile::new(&path).load().unwrap_err();
        assert!(matches!(err, ListingError::ExcludeFileFormat { .. }));
    }

    #[test]
    fn test_append_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = ExcludeFile::new(dir.path().join("excluded.json"));

        let ai_entries: Vec<ExcludedVacancy> = (1..=3)
            .map(|i| rejected(&i.to_string(), "too junior"))
            .map(|v| ExcludedVacancy::from_vacancy(&v, ExcludeActor::Ai, ""))
            .collect();
        assert_eq!(file.append(ai_entries).unwrap(), 3);

        let human = ExcludedVacancy::from_vacancy(
            &Vacancy::new("42", "Manager"),
            ExcludeActor::Human,
            EXCLUDE_REASON_MANUAL,
        );
        assert_eq!(file.append([human]).unwrap(), 4);

        let reloaded = file.load().unwrap();
        assert_eq!(reloaded.ids(), vec!["1", "2", "3", "42"]);
        assert!(reloaded.items[..3]
            .iter()
            .all(|e| e.actor == ExcludeActor::Ai && e.reason == "too junior"));
        assert_eq!(reloaded.items[3].actor, ExcludeActor::Human);
        assert_eq!(reloaded.items[3].reason, EXCLUDE_REASON_MANUAL);
    }

    #[test]
    fn test_save_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = ExcludeFile::new(dir.path().join("excluded.json"));

        let entries = (0..20)
            .map(|i| rejected(&i.to_string(), "long reason text"))
            .map(|v| ExcludedVacancy::from_vacancy(&v, ExcludeActor::Ai, ""));
        file.append(entries).unwrap();
        file.save(&ExcludedVacancies::default()).unwrap();

        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_ai_reason_falls_back_when_blank() {
        let entry =
            ExcludedVacancy::from_vacancy(&rejected("9", "   "), ExcludeActor::Ai, "ignored");
        assert_eq!(entry.reason, EXCLUDE_REASON_AI_FALLBACK);
        assert_eq!(entry.url, "https://hh.ru/vacancy/9");
        assert_eq!(entry.employer_name, "Acme");
    }

    #[test]
    fn test_reads_legacy_layout() {
        let json = r#"{"Items":[{"ID":"100","URL":"https://hh.ru/vacancy/100",
            "EmployerName":"Acme","ExcludedAt":"2024-05-01T10:00:00Z",
            "Actor":"Human","Reason":"manual_apply"}]}"#;
        let excluded: ExcludedVacancies = serde_json::from_str(json).unwrap();
        assert_eq!(excluded.ids(), vec!["100"]);
        assert_eq!(excluded.items[0].actor, ExcludeActor::Human);
    }

    #[test]
    fn test_null_items_are_empty() {
        let excluded: ExcludedVacancies = serde_json::from_str(r#"{"Items":null}"#).unwrap();
        assert!(excluded.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nil.json");
        fs::write(&path, r#"{"Items":null}"#).unwrap();
        assert!(ExcludeFile::new(&path).load().unwrap().is_empty());
    }
}
