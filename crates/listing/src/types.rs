//! Core domain types for vacancies returned by the listing service.
//!
//! The shapes follow the hh.ru JSON API closely enough to deserialize its
//! payloads directly. The service is liberal with `null`, so every nested
//! object tolerates both a missing key and an explicit `null`.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a vacancy as assigned by the listing service
pub type VacancyId = String;

/// Identifier of an employer as assigned by the listing service
pub type EmployerId = String;

/// Deserialize `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Vacancy
// =============================================================================

/// A single job posting.
///
/// Search results carry only part of these fields; the detailed record
/// fetched by ID fills in `description` and `key_skills`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    #[serde(default)]
    pub id: VacancyId,
    /// Title of the posting
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub employer: Employer,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: Named,
    pub salary: Option<Salary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: Named,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Named,
    #[serde(default, deserialize_with = "null_as_default")]
    pub employment: Named,
    /// The employer requires a test before an application is accepted
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_test: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,
    /// Public URL of the posting
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternate_url: String,
    /// Full HTML description (detailed record only)
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippet: Snippet,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_skills: Vec<KeySkill>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,
    /// Assessment attached by the AI fit filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiAssessment>,
}

impl Vacancy {
    /// Convenience constructor used by tests and fakes.
    pub fn new(id: impl Into<VacancyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the employer.
    pub fn with_employer(mut self, id: impl Into<EmployerId>, name: impl Into<String>) -> Self {
        self.employer = Employer {
            id: id.into(),
            name: name.into(),
            ..Employer::default()
        };
        self
    }

    /// Builder-style setter for the "requires test" flag.
    pub fn with_test(mut self, has_test: bool) -> Self {
        self.has_test = has_test;
        self
    }
}

/// Generic `{id, name}` dictionary entry (area, schedule, experience, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    /// Empty for anonymous employers
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: EmployerId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternate_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trusted: bool,
}

/// Salary range; either bound may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    pub from: Option<u64>,
    pub to: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gross: bool,
}

impl std::fmt::Display for Salary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        write!(f, "{}-{} {}", bound(self.from), bound(self.to), self.currency)
    }
}

/// Short highlighted fragments returned with search results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirement: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibility: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySkill {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

// =============================================================================
// AI assessment
// =============================================================================

/// Result of the AI fit evaluation, attached to a vacancy.
///
/// When the evaluation itself failed only `error` is populated and the
/// vacancy is kept for the operator to review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAssessment {
    pub fit: bool,
    pub score: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl AiAssessment {
    /// Assessment recording only an evaluation failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

// =============================================================================
// Resumes and negotiations
// =============================================================================

/// One of the operator's own resumes (summary as listed by the service)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// A previously submitted application
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Negotiation {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    pub vacancy: Option<NegotiationVacancy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NegotiationVacancy {
    #[serde(default)]
    pub id: VacancyId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacancy_tolerates_nulls() {
        let json = r#"{
            "id": "93353083",
            "name": "Rust developer",
            "area": {"id": "1", "name": "Moscow"},
            "salary": null,
            "schedule": null,
            "employer": {"id": null, "name": "Anonymous"},
            "has_test": true,
            "snippet": {"requirement": null, "responsibility": "Write code"},
            "key_skills": null,
            "alternate_url": "https://hh.ru/vacancy/93353083"
        }"#;

        let vacancy: Vacancy = serde_json::from_str(json).unwrap();

        assert_eq!(vacancy.id, "93353083");
        assert!(vacancy.has_test);
        assert!(vacancy.salary.is_none());
        assert_eq!(vacancy.schedule, Named::default());
        assert_eq!(vacancy.employer.id, "");
        assert_eq!(vacancy.employer.name, "Anonymous");
        assert_eq!(vacancy.snippet.responsibility, "Write code");
        assert!(vacancy.key_skills.is_empty());
        assert!(vacancy.ai.is_none());
    }

    #[test]
    fn test_salary_display() {
        let salary = Salary {
            from: Some(200_000),
            to: None,
            currency: "RUR".to_string(),
            gross: false,
        };
        assert_eq!(salary.to_string(), "200000- RUR");
    }

    #[test]
    fn test_ai_assessment_skipped_when_absent() {
        let vacancy = Vacancy::new("1", "Engineer");
        let json = serde_json::to_value(&vacancy).unwrap();
        assert!(json.get("ai").is_none());
    }

    #[test]
    fn test_failed_assessment() {
        let assessment = AiAssessment::failed("boom");
        assert!(assessment.is_error());
        assert!(!assessment.fit);
        assert_eq!(assessment.score, 0.0);
    }
}
