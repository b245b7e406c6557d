//! # Listing Crate
//!
//! Everything that touches the job listing service (hh.ru) and the local
//! exclude file.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Vacancy, Employer, Salary, AiAssessment, Resume)
//! - **collection**: `VacancyCollection`, the working set with keyed removal
//! - **client**: The `ListingClient` trait and search parameters
//! - **headhunter**: `HeadhunterClient`, the reqwest implementation
//! - **exclude**: The persistent exclude file
//! - **error**: Error types for this crate
//!
//! ## Example Usage
//!
//! ```ignore
//! use listing::{HeadhunterClient, ListingClient, SearchParams, VacancyField};
//!
//! let client = HeadhunterClient::new(token)?;
//! let mut vacancies = client.search(&SearchParams {
//!     text: "rust".into(),
//!     ..Default::default()
//! }).await?;
//!
//! let applied = client.negotiated_vacancy_ids().await?;
//! vacancies.exclude(VacancyField::Id, &applied);
//! ```

pub mod client;
pub mod collection;
pub mod error;
pub mod exclude;
pub mod headhunter;
pub mod types;

pub use client::{ListingClient, SearchParams};
pub use collection::{VacancyCollection, VacancyField};
pub use error::{ListingError, Result};
pub use exclude::{
    EXCLUDE_REASON_AI_FALLBACK, EXCLUDE_REASON_MANUAL, ExcludeActor, ExcludeFile, ExcludedVacancies,
    ExcludedVacancy,
};
pub use headhunter::HeadhunterClient;
pub use types::{
    AiAssessment, Employer, EmployerId, KeySkill, Named, Negotiation, Resume, Salary, Snippet,
    Vacancy, VacancyId,
};
