//! Pipeline for filtering vacancy search results before applying.
//!
//! This crate provides:
//! - Filter trait and implementations for vacancy filtering
//! - FilterPipeline for composing filters, with per-stage counts and status
//!
//! ## Architecture
//! The pipeline processes vacancies in stages:
//! 1. Every enabled filter validates its configuration; any failure aborts
//!    the run before a single filter is applied
//! 2. Filters are applied in order, each handing the remaining collection
//!    to the next
//! 3. Disabled filters are skipped but still reported
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::FilterPipeline;
//! use pipeline::filters::*;
//!
//! let mut pipeline = FilterPipeline::new()
//!     .add_filter(WithTestFilter)
//!     .add_filter(AppliedHistoryFilter::new(client.clone(), false))
//!     .add_filter(EmployersFilter::new(blocklist))
//!     .add_filter(ExcludeFileFilter::new(exclude_path));
//!
//! let outcome = pipeline.run(vacancies).await?;
//! for report in &outcome.steps {
//!     println!("{}: {} -> {}", report.filter, report.step.initial, report.step.left);
//! }
//! ```

pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use error::PipelineError;
pub use filter_pipeline::{FilterPipeline, PipelineOutcome, StepReport};
pub use traits::{Filter, FilterStatus, Step};
