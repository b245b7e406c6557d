//! Filter implementations for the vacancy pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline. The responder composes them
//! in this order: with_test, applied_history, employers, exclude_file, ai_fit.

pub mod ai_fit;
pub mod applied_history;
pub mod employers;
pub mod exclude_file;
pub mod with_test;

// Re-export for convenience
pub use ai_fit::{AiFitFilter, AiSettings, is_supported_provider};
pub use applied_history::AppliedHistoryFilter;
pub use employers::EmployersFilter;
pub use exclude_file::ExcludeFileFilter;
pub use with_test::WithTestFilter;
