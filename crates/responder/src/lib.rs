//! Responder crate for the jobsift vacancy responder.
//!
//! This crate contains the orchestrator that coordinates a run: resume
//! selection, search, the filter pipeline, applying and manual exclusion.
//! It also wires the AI matcher from configuration.

pub mod assistant;
pub mod orchestrator;

pub use assistant::{API_KEY_ENV_VARS, build_matcher, resolve_api_key};
pub use orchestrator::{
    DEFAULT_FALLBACK_MESSAGE, Responder, ResponderError, RunOptions, RunReport, choose_message,
    dump_to_file,
};
