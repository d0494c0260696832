//! Logging setup for crocload
//!
//! Everything in the workspace logs through `tracing`; this crate installs
//! the global subscriber from the logging configuration domain.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
