//! HTTP client functionality for crocload
//!
//! This crate provides the request/response model the scenario speaks, a
//! reqwest-backed client with per-request timing, concurrent batch dispatch,
//! and an offline mode answering from registered mocks.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpClient, HttpManager, MockResponse};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{HttpMethod, HttpMethodError, HttpRequest, HttpResponse, RequestBody, NAME_TAG};
