//! HTTP middleware and request extractors.
//!
//! - [`api_key`] - Optional `x-api-key` authentication for third-party callers
//! - [`owner`] - `X-Owner-Id` scoping key extraction
//! - [`cors`] - Open CORS policy for the embeddable `/shorten` endpoint
//! - [`tracing`] - Request/response spans

pub mod api_key;
pub mod cors;
pub mod owner;
pub mod tracing;
