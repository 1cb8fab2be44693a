//! HTTP client for a running daemon's command API.

mod client;
mod error;

pub use client::{ApiClient, ApiRequest, API_PREFIX};
pub use error::ApiError;
