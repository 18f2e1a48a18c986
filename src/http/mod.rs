//! HTTP client module
//!
//! Thin wrapper over `reqwest` used by the holiday lookup.
//!
//! # Features
//!
//! - **Per-call timeout**: every request is bounded
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Optional Retries**: off by default, with constant/linear/exponential backoff

mod client;
mod rate_limit;

pub use client::{BackoffType, HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
