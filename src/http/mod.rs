//! HTTP client module for preflight checks
//!
//! Provides read-only HTTP access to the configured server.

mod client;

pub use client::{HttpClient, HttpError, HttpResponse};
