//! Shared building blocks for the schema discovery workspace.
//!
//! - [`models`]: data source, schema and query models
//! - [`errors`]: the [`errors::AppError`] taxonomy
//! - [`config`]: environment-driven configuration
//! - [`response`]: the HTTP response envelope
//! - [`middleware`]: request-id tagging
//! - [`utils`]: identifier validation and model naming

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
