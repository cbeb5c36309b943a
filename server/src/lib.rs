//! Agent activity dashboard server
//!
//! - `core` - CLI, configuration, shutdown and the application entry point
//! - `data` - Span/evaluation records, repository traits and the in-memory store
//! - `domain` - Per-agent activity aggregation
//! - `api` - HTTP routes, extractors and error responses

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
