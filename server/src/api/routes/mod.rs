//! API route handlers

pub mod agents;
pub mod health;
pub mod ingest;
