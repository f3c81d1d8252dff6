//! Storage abstractions for service layer
//!
//! Reusable helpers for services that persist a single JSON document on disk.

pub mod json_document;
