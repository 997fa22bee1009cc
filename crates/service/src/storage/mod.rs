//! Storage abstractions for service layer
//!
//! Contains the reusable file-backed document store that services persist
//! small JSON maps with.

pub mod json_doc_store;
