#![deny(missing_docs)]

//! Core library of the SOP indexer: turns service-standard PDFs into structured records.

/// Environment-driven configuration management.
pub mod config;
/// Page layout extraction contract and the layout sidecar reader.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Title detection, table attribution, accumulation and record assembly.
pub mod pipeline;
/// Record stores: SQLite and in-memory.
pub mod store;
