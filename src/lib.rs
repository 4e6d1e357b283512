#![deny(missing_docs)]

//! Core library for the MCQ document ingestion pipeline.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text extraction boundary and adapters.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Chunking, embedding orchestration, and the ingestion pipeline.
pub mod pipeline;
/// Learning-profile description generation.
pub mod profile;
/// Qdrant vector store integration.
pub mod qdrant;
