//! Core business logic - persistence and collaborator orchestration around the engine.

/// Plan (parent document) operations
pub mod plan;
/// Fuel price lookup collaborator
pub mod pricing;
/// Cost record persistence and commit orchestration
pub mod record;
/// Consolidated plan report
pub mod report;
