//! High-level orchestration of the engine stages into complete pipelines.

pub mod setup;
