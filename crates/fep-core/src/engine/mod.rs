//! Stateful stages of the alchemical setup pipeline.
//!
//! Each submodule implements one transformation of the pipeline: atom
//! mapping, alignment, dual-topology merging, solvation, and per-window
//! input generation. The stages are pure functions over the core data
//! model; orchestration lives in `workflows`.

pub mod align;
pub mod config;
pub mod error;
pub mod leg;
pub mod mapping;
pub mod merge;
pub mod progress;
pub mod solvate;
