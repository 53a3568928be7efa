//! # fepforge Core Library
//!
//! A library for preparing alchemical free-energy perturbation (FEP) inputs:
//! given two ligand structures, it parametrizes them, computes a maximum
//! common substructure atom mapping, aligns one onto the other, builds a
//! dual-topology perturbable molecule, solvates it in an explicit water box,
//! and writes per-lambda-window input files for a simulation engine
//! (SOMD or GROMACS).
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`Molecule`, `AtomMapping`, `MergedMolecule`, `System`), force-field
//!   parameter tables and assignment, structure file I/O, and geometry
//!   utilities.
//!
//! - **[`engine`]: The Logic Core.** This layer implements the preparation
//!   operations: the bounded common-substructure search (`mapping`),
//!   rigid-body superposition (`align`), dual-topology merging (`merge`),
//!   water-box construction (`solvate`), simulation protocols (`config`),
//!   and per-window input generation (`leg`).
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together into the complete setup
//!   pipeline, from a pair of structure files to a directory of ready-to-run
//!   lambda windows.

pub mod core;
pub mod engine;
pub mod workflows;
