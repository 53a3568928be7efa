//! # Core Module
//!
//! This module provides the fundamental building blocks for alchemical
//! free-energy setup in fepforge, serving as the stateless foundation of the
//! library.
//!
//! ## Overview
//!
//! The core module implements the data structures, parameter tables, and file
//! formats required to describe the molecules moving through the preparation
//! pipeline. It knows nothing about the pipeline itself; the stateful
//! operations live in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, molecules, atom
//!   mappings, dual-topology merged molecules, and solvated systems
//! - **Force Field** ([`forcefield`]) - Parameter tables and type/charge
//!   assignment
//! - **File I/O** ([`io`]) - PDB and MOL2 structure files plus engine input
//!   formats (GRO, TOP, SOMD pert)
//! - **Geometry** ([`utils`]) - Centroids, RMSD, and rigid-body superposition

pub mod forcefield;
pub mod io;
pub mod models;
pub mod utils;
