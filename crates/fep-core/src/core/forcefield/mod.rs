//! Force-field parameter tables and assignment.
//!
//! Parameters live in two local files: a TOML file with the global settings,
//! Lennard-Jones tables, and atom-typing rules, and a CSV table of fallback
//! partial charges per atom type. [`parameterization::Parameterizer`] applies
//! them to a loaded molecule in two passes.

pub mod parameterization;
pub mod params;
