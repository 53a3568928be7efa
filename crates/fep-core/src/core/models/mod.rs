//! # Core Models Module
//!
//! This module contains the data structures used to represent molecules as
//! they move through the free-energy preparation pipeline.
//!
//! ## Key Components
//!
//! - [`element`] - Chemical elements with symbol and mass tables
//! - [`atom`] - Individual atom representation with coordinates, types, and
//!   cached parameters
//! - [`molecule`] - A bonded collection of atoms with stable file-order
//!   indices
//! - [`mapping`] - The injective atom-index correspondence between two
//!   molecules
//! - [`merged`] - The dual-topology perturbable molecule holding both end
//!   states
//! - [`system`] - A solute plus explicit solvent inside a periodic box
//! - [`ids`] - Unique identifier types for atoms
//!
//! ## Usage
//!
//! Most pipeline operations start from a [`molecule::Molecule`] loaded via
//! [`crate::core::io`] and end with a [`system::System`] handed to the
//! engine-input writers.
//!
//! ```ignore
//! use fepforge::core::models::{element::Element, molecule::Molecule};
//! use nalgebra::Point3;
//!
//! let mut mol = Molecule::new("ethane");
//! let c1 = mol.add_atom("C1", Element::C, Point3::origin());
//! let c2 = mol.add_atom("C2", Element::C, Point3::new(1.54, 0.0, 0.0));
//! mol.add_bond(c1, c2, BondOrder::Single);
//! ```

pub mod atom;
pub mod element;
pub mod ids;
pub mod mapping;
pub mod merged;
pub mod molecule;
pub mod system;
