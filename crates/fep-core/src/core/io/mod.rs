//! Provides input/output functionality for molecular file formats.
//!
//! Structure files (PDB, MOL2) are read through the unified
//! [`traits::StructureFile`] interface. The engine-input formats written by
//! the leg generator, GROMACS coordinates and topologies ([`gro`], [`top`])
//! and SOMD perturbation files ([`pert`]), are write-oriented and live in
//! their own modules, as does the perturbable-system save/read pair
//! ([`perturbable`]).

pub mod gro;
pub mod mol2;
pub mod pdb;
pub mod pert;
pub mod perturbable;
pub mod top;
pub mod traits;

use crate::core::models::molecule::Molecule;
use std::path::Path;
use thiserror::Error;
use traits::StructureFile;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported structure file extension for '{path}' (expected .pdb or .mol2)")]
    UnsupportedExtension { path: String },
    #[error("Failed to read PDB file: {0}")]
    Pdb(#[from] pdb::PdbError),
    #[error("Failed to read MOL2 file: {0}")]
    Mol2(#[from] mol2::Mol2Error),
}

/// Loads a molecule from a structure file, dispatching on the extension.
///
/// # Errors
///
/// Returns an error for unknown extensions or any format-level parse failure.
pub fn load_molecule<P: AsRef<Path>>(path: P) -> Result<Molecule, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdb") => Ok(pdb::PdbFile::read_from_path(path)?.0),
        Some("mol2") => Ok(mol2::Mol2File::read_from_path(path)?.0),
        _ => Err(LoadError::UnsupportedExtension {
            path: path.to_string_lossy().to_string(),
        }),
    }
}
