use crate::core::forcefield::params::GlobalParams;
use crate::core::io::pdb::{self, PdbError, PdbFile};
use crate::core::io::top::{self, TopError};
use crate::core::io::traits::StructureFile;
use crate::core::models::merged::EndState;
use crate::core::models::molecule::Molecule;
use crate::core::models::system::{Solute, System};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerturbableError {
    #[error("System solute is not perturbable; merge two end states first")]
    NotPerturbable,
    #[error("PDB error: {0}")]
    Pdb(#[from] PdbError),
    #[error("Topology error: {0}")]
    Top(#[from] TopError),
}

/// File paths produced for one end state of a saved perturbable system.
#[derive(Debug, Clone, PartialEq)]
pub struct EndStateFiles {
    pub structure: PathBuf,
    pub topology: PathBuf,
}

fn end_state_suffix(end: EndState) -> &'static str {
    match end {
        EndState::A => "A",
        EndState::B => "B",
    }
}

/// Saves one end state of a perturbable system as a PDB/topology pair.
///
/// Dummy atoms of the other end state are excluded; waters and the periodic
/// box carry over unchanged.
pub fn save_end_state<P: AsRef<Path>>(
    system: &System,
    globals: &GlobalParams,
    end: EndState,
    directory: P,
    base_name: &str,
) -> Result<EndStateFiles, PerturbableError> {
    let merged = match &system.solute {
        Solute::Perturbable(merged) => merged,
        Solute::Molecule(_) => return Err(PerturbableError::NotPerturbable),
    };

    let directory = directory.as_ref();
    let suffix = end_state_suffix(end);
    let structure = directory.join(format!("{base_name}_{suffix}.pdb"));
    let topology = directory.join(format!("{base_name}_{suffix}.top"));

    let end_system = System {
        solute: Solute::Molecule(merged.end_state(end)),
        waters: system.waters.clone(),
        boundary: system.boundary.clone(),
    };

    pdb::write_system_to_path(&end_system, &structure)?;
    top::write_system_to_path(&end_system, globals, &topology)?;

    Ok(EndStateFiles {
        structure,
        topology,
    })
}

/// Saves both end states of a perturbable system, returning `(A, B)` paths.
pub fn save_perturbable<P: AsRef<Path>>(
    system: &System,
    globals: &GlobalParams,
    directory: P,
    base_name: &str,
) -> Result<(EndStateFiles, EndStateFiles), PerturbableError> {
    let directory = directory.as_ref();
    let a = save_end_state(system, globals, EndState::A, directory, base_name)?;
    let b = save_end_state(system, globals, EndState::B, directory, base_name)?;
    Ok((a, b))
}

/// Reads back one saved end-state structure.
pub fn load_end_state<P: AsRef<Path>>(path: P) -> Result<Molecule, PerturbableError> {
    let (molecule, _) = PdbFile::read_from_path(path)?;
    Ok(molecule)
}
