use crate::core::models::atom::CachedLjParam;
use crate::core::models::merged::{EndStateAtom, MergedMolecule};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Perturbed molecule has no atoms")]
    EmptyMolecule,
}

fn lj_components(state: &EndStateAtom) -> (f64, f64) {
    match state.lj_param {
        CachedLjParam::LennardJones { sigma, epsilon } => (sigma, epsilon),
        CachedLjParam::None => (0.0, 0.0),
    }
}

fn type_label(state: &EndStateAtom) -> &str {
    if state.is_dummy() { "du" } else { &state.force_field_type }
}

/// Writes a SOMD perturbation file for a merged molecule.
///
/// Each atom block carries the type, charge, and Lennard-Jones parameters of
/// both end states; dummy end states get type `du` with zeroed interactions.
/// Lengths are in Angstroms and energies in kcal/mol, matching SOMD's input
/// conventions.
///
/// # Errors
///
/// Returns an error if the molecule is empty or writing fails.
pub fn write_merged(merged: &MergedMolecule, writer: &mut impl Write) -> Result<(), PertError> {
    if merged.atom_count() == 0 {
        return Err(PertError::EmptyMolecule);
    }

    writeln!(writer, "version 1")?;
    writeln!(writer, "molecule LIG")?;
    for atom in merged.atoms() {
        let (sigma_a, epsilon_a) = lj_components(&atom.state_a);
        let (sigma_b, epsilon_b) = lj_components(&atom.state_b);

        writeln!(writer, "    atom")?;
        writeln!(writer, "        name           {}", atom.name)?;
        writeln!(writer, "        initial_type   {}", type_label(&atom.state_a))?;
        writeln!(writer, "        final_type     {}", type_label(&atom.state_b))?;
        writeln!(
            writer,
            "        initial_charge {:.5}",
            atom.state_a.partial_charge
        )?;
        writeln!(
            writer,
            "        final_charge   {:.5}",
            atom.state_b.partial_charge
        )?;
        writeln!(
            writer,
            "        initial_LJ     {:.5} {:.5}",
            sigma_a, epsilon_a
        )?;
        writeln!(
            writer,
            "        final_LJ       {:.5} {:.5}",
            sigma_b, epsilon_b
        )?;
        writeln!(writer, "    endatom")?;
    }
    writeln!(writer, "endmolecule")?;
    Ok(())
}

/// Writes a perturbation file to a file path.
pub fn write_merged_to_path<P: AsRef<Path>>(
    merged: &MergedMolecule,
    path: P,
) -> Result<(), PertError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_merged(merged, &mut writer)
}
