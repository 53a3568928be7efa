use crate::core::forcefield::params::GlobalParams;
use crate::core::models::atom::CachedLjParam;
use crate::core::models::merged::{EndState, MergedMolecule};
use crate::core::models::molecule::Molecule;
use crate::core::models::system::{Solute, System};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const KJ_PER_KCAL: f64 = 4.184;
const NM_PER_ANGSTROM: f64 = 0.1;

// TIP3P water (Jorgensen 1983).
const TIP3P_O_SIGMA: f64 = 3.15061;
const TIP3P_O_EPSILON: f64 = 0.1521;
const TIP3P_O_CHARGE: f64 = -0.834;
const TIP3P_H_CHARGE: f64 = 0.417;
const TIP3P_OH_NM: f64 = 0.09572;
const TIP3P_HH_NM: f64 = 0.15139;

#[derive(Debug, Error)]
pub enum TopError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Atom '{atom_name}' carries no force-field parameters; parametrize before writing")]
    Unparameterized { atom_name: String },
}

fn lj_nm_kj(lj: CachedLjParam) -> (f64, f64) {
    match lj {
        CachedLjParam::LennardJones { sigma, epsilon } => {
            (sigma * NM_PER_ANGSTROM, epsilon * KJ_PER_KCAL)
        }
        CachedLjParam::None => (0.0, 0.0),
    }
}

/// Unique atom types referenced by the solute, in deterministic order.
fn collect_atom_types(system: &System) -> Result<BTreeMap<String, (f64, f64, f64)>, TopError> {
    let mut types: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();

    let mut record = |ff_type: &str, mass: f64, lj: CachedLjParam, atom_name: &str| {
        if ff_type.is_empty() {
            return Err(TopError::Unparameterized {
                atom_name: atom_name.to_string(),
            });
        }
        let (sigma, epsilon) = lj_nm_kj(lj);
        types
            .entry(ff_type.to_string())
            .or_insert((mass, sigma, epsilon));
        Ok(())
    };

    match &system.solute {
        Solute::Molecule(mol) => {
            for (_, _, atom) in mol.atoms_iter() {
                if atom.lj_param == CachedLjParam::None {
                    return Err(TopError::Unparameterized {
                        atom_name: atom.name.clone(),
                    });
                }
                record(&atom.force_field_type, atom.mass, atom.lj_param, &atom.name)?;
            }
        }
        Solute::Perturbable(merged) => {
            for atom in merged.atoms() {
                for end in [EndState::A, EndState::B] {
                    let state = atom.state(end);
                    record(
                        &state.force_field_type,
                        atom.io_mass(),
                        state.lj_param,
                        &atom.name,
                    )?;
                }
            }
        }
    }
    Ok(types)
}

fn write_molecule_atoms(
    writer: &mut impl Write,
    molecule: &Molecule,
    residue_name: &str,
) -> Result<(), TopError> {
    for (index, _, atom) in molecule.atoms_iter() {
        writeln!(
            writer,
            "{:>6} {:>10} {:>6} {:>6} {:>6} {:>6} {:>10.6} {:>10.5}",
            index + 1,
            atom.force_field_type,
            1,
            residue_name,
            atom.name,
            index + 1,
            atom.partial_charge,
            atom.mass,
        )?;
    }
    Ok(())
}

fn write_perturbable_atoms(
    writer: &mut impl Write,
    merged: &MergedMolecule,
    residue_name: &str,
) -> Result<(), TopError> {
    for (index, atom) in merged.atoms().iter().enumerate() {
        writeln!(
            writer,
            "{:>6} {:>10} {:>6} {:>6} {:>6} {:>6} {:>10.6} {:>10.5} {:>10} {:>10.6} {:>10.5}",
            index + 1,
            atom.state_a.force_field_type,
            1,
            residue_name,
            atom.name,
            index + 1,
            atom.state_a.partial_charge,
            atom.io_mass(),
            atom.state_b.force_field_type,
            atom.state_b.partial_charge,
            atom.io_mass(),
        )?;
    }
    Ok(())
}

/// Writes a GROMACS topology for a (possibly solvated) system.
///
/// Perturbable solutes get B-state type/charge/mass columns in `[atoms]`.
/// Bonded interactions are written as connectivity (`funct 1`) only; bonded
/// parameters come from the engine's own tables. Waters are written as a
/// rigid TIP3P `SOL` molecule with a `[settles]` block.
///
/// # Errors
///
/// Returns an error if any solute atom is unparametrized or writing fails.
pub fn write_system(
    system: &System,
    globals: &GlobalParams,
    writer: &mut impl Write,
) -> Result<(), TopError> {
    let combining_rule = match globals.combining_rule.as_str() {
        "geometric" => 3,
        _ => 2, // lorentz-berthelot
    };

    writeln!(writer, "; Generated by fepforge ({})", globals.name)?;
    writeln!(writer, "[ defaults ]")?;
    writeln!(writer, "; nbfunc comb-rule gen-pairs fudgeLJ fudgeQQ")?;
    writeln!(
        writer,
        "{:>6} {:>9} {:>9} {:>7.4} {:>7.4}",
        1, combining_rule, "yes", globals.fudge_lj, globals.fudge_qq
    )?;
    writeln!(writer)?;

    writeln!(writer, "[ atomtypes ]")?;
    writeln!(writer, "; name     mass   charge  ptype    sigma      epsilon")?;
    for (ff_type, (mass, sigma, epsilon)) in collect_atom_types(system)? {
        writeln!(
            writer,
            "{:>6} {:>9.5} {:>8.4} {:>6} {:>12.6} {:>12.6}",
            ff_type, mass, 0.0, "A", sigma, epsilon
        )?;
    }
    if system.is_solvated() {
        writeln!(
            writer,
            "{:>6} {:>9.5} {:>8.4} {:>6} {:>12.6} {:>12.6}",
            "OW",
            15.9994,
            0.0,
            "A",
            TIP3P_O_SIGMA * NM_PER_ANGSTROM,
            TIP3P_O_EPSILON * KJ_PER_KCAL
        )?;
        writeln!(
            writer,
            "{:>6} {:>9.5} {:>8.4} {:>6} {:>12.6} {:>12.6}",
            "HW", 1.008, 0.0, "A", 0.0, 0.0
        )?;
    }
    writeln!(writer)?;

    let residue_name = {
        let name = system.solute.name();
        if name.len() == 3 {
            name.to_ascii_uppercase()
        } else {
            "LIG".to_string()
        }
    };

    writeln!(writer, "[ moleculetype ]")?;
    writeln!(writer, "; name  nrexcl")?;
    writeln!(writer, "{:<6} {:>6}", residue_name, 3)?;
    writeln!(writer)?;

    writeln!(writer, "[ atoms ]")?;
    match &system.solute {
        Solute::Molecule(mol) => {
            writeln!(writer, ";  nr       type  resnr  resid   atom   cgnr     charge       mass")?;
            write_molecule_atoms(writer, mol, &residue_name)?;
        }
        Solute::Perturbable(merged) => {
            writeln!(
                writer,
                ";  nr       type  resnr  resid   atom   cgnr     charge       mass      typeB    chargeB      massB"
            )?;
            write_perturbable_atoms(writer, merged, &residue_name)?;
        }
    }
    writeln!(writer)?;

    writeln!(writer, "[ bonds ]")?;
    writeln!(writer, ";  ai    aj  funct")?;
    match &system.solute {
        Solute::Molecule(mol) => {
            for bond in mol.bonds() {
                let a = mol.index_of(bond.atom1_id).unwrap_or(0);
                let b = mol.index_of(bond.atom2_id).unwrap_or(0);
                writeln!(writer, "{:>5} {:>5} {:>6}", a + 1, b + 1, 1)?;
            }
        }
        Solute::Perturbable(merged) => {
            for &(a, b, _) in merged.bonds() {
                writeln!(writer, "{:>5} {:>5} {:>6}", a + 1, b + 1, 1)?;
            }
        }
    }
    writeln!(writer)?;

    if system.is_solvated() {
        writeln!(writer, "[ moleculetype ]")?;
        writeln!(writer, "{:<6} {:>6}", "SOL", 2)?;
        writeln!(writer)?;
        writeln!(writer, "[ atoms ]")?;
        writeln!(
            writer,
            "{:>6} {:>10} {:>6} {:>6} {:>6} {:>6} {:>10.6} {:>10.5}",
            1, "OW", 1, "SOL", "OW", 1, TIP3P_O_CHARGE, 15.9994
        )?;
        writeln!(
            writer,
            "{:>6} {:>10} {:>6} {:>6} {:>6} {:>6} {:>10.6} {:>10.5}",
            2, "HW", 1, "SOL", "HW1", 1, TIP3P_H_CHARGE, 1.008
        )?;
        writeln!(
            writer,
            "{:>6} {:>10} {:>6} {:>6} {:>6} {:>6} {:>10.6} {:>10.5}",
            3, "HW", 1, "SOL", "HW2", 1, TIP3P_H_CHARGE, 1.008
        )?;
        writeln!(writer)?;
        writeln!(writer, "[ settles ]")?;
        writeln!(writer, "; OW   funct  doh      dhh")?;
        writeln!(writer, "{:>4} {:>6} {:>8.5} {:>8.5}", 1, 1, TIP3P_OH_NM, TIP3P_HH_NM)?;
        writeln!(writer)?;
        writeln!(writer, "[ exclusions ]")?;
        writeln!(writer, "1 2 3")?;
        writeln!(writer, "2 1 3")?;
        writeln!(writer, "3 1 2")?;
        writeln!(writer)?;
    }

    writeln!(writer, "[ system ]")?;
    writeln!(writer, "{}", system.solute.name())?;
    writeln!(writer)?;
    writeln!(writer, "[ molecules ]")?;
    writeln!(writer, "{:<6} {:>6}", residue_name, 1)?;
    if system.is_solvated() {
        writeln!(writer, "{:<6} {:>6}", "SOL", system.water_count())?;
    }
    Ok(())
}

/// Writes a topology to a file path.
pub fn write_system_to_path<P: AsRef<Path>>(
    system: &System,
    globals: &GlobalParams,
    path: P,
) -> Result<(), TopError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_system(system, globals, &mut writer)
}
