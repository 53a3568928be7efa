use crate::core::models::system::{Solute, System};
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// GRO files are in nanometers; the data model is in Angstroms.
const ANGSTROM_PER_NM: f64 = 10.0;

#[derive(Debug, Error)]
pub enum GroError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("A .gro file requires a periodic box")]
    MissingBox,
}

/// One atom line of a .gro file, positions converted back to Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct GroAtom {
    pub residue_name: String,
    pub atom_name: String,
    pub position: Point3<f64>,
}

/// The parsed content of a .gro file.
#[derive(Debug, Clone, PartialEq)]
pub struct GroContent {
    pub title: String,
    pub atoms: Vec<GroAtom>,
    /// Box edge lengths in Angstroms.
    pub box_lengths: [f64; 3],
}

/// Truncates a name to the field width without splitting a multi-byte char.
fn truncate_name(name: &str, max_chars: usize) -> &str {
    match name.char_indices().nth(max_chars) {
        Some((index, _)) => &name[..index],
        None => name,
    }
}

fn write_atom_line(
    writer: &mut impl Write,
    residue_number: usize,
    residue_name: &str,
    atom_name: &str,
    atom_number: usize,
    position: &Point3<f64>,
) -> io::Result<()> {
    writeln!(
        writer,
        "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}",
        residue_number % 100_000,
        truncate_name(residue_name, 5),
        truncate_name(atom_name, 5),
        atom_number % 100_000,
        position.x / ANGSTROM_PER_NM,
        position.y / ANGSTROM_PER_NM,
        position.z / ANGSTROM_PER_NM,
    )
}

/// Writes a solvated (or vacuum-with-box) system as GROMACS coordinates.
///
/// The solute is residue 1; each water becomes a `SOL` residue with OW/HW1/HW2
/// sites. Positions and box lengths are converted from Angstroms to nm.
///
/// # Errors
///
/// Returns `GroError::MissingBox` if the system has no periodic box.
pub fn write_system(system: &System, writer: &mut impl Write) -> Result<(), GroError> {
    let boundary = system.boundary.ok_or(GroError::MissingBox)?;

    writeln!(writer, "{}", system.solute.name())?;
    writeln!(writer, "{:>5}", system.atom_count())?;

    let mut atom_number = 1;
    let solute_name = if system.solute.name().is_empty() {
        "LIG"
    } else {
        system.solute.name()
    };

    match &system.solute {
        Solute::Molecule(mol) => {
            for (_, _, atom) in mol.atoms_iter() {
                write_atom_line(writer, 1, solute_name, &atom.name, atom_number, &atom.position)?;
                atom_number += 1;
            }
        }
        Solute::Perturbable(merged) => {
            for atom in merged.atoms() {
                write_atom_line(writer, 1, solute_name, &atom.name, atom_number, &atom.position)?;
                atom_number += 1;
            }
        }
    }

    for (i, water) in system.waters.iter().enumerate() {
        let residue_number = i + 2;
        for (name, position) in [
            ("OW", &water.oxygen),
            ("HW1", &water.hydrogen1),
            ("HW2", &water.hydrogen2),
        ] {
            write_atom_line(writer, residue_number, "SOL", name, atom_number, position)?;
            atom_number += 1;
        }
    }

    writeln!(
        writer,
        "{:>10.5}{:>10.5}{:>10.5}",
        boundary.lengths.x / ANGSTROM_PER_NM,
        boundary.lengths.y / ANGSTROM_PER_NM,
        boundary.lengths.z / ANGSTROM_PER_NM,
    )?;
    Ok(())
}

/// Writes a system to a .gro file path.
pub fn write_system_to_path<P: AsRef<Path>>(system: &System, path: P) -> Result<(), GroError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_system(system, &mut writer)
}

fn parse_field(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, GroError> {
    let value = line.get(start..end).unwrap_or("").trim();
    value.parse().map_err(|_| GroError::Parse {
        line: line_num,
        message: format!("invalid float '{}'", value),
    })
}

/// Reads a .gro file back into names and Angstrom positions.
///
/// Only the fields the setup pipeline writes are recovered; velocities are
/// ignored.
pub fn read_content(reader: &mut impl BufRead) -> Result<GroContent, GroError> {
    let mut lines = reader.lines().enumerate();

    let (_, title) = lines
        .next()
        .ok_or(GroError::Parse {
            line: 1,
            message: "missing title line".into(),
        })
        .and_then(|(i, r)| Ok((i, r?)))?;

    let (count_line_num, count_line) = lines
        .next()
        .ok_or(GroError::Parse {
            line: 2,
            message: "missing atom count line".into(),
        })
        .and_then(|(i, r)| Ok((i + 1, r?)))?;
    let atom_count: usize = count_line.trim().parse().map_err(|_| GroError::Parse {
        line: count_line_num,
        message: format!("invalid atom count '{}'", count_line.trim()),
    })?;

    let mut atoms = Vec::with_capacity(atom_count);
    for _ in 0..atom_count {
        let (line_num, line) = lines
            .next()
            .ok_or(GroError::Parse {
                line: atom_count + 2,
                message: "unexpected end of file in atom records".into(),
            })
            .and_then(|(i, r)| Ok((i + 1, r?)))?;

        let residue_name = line.get(5..10).unwrap_or("").trim().to_string();
        let atom_name = line.get(10..15).unwrap_or("").trim().to_string();
        let x = parse_field(&line, line_num, 20, 28)?;
        let y = parse_field(&line, line_num, 28, 36)?;
        let z = parse_field(&line, line_num, 36, 44)?;
        atoms.push(GroAtom {
            residue_name,
            atom_name,
            position: Point3::new(x, y, z) * ANGSTROM_PER_NM,
        });
    }

    let (box_line_num, box_line) = lines
        .next()
        .ok_or(GroError::Parse {
            line: atom_count + 3,
            message: "missing box line".into(),
        })
        .and_then(|(i, r)| Ok((i + 1, r?)))?;
    let fields: Vec<&str> = box_line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(GroError::Parse {
            line: box_line_num,
            message: "box line requires three lengths".into(),
        });
    }
    let mut box_lengths = [0.0; 3];
    for (i, field) in fields[..3].iter().enumerate() {
        box_lengths[i] = field.parse::<f64>().map_err(|_| GroError::Parse {
            line: box_line_num,
            message: format!("invalid box length '{}'", field),
        })? * ANGSTROM_PER_NM;
    }

    Ok(GroContent {
        title,
        atoms,
        box_lengths,
    })
}
