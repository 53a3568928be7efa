use crate::core::io::traits::StructureFile;
use crate::core::models::element::Element;
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::{BondOrder, Molecule};
use crate::core::models::system::{Solute, System};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct PdbMetadata {
    /// REMARK/TITLE/COMPND lines preserved verbatim.
    pub header_lines: Vec<String>,
    /// Residue name used for all atoms on write.
    pub residue_name: String,
    /// Chain identifier used on write.
    pub chain_id: char,
    /// CRYST1 box edge lengths (Angstroms), if present.
    pub box_lengths: Option<[f64; 3]>,
}

impl Default for PdbMetadata {
    fn default() -> Self {
        Self {
            header_lines: Vec::new(),
            residue_name: "LIG".to_string(),
            chain_id: 'A',
            box_lengths: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Cannot determine element for atom '{name}'")]
    UnknownElement { name: String },
    #[error("Line is too short for an ATOM/HETATM record (must reach the coordinate columns)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// Derives the element from the dedicated column, falling back to the atom
/// name (two-letter symbols like Cl tried before one-letter ones).
fn resolve_element(element_field: &str, name: &str) -> Option<Element> {
    if let Ok(e) = element_field.parse() {
        return Some(e);
    }
    let alpha: String = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if alpha.len() >= 2 {
        if let Ok(e) = alpha[..2].parse() {
            return Some(e);
        }
    }
    alpha.get(..1).and_then(|s| s.parse().ok())
}

/// Reader/writer for Protein Data Bank files restricted to the single-ligand
/// use of this pipeline: ATOM/HETATM, CONECT, CRYST1, and END records.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut molecule = Molecule::new("LIG");
        let mut metadata = PdbMetadata::default();
        let mut serial_to_id: HashMap<usize, AtomId> = HashMap::new();
        let mut residue_name_seen = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-11".into(),
                            value: serial_str.into(),
                        },
                    })?;

                    let name = slice_and_trim(&line, 12, 16);
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_id = line.chars().nth(21).unwrap_or('A');
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let element_field = slice_and_trim(&line, 76, 78);

                    let element =
                        resolve_element(element_field, name).ok_or(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::UnknownElement { name: name.into() },
                        })?;

                    if !residue_name_seen && !res_name.is_empty() {
                        metadata.residue_name = res_name.to_string();
                        metadata.chain_id = chain_id;
                        molecule.name = res_name.to_string();
                        residue_name_seen = true;
                    }

                    let id = molecule.add_atom(name, element, Point3::new(x, y, z));
                    if serial_to_id.insert(serial, id).is_some() {
                        return Err(PdbError::Inconsistency(format!(
                            "Duplicate atom serial: {}",
                            serial
                        )));
                    }
                }
                "CONECT" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() < 3 {
                        continue;
                    }
                    let Ok(origin) = parts[1].parse::<usize>() else {
                        continue;
                    };
                    let Some(&origin_id) = serial_to_id.get(&origin) else {
                        return Err(PdbError::Inconsistency(format!(
                            "CONECT references unknown serial {}",
                            origin
                        )));
                    };
                    for partner_str in &parts[2..] {
                        let Ok(partner) = partner_str.parse::<usize>() else {
                            continue;
                        };
                        let Some(&partner_id) = serial_to_id.get(&partner) else {
                            return Err(PdbError::Inconsistency(format!(
                                "CONECT references unknown serial {}",
                                partner
                            )));
                        };
                        molecule.add_bond(origin_id, partner_id, BondOrder::Single);
                    }
                }
                "CRYST1" => {
                    let a = parse_float(&line, line_num, 6, 15)?;
                    let b = parse_float(&line, line_num, 15, 24)?;
                    let c = parse_float(&line, line_num, 24, 33)?;
                    metadata.box_lengths = Some([a, b, c]);
                }
                "END" | "ENDMDL" => break,
                "" => continue,
                _ => metadata.header_lines.push(line),
            }
        }

        if molecule.atom_count() == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }
        if let Some([a, b, c]) = metadata.box_lengths {
            writeln!(
                writer,
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
                a, b, c, 90.0, 90.0, 90.0
            )?;
        }

        for (index, _, atom) in molecule.atoms_iter() {
            writeln!(
                writer,
                "HETATM{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                index + 1,
                atom.name,
                metadata.residue_name,
                metadata.chain_id,
                1,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                1.00,
                0.00,
                atom.element.symbol()
            )?;
        }

        for bond in molecule.bonds() {
            let a = molecule.index_of(bond.atom1_id).ok_or_else(|| {
                PdbError::Inconsistency("Bond references atom outside the molecule".into())
            })?;
            let b = molecule.index_of(bond.atom2_id).ok_or_else(|| {
                PdbError::Inconsistency("Bond references atom outside the molecule".into())
            })?;
            writeln!(writer, "CONECT{:>5}{:>5}", a + 1, b + 1)?;
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_molecule_to(
        molecule: &Molecule,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let metadata = PdbMetadata {
            header_lines: vec!["REMARK   Generated by fepforge".to_string()],
            residue_name: if molecule.name.len() == 3 {
                molecule.name.to_ascii_uppercase()
            } else {
                "LIG".to_string()
            },
            ..Default::default()
        };
        Self::write_to(molecule, &metadata, writer)
    }
}

/// Writes a full (possibly solvated) system as a single PDB model.
///
/// Solute atoms come first as residue 1; each water becomes a `SOL` residue
/// with OW/HW1/HW2 atoms. A CRYST1 record is emitted when a periodic box is
/// present. Dual-topology solutes write their merged coordinates with the
/// element of whichever end state is real.
pub fn write_system(system: &System, writer: &mut impl Write) -> Result<(), PdbError> {
    writeln!(writer, "REMARK   Generated by fepforge")?;
    if let Some(boundary) = &system.boundary {
        writeln!(
            writer,
            "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
            boundary.lengths.x, boundary.lengths.y, boundary.lengths.z, 90.0, 90.0, 90.0
        )?;
    }

    let residue_name = {
        let name = system.solute.name();
        if name.len() == 3 {
            name.to_ascii_uppercase()
        } else {
            "LIG".to_string()
        }
    };

    let mut serial = 0usize;
    let mut write_atom = |writer: &mut dyn Write,
                          name: &str,
                          residue: &str,
                          residue_seq: usize,
                          position: &Point3<f64>,
                          symbol: &str|
     -> Result<(), PdbError> {
        serial += 1;
        writeln!(
            writer,
            "HETATM{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            serial, name, residue, 'A', residue_seq, position.x, position.y, position.z, 1.00,
            0.00, symbol
        )?;
        Ok(())
    };

    match &system.solute {
        Solute::Molecule(mol) => {
            for (_, _, atom) in mol.atoms_iter() {
                write_atom(
                    writer,
                    &atom.name,
                    &residue_name,
                    1,
                    &atom.position,
                    atom.element.symbol(),
                )?;
            }
        }
        Solute::Perturbable(merged) => {
            for atom in merged.atoms() {
                let element = if atom.state_a.is_dummy() {
                    atom.state_b.element
                } else {
                    atom.state_a.element
                };
                write_atom(
                    writer,
                    &atom.name,
                    &residue_name,
                    1,
                    &atom.position,
                    element.symbol(),
                )?;
            }
        }
    }

    for (i, water) in system.waters.iter().enumerate() {
        let residue_seq = i + 2;
        write_atom(writer, "OW", "SOL", residue_seq, &water.oxygen, "O")?;
        write_atom(writer, "HW1", "SOL", residue_seq, &water.hydrogen1, "H")?;
        write_atom(writer, "HW2", "SOL", residue_seq, &water.hydrogen2, "H")?;
    }

    writeln!(writer, "END")?;
    Ok(())
}

/// Writes a system PDB to a file path.
pub fn write_system_to_path<P: AsRef<std::path::Path>>(
    system: &System,
    path: P,
) -> Result<(), PdbError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_system(system, &mut writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    const ETHANOL_FRAGMENT: &str = "\
REMARK   test structure
HETATM    1  C1  ETH A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  C2  ETH A   1       1.540   0.000   0.000  1.00  0.00           C
HETATM    3  O1  ETH A   1       2.200   1.200   0.000  1.00  0.00           O
CONECT    1    2
CONECT    2    3
END
";

    fn read(content: &str) -> Result<(Molecule, PdbMetadata), PdbError> {
        PdbFile::read_from(&mut BufReader::new(content.as_bytes()))
    }

    #[test]
    fn reads_atoms_bonds_and_metadata() {
        let (mol, meta) = read(ETHANOL_FRAGMENT).unwrap();

        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bonds().len(), 2);
        assert_eq!(mol.name, "ETH");
        assert_eq!(meta.residue_name, "ETH");
        assert_eq!(meta.header_lines.len(), 1);

        let o1 = mol.atom_by_index(2).unwrap();
        assert_eq!(o1.element, Element::O);
        assert_eq!(o1.position, Point3::new(2.2, 1.2, 0.0));
    }

    #[test]
    fn element_falls_back_to_atom_name() {
        let content = "\
HETATM    1 CL1  LIG A   1       0.000   0.000   0.000  1.00  0.00
END
";
        let (mol, _) = read(content).unwrap();
        assert_eq!(mol.atom_by_index(0).unwrap().element, Element::Cl);
    }

    #[test]
    fn reads_cryst1_box() {
        let content = "\
CRYST1   30.000   31.000   32.000  90.00  90.00  90.00 P 1           1
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
END
";
        let (_, meta) = read(content).unwrap();
        assert_eq!(meta.box_lengths, Some([30.0, 31.0, 32.0]));
    }

    #[test]
    fn parse_error_reports_line_number() {
        let content = "\
HETATM    1  C1  LIG A   1       0.000   0.000
END
";
        let err = read(content).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            }
        ));
    }

    #[test]
    fn duplicate_serial_is_an_inconsistency() {
        let content = "\
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    1  C2  LIG A   1       1.000   0.000   0.000  1.00  0.00           C
END
";
        assert!(matches!(read(content), Err(PdbError::Inconsistency(_))));
    }

    #[test]
    fn conect_with_unknown_serial_fails() {
        let content = "\
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
CONECT    1    9
END
";
        assert!(matches!(read(content), Err(PdbError::Inconsistency(_))));
    }

    #[test]
    fn empty_file_is_missing_records() {
        assert!(matches!(read("END\n"), Err(PdbError::MissingRecord(_))));
    }

    #[test]
    fn round_trip_preserves_atoms_and_bonds() {
        let (mol, meta) = read(ETHANOL_FRAGMENT).unwrap();

        let mut buffer = Vec::new();
        PdbFile::write_to(&mol, &meta, &mut buffer).unwrap();
        let (reread, _) = read(std::str::from_utf8(&buffer).unwrap()).unwrap();

        assert_eq!(reread.atom_count(), mol.atom_count());
        assert_eq!(reread.bonds().len(), mol.bonds().len());
        for i in 0..mol.atom_count() {
            let original = mol.atom_by_index(i).unwrap();
            let copy = reread.atom_by_index(i).unwrap();
            assert_eq!(original.element, copy.element);
            assert!((original.position - copy.position).norm() < 1e-3);
        }
    }
}
