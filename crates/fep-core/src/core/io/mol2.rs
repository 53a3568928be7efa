use crate::core::io::traits::StructureFile;
use crate::core::models::element::Element;
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::{BondOrder, Molecule};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Mol2Metadata {
    /// The TRIPOS molecule type line (usually "SMALL").
    pub mol_type: String,
    /// The charge-type line (e.g. "USER_CHARGES", "GASTEIGER", "NO_CHARGES").
    pub charge_type: String,
    /// SYBYL atom types in file order, preserved for writing.
    pub sybyl_types: Vec<String>,
    /// Substructure name applied to every atom on write.
    pub substructure: String,
}

impl Default for Mol2Metadata {
    fn default() -> Self {
        Self {
            mol_type: "SMALL".to_string(),
            charge_type: "USER_CHARGES".to_string(),
            sybyl_types: Vec::new(),
            substructure: "LIG".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: Mol2ParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required section: {0}")]
    MissingSection(String),
}

#[derive(Debug, Error)]
pub enum Mol2ParseErrorKind {
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: String, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: String, value: String },
    #[error("ATOM record has too few fields (need id, name, x, y, z, type)")]
    TruncatedAtomRecord,
    #[error("BOND record has too few fields (need id, origin, target, type)")]
    TruncatedBondRecord,
    #[error("Cannot determine element from SYBYL type '{sybyl_type}'")]
    UnknownElement { sybyl_type: String },
    #[error("Invalid bond type '{value}'")]
    InvalidBondType { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Molecule,
    Atom,
    Bond,
    Other,
}

fn parse_int(field: &str, value: &str, line: usize) -> Result<usize, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidInt {
            field: field.into(),
            value: value.into(),
        },
    })
}

fn parse_float(field: &str, value: &str, line: usize) -> Result<f64, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidFloat {
            field: field.into(),
            value: value.into(),
        },
    })
}

/// Reader/writer for TRIPOS MOL2 files (`MOLECULE`, `ATOM`, and `BOND`
/// sections; other sections are skipped).
pub struct Mol2File;

impl StructureFile for Mol2File {
    type Metadata = Mol2Metadata;
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut molecule = Molecule::new("LIG");
        let mut metadata = Mol2Metadata::default();
        let mut section = Section::None;
        let mut molecule_line = 0usize;
        let mut id_map: HashMap<usize, AtomId> = HashMap::new();
        let mut seen_atom_section = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if let Some(section_name) = trimmed.strip_prefix("@<TRIPOS>") {
                section = match section_name {
                    "MOLECULE" => {
                        molecule_line = 0;
                        Section::Molecule
                    }
                    "ATOM" => {
                        seen_atom_section = true;
                        Section::Atom
                    }
                    "BOND" => Section::Bond,
                    _ => Section::Other,
                };
                continue;
            }

            match section {
                Section::Molecule => {
                    molecule_line += 1;
                    match molecule_line {
                        1 => molecule.name = trimmed.to_string(),
                        2 => {} // atom/bond counts; derived from the sections
                        3 => metadata.mol_type = trimmed.to_string(),
                        4 => metadata.charge_type = trimmed.to_string(),
                        _ => {}
                    }
                }
                Section::Atom => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    if fields.len() < 6 {
                        return Err(Mol2Error::Parse {
                            line: line_num,
                            kind: Mol2ParseErrorKind::TruncatedAtomRecord,
                        });
                    }
                    let atom_id = parse_int("atom_id", fields[0], line_num)?;
                    let name = fields[1];
                    let x = parse_float("x", fields[2], line_num)?;
                    let y = parse_float("y", fields[3], line_num)?;
                    let z = parse_float("z", fields[4], line_num)?;
                    let sybyl_type = fields[5];

                    let element =
                        Element::from_sybyl_type(sybyl_type).ok_or(Mol2Error::Parse {
                            line: line_num,
                            kind: Mol2ParseErrorKind::UnknownElement {
                                sybyl_type: sybyl_type.into(),
                            },
                        })?;

                    if fields.len() >= 8 {
                        metadata.substructure = fields[7].to_string();
                    }
                    let charge = if fields.len() >= 9 {
                        parse_float("charge", fields[8], line_num)?
                    } else {
                        0.0
                    };

                    let id = molecule.add_atom(name, element, Point3::new(x, y, z));
                    molecule
                        .atom_mut(id)
                        .ok_or_else(|| Mol2Error::Inconsistency("atom vanished".into()))?
                        .partial_charge = charge;
                    metadata.sybyl_types.push(sybyl_type.to_string());

                    if id_map.insert(atom_id, id).is_some() {
                        return Err(Mol2Error::Inconsistency(format!(
                            "Duplicate atom id: {}",
                            atom_id
                        )));
                    }
                }
                Section::Bond => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    if fields.len() < 4 {
                        return Err(Mol2Error::Parse {
                            line: line_num,
                            kind: Mol2ParseErrorKind::TruncatedBondRecord,
                        });
                    }
                    let origin = parse_int("origin_atom_id", fields[1], line_num)?;
                    let target = parse_int("target_atom_id", fields[2], line_num)?;
                    let order: BondOrder = fields[3].parse().map_err(|_| Mol2Error::Parse {
                        line: line_num,
                        kind: Mol2ParseErrorKind::InvalidBondType {
                            value: fields[3].into(),
                        },
                    })?;

                    let (Some(&origin_id), Some(&target_id)) =
                        (id_map.get(&origin), id_map.get(&target))
                    else {
                        return Err(Mol2Error::Inconsistency(format!(
                            "BOND references unknown atom id {} or {}",
                            origin, target
                        )));
                    };
                    molecule.add_bond(origin_id, target_id, order);
                }
                Section::None | Section::Other => {}
            }
        }

        if !seen_atom_section || molecule.atom_count() == 0 {
            return Err(Mol2Error::MissingSection("@<TRIPOS>ATOM".into()));
        }
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "@<TRIPOS>MOLECULE")?;
        writeln!(writer, "{}", molecule.name)?;
        writeln!(
            writer,
            "{:>5} {:>5} {:>5} {:>5} {:>5}",
            molecule.atom_count(),
            molecule.bonds().len(),
            1,
            0,
            0
        )?;
        writeln!(writer, "{}", metadata.mol_type)?;
        writeln!(writer, "{}", metadata.charge_type)?;
        writeln!(writer)?;

        writeln!(writer, "@<TRIPOS>ATOM")?;
        for (index, _, atom) in molecule.atoms_iter() {
            let sybyl_type = metadata
                .sybyl_types
                .get(index)
                .map(|s| s.as_str())
                .unwrap_or_else(|| atom.element.symbol());
            writeln!(
                writer,
                "{:>7} {:<8} {:>9.4} {:>9.4} {:>9.4} {:<7} {:>3}  {:<8} {:>9.4}",
                index + 1,
                atom.name,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                sybyl_type,
                1,
                metadata.substructure,
                atom.partial_charge
            )?;
        }

        writeln!(writer, "@<TRIPOS>BOND")?;
        for (bond_index, bond) in molecule.bonds().iter().enumerate() {
            let a = molecule.index_of(bond.atom1_id).ok_or_else(|| {
                Mol2Error::Inconsistency("Bond references atom outside the molecule".into())
            })?;
            let b = molecule.index_of(bond.atom2_id).ok_or_else(|| {
                Mol2Error::Inconsistency("Bond references atom outside the molecule".into())
            })?;
            let order = match bond.order {
                BondOrder::Single => "1",
                BondOrder::Double => "2",
                BondOrder::Triple => "3",
                BondOrder::Aromatic => "ar",
            };
            writeln!(
                writer,
                "{:>6} {:>5} {:>5} {}",
                bond_index + 1,
                a + 1,
                b + 1,
                order
            )?;
        }
        Ok(())
    }

    fn write_molecule_to(
        molecule: &Molecule,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(molecule, &Mol2Metadata::default(), writer)
    }
}
