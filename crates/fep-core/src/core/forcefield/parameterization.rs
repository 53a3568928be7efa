use super::params::Forcefield;
use crate::core::models::{
    atom::CachedLjParam,
    ids::AtomId,
    molecule::Molecule,
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum ParameterizationError {
    #[error(
        "No typing rule matches atom '{atom_name}' (element {element}, {heavy_degree} heavy neighbors)"
    )]
    NoTypingRule {
        atom_name: String,
        element: String,
        heavy_degree: usize,
    },
    #[error("Missing Lennard-Jones parameters for force-field type '{ff_type}' on atom '{atom_name}'")]
    MissingLjParams { ff_type: String, atom_name: String },
}

/// Assigns force-field parameters to molecules.
///
/// Works in two passes: typing rules first (element, heavy-atom degree, and
/// neighbor-element discriminators, first match wins), then the
/// physicochemical parameters (cached Lennard-Jones, mass, and partial
/// charge). Charges already present on the molecule (typically read from a
/// MOL2 file) take precedence over the force field's fallback table.
pub struct Parameterizer<'a> {
    forcefield: &'a Forcefield,
}

impl<'a> Parameterizer<'a> {
    pub fn new(forcefield: &'a Forcefield) -> Self {
        Self { forcefield }
    }

    /// Parametrizes every atom of the molecule in place.
    ///
    /// # Errors
    ///
    /// Returns an error if any atom matches no typing rule or its assigned
    /// type has no Lennard-Jones entry.
    pub fn parameterize_molecule(
        &self,
        molecule: &mut Molecule,
    ) -> Result<(), ParameterizationError> {
        let atom_ids: Vec<_> = molecule.atom_ids().to_vec();

        // Pass 1: assign force-field types from the typing rules.
        for &atom_id in &atom_ids {
            let ff_type = self.resolve_type(molecule, atom_id)?;
            if let Some(atom) = molecule.atom_mut(atom_id) {
                atom.force_field_type = ff_type;
            }
        }

        // Pass 2: assign physicochemical parameters.
        for &atom_id in &atom_ids {
            self.assign_physicochemical_params(molecule, atom_id)?;
        }

        Ok(())
    }

    fn resolve_type(
        &self,
        molecule: &Molecule,
        atom_id: AtomId,
    ) -> Result<String, ParameterizationError> {
        let atom = molecule
            .atom(atom_id)
            .expect("atom id taken from the molecule itself");
        let element_symbol = atom.element.symbol();
        let heavy_degree = molecule.degree(atom_id, true);

        for rule in &self.forcefield.typing {
            if rule.element != element_symbol {
                continue;
            }
            if let Some(required_degree) = rule.degree {
                if required_degree != heavy_degree {
                    continue;
                }
            }
            if let Some(required_neighbor) = &rule.neighbor {
                let neighbors = molecule.neighbors(atom_id).unwrap_or(&[]);
                let has_neighbor = neighbors.iter().any(|&n| {
                    molecule
                        .atom(n)
                        .is_some_and(|a| a.element.symbol() == required_neighbor)
                });
                if !has_neighbor {
                    continue;
                }
            }
            return Ok(rule.ff_type.clone());
        }

        Err(ParameterizationError::NoTypingRule {
            atom_name: atom.name.clone(),
            element: element_symbol.to_string(),
            heavy_degree,
        })
    }

    fn assign_physicochemical_params(
        &self,
        molecule: &mut Molecule,
        atom_id: AtomId,
    ) -> Result<(), ParameterizationError> {
        let (ff_type, atom_name, input_charge, element) = {
            let atom = molecule
                .atom(atom_id)
                .expect("atom id taken from the molecule itself");
            (
                atom.force_field_type.clone(),
                atom.name.clone(),
                atom.partial_charge,
                atom.element,
            )
        };

        let lj = self
            .forcefield
            .lj_for(&ff_type)
            .ok_or(ParameterizationError::MissingLjParams {
                ff_type: ff_type.clone(),
                atom_name: atom_name.clone(),
            })?;

        let charge = if input_charge != 0.0 {
            input_charge
        } else if let Some(&fallback) = self.forcefield.fallback_charges.get(&ff_type) {
            fallback
        } else {
            warn!(
                "Atom '{}' has no input charge and no fallback entry for type '{}'; using 0.0.",
                atom_name, ff_type
            );
            0.0
        };

        let atom = molecule
            .atom_mut(atom_id)
            .expect("atom id taken from the molecule itself");
        atom.lj_param = CachedLjParam::LennardJones {
            sigma: lj.sigma,
            epsilon: lj.epsilon,
        };
        atom.mass = element.mass();
        atom.partial_charge = charge;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{GlobalParams, LjParam, TypingRule};
    use crate::core::models::element::Element;
    use crate::core::models::molecule::BondOrder;
    use nalgebra::Point3;
    use std::collections::HashMap;

    fn test_forcefield() -> Forcefield {
        let mut lj = HashMap::new();
        lj.insert(
            "c3".to_string(),
            LjParam {
                sigma: 3.3997,
                epsilon: 0.1094,
            },
        );
        lj.insert(
            "oh".to_string(),
            LjParam {
                sigma: 3.0665,
                epsilon: 0.2104,
            },
        );
        lj.insert(
            "hc".to_string(),
            LjParam {
                sigma: 2.6495,
                epsilon: 0.0157,
            },
        );

        let mut fallback_charges = HashMap::new();
        fallback_charges.insert("oh".to_string(), -0.55);

        Forcefield {
            globals: GlobalParams {
                name: "gaff-lite".into(),
                combining_rule: "lorentz-berthelot".into(),
                fudge_lj: 0.5,
                fudge_qq: 0.8333,
            },
            lj,
            typing: vec![
                TypingRule {
                    element: "O".into(),
                    degree: None,
                    neighbor: Some("H".into()),
                    ff_type: "oh".into(),
                },
                TypingRule {
                    element: "C".into(),
                    degree: None,
                    neighbor: None,
                    ff_type: "c3".into(),
                },
                TypingRule {
                    element: "H".into(),
                    degree: None,
                    neighbor: None,
                    ff_type: "hc".into(),
                },
            ],
            fallback_charges,
        }
    }

    fn methanol_heavy() -> Molecule {
        let mut mol = Molecule::new("methanol");
        let c = mol.add_atom("C1", Element::C, Point3::origin());
        let o = mol.add_atom("O1", Element::O, Point3::new(1.4, 0.0, 0.0));
        let h = mol.add_atom("H1", Element::H, Point3::new(2.0, 0.8, 0.0));
        mol.add_bond(c, o, BondOrder::Single).unwrap();
        mol.add_bond(o, h, BondOrder::Single).unwrap();
        mol
    }

    #[test]
    fn assigns_types_charges_and_lj() {
        let ff = test_forcefield();
        let mut mol = methanol_heavy();
        Parameterizer::new(&ff).parameterize_molecule(&mut mol).unwrap();

        assert!(mol.is_parametrized());
        let o = mol.atom_by_index(1).unwrap();
        assert_eq!(o.force_field_type, "oh");
        // No input charge, so the fallback table applies.
        assert!((o.partial_charge - (-0.55)).abs() < 1e-12);
        assert_eq!(
            o.lj_param,
            CachedLjParam::LennardJones {
                sigma: 3.0665,
                epsilon: 0.2104
            }
        );
    }

    #[test]
    fn input_charges_take_precedence_over_the_table() {
        let ff = test_forcefield();
        let mut mol = methanol_heavy();
        let o_id = mol.id_by_index(1).unwrap();
        mol.atom_mut(o_id).unwrap().partial_charge = -0.61;

        Parameterizer::new(&ff).parameterize_molecule(&mut mol).unwrap();
        assert!((mol.atom_by_index(1).unwrap().partial_charge - (-0.61)).abs() < 1e-12);
    }

    #[test]
    fn unmatched_atom_reports_no_typing_rule() {
        let ff = test_forcefield();
        let mut mol = Molecule::new("n-test");
        mol.add_atom("N1", Element::N, Point3::origin());

        let err = Parameterizer::new(&ff)
            .parameterize_molecule(&mut mol)
            .unwrap_err();
        assert_eq!(
            err,
            ParameterizationError::NoTypingRule {
                atom_name: "N1".into(),
                element: "N".into(),
                heavy_degree: 0,
            }
        );
    }

    #[test]
    fn missing_lj_entry_is_reported() {
        let mut ff = test_forcefield();
        ff.lj.remove("hc");
        let mut mol = methanol_heavy();

        let err = Parameterizer::new(&ff)
            .parameterize_molecule(&mut mol)
            .unwrap_err();
        assert_eq!(
            err,
            ParameterizationError::MissingLjParams {
                ff_type: "hc".into(),
                atom_name: "H1".into(),
            }
        );
    }

    #[test]
    fn degree_discriminator_selects_between_rules() {
        let mut ff = test_forcefield();
        ff.typing.insert(
            0,
            TypingRule {
                element: "C".into(),
                degree: Some(2),
                neighbor: None,
                ff_type: "c2x".into(),
            },
        );
        ff.lj.insert(
            "c2x".to_string(),
            LjParam {
                sigma: 3.3,
                epsilon: 0.09,
            },
        );

        let mut mol = Molecule::new("propane-ish");
        let c1 = mol.add_atom("C1", Element::C, Point3::origin());
        let c2 = mol.add_atom("C2", Element::C, Point3::new(1.5, 0.0, 0.0));
        let c3 = mol.add_atom("C3", Element::C, Point3::new(3.0, 0.0, 0.0));
        mol.add_bond(c1, c2, BondOrder::Single).unwrap();
        mol.add_bond(c2, c3, BondOrder::Single).unwrap();

        Parameterizer::new(&ff).parameterize_molecule(&mut mol).unwrap();
        assert_eq!(mol.atom_by_index(0).unwrap().force_field_type, "c3");
        assert_eq!(mol.atom_by_index(1).unwrap().force_field_type, "c2x");
    }
}
