use super::atom::{Atom, CachedLjParam};
use super::element::Element;
use super::molecule::{BondOrder, Molecule};
use nalgebra::Point3;

/// Labels the two alchemical end states of a perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndState {
    /// The initial state (lambda = 0).
    A,
    /// The final state (lambda = 1).
    B,
}

/// Classifies how an atom of a merged molecule behaves across the
/// perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Present in both end states (part of the common substructure).
    Core,
    /// Real in state A, a dummy placeholder in state B.
    Disappearing,
    /// A dummy placeholder in state A, real in state B.
    Appearing,
}

/// The force-field properties an atom carries in one end state.
#[derive(Debug, Clone, PartialEq)]
pub struct EndStateAtom {
    pub element: Element,
    pub force_field_type: String,
    pub partial_charge: f64,
    pub mass: f64,
    pub lj_param: CachedLjParam,
}

impl EndStateAtom {
    /// Captures the end-state properties of a parametrized atom.
    pub fn from_atom(atom: &Atom) -> Self {
        Self {
            element: atom.element,
            force_field_type: atom.force_field_type.clone(),
            partial_charge: atom.partial_charge,
            mass: atom.mass,
            lj_param: atom.lj_param,
        }
    }

    /// The non-interacting placeholder record for an atom absent from this
    /// end state.
    pub fn dummy() -> Self {
        Self {
            element: Element::Dummy,
            force_field_type: "du".to_string(),
            partial_charge: 0.0,
            mass: 0.0,
            lj_param: CachedLjParam::None,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.element == Element::Dummy
    }
}

/// One atom of a dual-topology molecule: a single set of coordinates plus a
/// complete property record for each end state.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedAtom {
    pub name: String,
    pub position: Point3<f64>,
    pub mutation: Mutation,
    pub state_a: EndStateAtom,
    pub state_b: EndStateAtom,
}

impl PerturbedAtom {
    /// Returns the end-state record for the given state.
    pub fn state(&self, end: EndState) -> &EndStateAtom {
        match end {
            EndState::A => &self.state_a,
            EndState::B => &self.state_b,
        }
    }

    /// A mass usable by engines that reject zero-mass particles: the larger
    /// of the two end-state masses.
    pub fn io_mass(&self) -> f64 {
        self.state_a.mass.max(self.state_b.mass)
    }
}

/// A dual-topology "alchemical" molecule representing both end states of a
/// perturbation.
///
/// Every atom carries a well-defined property record for state A and state B;
/// atoms absent from one state are dummies there. The atom count equals
/// `nA + nB - |mapping|`, which is the larger of the two input counts
/// whenever the mapping covers the smaller molecule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedMolecule {
    pub name: String,
    atoms: Vec<PerturbedAtom>,
    bonds: Vec<(usize, usize, BondOrder)>,
}

impl MergedMolecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Appends a perturbed atom and returns its index.
    pub fn push_atom(&mut self, atom: PerturbedAtom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Adds a bond by atom index.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if both indices are in range, otherwise `None`.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) -> Option<()> {
        if atom1 >= self.atoms.len() || atom2 >= self.atoms.len() || atom1 == atom2 {
            return None;
        }
        let key = (atom1.min(atom2), atom1.max(atom2));
        if self.bonds.iter().any(|&(a, b, _)| (a, b) == key) {
            return Some(());
        }
        self.bonds.push((key.0, key.1, order));
        Some(())
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[PerturbedAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[(usize, usize, BondOrder)] {
        &self.bonds
    }

    /// Applies a pointwise transformation to every atom position.
    pub fn transform_positions(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for atom in &mut self.atoms {
            atom.position = f(&atom.position);
        }
    }

    /// Counts the atoms with the given mutation kind.
    pub fn count_mutation(&self, mutation: Mutation) -> usize {
        self.atoms.iter().filter(|a| a.mutation == mutation).count()
    }

    /// Materializes a plain molecule for one end state.
    ///
    /// Atoms that are dummies in that state are excluded, so the result has
    /// the atom count and elemental identity of the corresponding input
    /// molecule. Bonds between surviving atoms are carried over.
    pub fn end_state(&self, end: EndState) -> Molecule {
        let mut mol = Molecule::new(&self.name);
        let mut index_map = vec![None; self.atoms.len()];

        for (i, merged_atom) in self.atoms.iter().enumerate() {
            let record = merged_atom.state(end);
            if record.is_dummy() {
                continue;
            }
            let mut atom = Atom::new(&merged_atom.name, record.element, merged_atom.position);
            atom.force_field_type = record.force_field_type.clone();
            atom.partial_charge = record.partial_charge;
            atom.mass = record.mass;
            atom.lj_param = record.lj_param;
            let id = mol.insert_atom(atom);
            index_map[i] = Some(id);
        }

        for &(a, b, order) in &self.bonds {
            if let (Some(id_a), Some(id_b)) = (index_map[a], index_map[b]) {
                mol.add_bond(id_a, id_b, order);
            }
        }

        mol
    }

    /// Sum of partial charges in one end state.
    pub fn total_charge(&self, end: EndState) -> f64 {
        self.atoms.iter().map(|a| a.state(end).partial_charge).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_state(element: Element, ff_type: &str, charge: f64) -> EndStateAtom {
        EndStateAtom {
            element,
            force_field_type: ff_type.to_string(),
            partial_charge: charge,
            mass: element.mass(),
            lj_param: CachedLjParam::LennardJones {
                sigma: 3.4,
                epsilon: 0.1,
            },
        }
    }

    fn sample_merged() -> MergedMolecule {
        // Two core carbons, one disappearing hydrogen, one appearing oxygen.
        let mut merged = MergedMolecule::new("test");
        merged.push_atom(PerturbedAtom {
            name: "C1".into(),
            position: Point3::origin(),
            mutation: Mutation::Core,
            state_a: real_state(Element::C, "c3", 0.0),
            state_b: real_state(Element::C, "c3", 0.1),
        });
        merged.push_atom(PerturbedAtom {
            name: "C2".into(),
            position: Point3::new(1.5, 0.0, 0.0),
            mutation: Mutation::Core,
            state_a: real_state(Element::C, "c3", 0.0),
            state_b: real_state(Element::C, "os", -0.3),
        });
        merged.push_atom(PerturbedAtom {
            name: "H1".into(),
            position: Point3::new(-1.0, 0.0, 0.0),
            mutation: Mutation::Disappearing,
            state_a: real_state(Element::H, "hc", 0.05),
            state_b: EndStateAtom::dummy(),
        });
        merged.push_atom(PerturbedAtom {
            name: "O1".into(),
            position: Point3::new(2.5, 0.0, 0.0),
            mutation: Mutation::Appearing,
            state_a: EndStateAtom::dummy(),
            state_b: real_state(Element::O, "oh", -0.5),
        });
        merged.add_bond(0, 1, BondOrder::Single).unwrap();
        merged.add_bond(0, 2, BondOrder::Single).unwrap();
        merged.add_bond(1, 3, BondOrder::Single).unwrap();
        merged
    }

    #[test]
    fn every_atom_has_both_state_records() {
        let merged = sample_merged();
        for atom in merged.atoms() {
            assert!(!atom.state_a.force_field_type.is_empty());
            assert!(!atom.state_b.force_field_type.is_empty());
        }
    }

    #[test]
    fn mutation_counts_partition_the_atoms() {
        let merged = sample_merged();
        assert_eq!(merged.count_mutation(Mutation::Core), 2);
        assert_eq!(merged.count_mutation(Mutation::Disappearing), 1);
        assert_eq!(merged.count_mutation(Mutation::Appearing), 1);
        assert_eq!(merged.atom_count(), 4);
    }

    #[test]
    fn end_state_excludes_dummies_and_keeps_bonds() {
        let merged = sample_merged();

        let state_a = merged.end_state(EndState::A);
        assert_eq!(state_a.atom_count(), 3);
        assert_eq!(state_a.bonds().len(), 2); // C1-C2, C1-H1

        let state_b = merged.end_state(EndState::B);
        assert_eq!(state_b.atom_count(), 3);
        assert_eq!(state_b.bonds().len(), 2); // C1-C2, C2-O1
        let elements: Vec<_> = state_b.atoms_iter().map(|(_, _, a)| a.element).collect();
        assert_eq!(elements, vec![Element::C, Element::C, Element::O]);
    }

    #[test]
    fn io_mass_falls_back_to_the_real_state() {
        let merged = sample_merged();
        let appearing = &merged.atoms()[3];
        assert_eq!(appearing.state_a.mass, 0.0);
        assert_eq!(appearing.io_mass(), Element::O.mass());
    }

    #[test]
    fn add_bond_rejects_self_and_out_of_range() {
        let mut merged = sample_merged();
        assert_eq!(merged.add_bond(0, 0, BondOrder::Single), None);
        assert_eq!(merged.add_bond(0, 9, BondOrder::Single), None);
        // Re-adding an existing bond is idempotent.
        let bond_count = merged.bonds().len();
        assert_eq!(merged.add_bond(1, 0, BondOrder::Single), Some(()));
        assert_eq!(merged.bonds().len(), bond_count);
    }

    #[test]
    fn total_charge_follows_the_end_state() {
        let merged = sample_merged();
        assert!((merged.total_charge(EndState::A) - 0.05).abs() < 1e-12);
        assert!((merged.total_charge(EndState::B) - (-0.7)).abs() < 1e-12);
    }
}
