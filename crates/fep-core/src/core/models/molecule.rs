use super::atom::Atom;
use super::element::Element;
use super::ids::AtomId;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The order of a covalent bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" | "am" | "un" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// A covalent bond between two atoms of the same molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Self {
        Self {
            atom1_id,
            atom2_id,
            order,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }
}

/// Represents a single molecule: an ordered collection of atoms plus its
/// bonded topology.
///
/// Atoms are stored in a slot map for stable IDs, with a parallel insertion-
/// order vector so that every atom also has a stable zero-based *index*
/// matching its position in the originating structure file. Atom mappings
/// between molecules are expressed in terms of these indices.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// The molecule name (residue or file-derived).
    pub name: String,
    /// Primary atom storage.
    atoms: SlotMap<AtomId, Atom>,
    /// Atom IDs in insertion (file) order.
    order: Vec<AtomId>,
    /// All bonds in the molecule.
    bonds: Vec<Bond>,
    /// Cached adjacency list, indexed by atom ID.
    adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl Molecule {
    /// Creates a new, empty molecule with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Appends an atom and returns its ID.
    ///
    /// The atom receives the next free index in file order.
    pub fn add_atom(&mut self, name: &str, element: Element, position: Point3<f64>) -> AtomId {
        self.insert_atom(Atom::new(name, element, position))
    }

    /// Appends a fully constructed atom and returns its ID.
    pub fn insert_atom(&mut self, atom: Atom) -> AtomId {
        let id = self.atoms.insert(atom);
        self.adjacency.insert(id, Vec::new());
        self.order.push(id);
        id
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns the number of atoms in the molecule.
    pub fn atom_count(&self) -> usize {
        self.order.len()
    }

    /// Returns the atom IDs in file order.
    pub fn atom_ids(&self) -> &[AtomId] {
        &self.order
    }

    /// Returns an iterator over `(index, AtomId, &Atom)` in file order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (usize, AtomId, &Atom)> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, &id)| (i, id, &self.atoms[id]))
    }

    /// Translates a file-order index into an atom ID.
    pub fn id_by_index(&self, index: usize) -> Option<AtomId> {
        self.order.get(index).copied()
    }

    /// Translates an atom ID into its file-order index.
    pub fn index_of(&self, id: AtomId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Retrieves an atom by its file-order index.
    pub fn atom_by_index(&self, index: usize) -> Option<&Atom> {
        self.id_by_index(index).and_then(|id| self.atoms.get(id))
    }

    /// Adds a bond between two atoms.
    ///
    /// This method is idempotent; adding an existing bond succeeds without
    /// creating duplicates.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if successful, otherwise `None` (e.g., if either
    /// atom does not exist, or the two ids are the same atom).
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Option<()> {
        if atom1_id == atom2_id {
            return None;
        }
        if !self.atoms.contains_key(atom1_id) || !self.atoms.contains_key(atom2_id) {
            return None;
        }

        if let Some(neighbors) = self.adjacency.get(atom1_id) {
            if neighbors.contains(&atom2_id) {
                // Bond already exists, operation is successful (idempotent)
                return Some(());
            }
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id, order));
        self.adjacency[atom1_id].push(atom2_id);
        self.adjacency[atom2_id].push(atom1_id);
        Some(())
    }

    /// Returns a slice of all bonds in the molecule.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Retrieves the bonded neighbors of an atom.
    pub fn neighbors(&self, id: AtomId) -> Option<&[AtomId]> {
        self.adjacency.get(id).map(|v| v.as_slice())
    }

    /// Returns the number of bonded neighbors of an atom, counting only
    /// heavy (non-hydrogen) partners when `heavy_only` is set.
    pub fn degree(&self, id: AtomId, heavy_only: bool) -> usize {
        let Some(neighbors) = self.adjacency.get(id) else {
            return 0;
        };
        if !heavy_only {
            return neighbors.len();
        }
        neighbors
            .iter()
            .filter(|&&n| self.atoms[n].element.is_heavy())
            .count()
    }

    /// Returns `true` if the two atoms share a bond.
    pub fn are_bonded(&self, atom1_id: AtomId, atom2_id: AtomId) -> bool {
        self.adjacency
            .get(atom1_id)
            .is_some_and(|neighbors| neighbors.contains(&atom2_id))
    }

    /// Applies a rigid-body transform to every atom position.
    pub fn transform_positions(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for (_, atom) in self.atoms.iter_mut() {
            atom.position = f(&atom.position);
        }
    }

    /// Returns `true` once every atom carries force-field parameters.
    pub fn is_parametrized(&self) -> bool {
        !self.atoms.is_empty() && self.atoms.values().all(|a| a.is_parametrized())
    }
}
