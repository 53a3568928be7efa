use super::molecule::Molecule;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Atom index {index} is already mapped")]
    DuplicateDomain { index: usize },
    #[error("Atom index {index} is already a mapping target")]
    DuplicateCodomain { index: usize },
    #[error("Mapped index {index} is out of range for molecule '{molecule}' ({atom_count} atoms)")]
    IndexOutOfRange {
        index: usize,
        molecule: String,
        atom_count: usize,
    },
}

/// A finite partial injective correspondence between the atom indices of two
/// molecules.
///
/// Keys index the first (mobile, state A) molecule, values the second
/// (reference, state B) molecule. Both keys and values are unique, so the
/// mapping can be inverted without loss: `invert` exchanges domain and
/// codomain, and applying it twice returns the original mapping exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomMapping {
    forward: BTreeMap<usize, usize>,
    used_targets: BTreeSet<usize>,
}

impl AtomMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(domain, codomain)` index pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any domain or codomain index occurs twice.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Result<Self, MappingError> {
        let mut mapping = Self::new();
        for (from, to) in pairs {
            mapping.insert(from, to)?;
        }
        Ok(mapping)
    }

    /// Adds a single correspondence.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is already mapped or `to` is already a
    /// target, preserving injectivity.
    pub fn insert(&mut self, from: usize, to: usize) -> Result<(), MappingError> {
        if self.forward.contains_key(&from) {
            return Err(MappingError::DuplicateDomain { index: from });
        }
        if !self.used_targets.insert(to) {
            return Err(MappingError::DuplicateCodomain { index: to });
        }
        self.forward.insert(from, to);
        Ok(())
    }

    /// Looks up the target index of a domain index.
    pub fn get(&self, from: usize) -> Option<usize> {
        self.forward.get(&from).copied()
    }

    /// Returns `true` if `to` is the target of some domain index.
    pub fn contains_target(&self, to: usize) -> bool {
        self.used_targets.contains(&to)
    }

    /// Returns the number of mapped pairs.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if no pairs are mapped.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns an iterator over `(domain, codomain)` pairs in domain order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.forward.iter().map(|(&from, &to)| (from, to))
    }

    /// Exchanges domain and codomain.
    ///
    /// Injectivity guarantees the result is again a valid mapping, and
    /// `m.invert().invert() == m`.
    pub fn invert(&self) -> AtomMapping {
        let mut inverted = AtomMapping::new();
        for (&from, &to) in &self.forward {
            // Cannot fail: the forward map is injective.
            let _ = inverted.insert(to, from);
        }
        inverted
    }

    /// Checks that every mapped index is in range for the given molecules.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::IndexOutOfRange` naming the offending molecule.
    pub fn validate_for(&self, domain: &Molecule, codomain: &Molecule) -> Result<(), MappingError> {
        for (from, to) in self.iter() {
            if from >= domain.atom_count() {
                return Err(MappingError::IndexOutOfRange {
                    index: from,
                    molecule: domain.name.clone(),
                    atom_count: domain.atom_count(),
                });
            }
            if to >= codomain.atom_count() {
                return Err(MappingError::IndexOutOfRange {
                    index: to,
                    molecule: codomain.name.clone(),
                    atom_count: codomain.atom_count(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    #[test]
    fn from_pairs_builds_ordered_mapping() {
        let m = AtomMapping::from_pairs([(2, 0), (0, 1), (1, 3)]).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(0), Some(1));
        assert_eq!(m.get(2), Some(0));
        assert_eq!(m.get(5), None);
        let pairs: Vec<_> = m.iter().collect();
        assert_eq!(pairs, vec![(0, 1), (1, 3), (2, 0)]);
    }

    #[test]
    fn insert_rejects_duplicate_domain_index() {
        let mut m = AtomMapping::new();
        m.insert(0, 1).unwrap();
        assert_eq!(
            m.insert(0, 2),
            Err(MappingError::DuplicateDomain { index: 0 })
        );
    }

    #[test]
    fn insert_rejects_duplicate_codomain_index() {
        let mut m = AtomMapping::new();
        m.insert(0, 1).unwrap();
        assert_eq!(
            m.insert(2, 1),
            Err(MappingError::DuplicateCodomain { index: 1 })
        );
    }

    #[test]
    fn invert_exchanges_domain_and_codomain() {
        let m = AtomMapping::from_pairs([(0, 4), (1, 2), (3, 0)]).unwrap();
        let inv = m.invert();
        assert_eq!(inv.get(4), Some(0));
        assert_eq!(inv.get(2), Some(1));
        assert_eq!(inv.get(0), Some(3));
    }

    #[test]
    fn invert_is_an_involution() {
        let m = AtomMapping::from_pairs([(0, 7), (3, 1), (5, 5), (9, 0)]).unwrap();
        assert_eq!(m.invert().invert(), m);
    }

    #[test]
    fn validate_for_checks_both_molecules() {
        let mut a = Molecule::new("a");
        let mut b = Molecule::new("b");
        a.add_atom("C1", Element::C, Point3::origin());
        a.add_atom("C2", Element::C, Point3::origin());
        b.add_atom("C1", Element::C, Point3::origin());

        let ok = AtomMapping::from_pairs([(1, 0)]).unwrap();
        assert!(ok.validate_for(&a, &b).is_ok());

        let bad_domain = AtomMapping::from_pairs([(2, 0)]).unwrap();
        assert!(matches!(
            bad_domain.validate_for(&a, &b),
            Err(MappingError::IndexOutOfRange { index: 2, .. })
        ));

        let bad_codomain = AtomMapping::from_pairs([(0, 1)]).unwrap();
        assert!(matches!(
            bad_codomain.validate_for(&a, &b),
            Err(MappingError::IndexOutOfRange { index: 1, .. })
        ));
    }
}
