use tracing::debug;

use super::config::MappingConfig;
use super::error::EngineError;
use crate::core::models::mapping::AtomMapping;
use crate::core::models::molecule::Molecule;

/// Finds the maximum common connected substructure between two molecules.
///
/// The search pairs atoms of identical element and grows the match outward
/// across bonds, requiring that every bond present between matched atoms of
/// one molecule is present between their partners in the other (an induced
/// common subgraph). Hydrogens are excluded unless the configuration opts
/// them in. The search is exhaustive up to `max_steps` expanded states; past
/// the budget the largest match found so far is returned.
///
/// Candidate pairs are visited in ascending index order on both sides, so
/// the result is deterministic for a given pair of inputs.
///
/// # Errors
///
/// Returns [`EngineError::NoMappingFound`] if not even a single atom pair
/// can be matched.
pub fn match_atoms(
    molecule_a: &Molecule,
    molecule_b: &Molecule,
    config: &MappingConfig,
) -> Result<AtomMapping, EngineError> {
    let candidates_a = candidate_indices(molecule_a, config.match_hydrogens);
    let candidates_b = candidate_indices(molecule_b, config.match_hydrogens);

    let mut search = Search {
        molecule_a,
        molecule_b,
        candidates_b: &candidates_b,
        max_steps: config.max_steps,
        steps: 0,
        best: Vec::new(),
    };

    for &seed_a in &candidates_a {
        for &seed_b in &candidates_b {
            if !search.compatible(seed_a, seed_b) {
                continue;
            }
            let mut current = vec![(seed_a, seed_b)];
            search.extend(&mut current);
            if search.steps >= search.max_steps {
                break;
            }
        }
        if search.steps >= search.max_steps {
            break;
        }
    }

    debug!(
        pairs = search.best.len(),
        steps = search.steps,
        "substructure search finished"
    );

    if search.best.is_empty() {
        return Err(EngineError::NoMappingFound {
            molecule_a: molecule_a.name.clone(),
            molecule_b: molecule_b.name.clone(),
        });
    }

    let mapping = AtomMapping::from_pairs(search.best.iter().copied())?;
    mapping.validate_for(molecule_a, molecule_b)?;
    Ok(mapping)
}

fn candidate_indices(molecule: &Molecule, match_hydrogens: bool) -> Vec<usize> {
    molecule
        .atoms_iter()
        .filter(|(_, _, atom)| match_hydrogens || atom.element.is_heavy())
        .map(|(index, _, _)| index)
        .collect()
}

struct Search<'a> {
    molecule_a: &'a Molecule,
    molecule_b: &'a Molecule,
    candidates_b: &'a [usize],
    max_steps: usize,
    steps: usize,
    best: Vec<(usize, usize)>,
}

impl Search<'_> {
    fn compatible(&self, index_a: usize, index_b: usize) -> bool {
        let atom_a = self.molecule_a.atom_by_index(index_a);
        let atom_b = self.molecule_b.atom_by_index(index_b);
        match (atom_a, atom_b) {
            (Some(a), Some(b)) => a.element == b.element,
            _ => false,
        }
    }

    fn bonded(&self, molecule: &Molecule, index1: usize, index2: usize) -> bool {
        match (molecule.id_by_index(index1), molecule.id_by_index(index2)) {
            (Some(id1), Some(id2)) => molecule.are_bonded(id1, id2),
            _ => false,
        }
    }

    /// A new pair is admissible when its bonds to every already-matched pair
    /// agree between the two molecules.
    fn consistent(&self, current: &[(usize, usize)], next_a: usize, next_b: usize) -> bool {
        current.iter().all(|&(a, b)| {
            self.bonded(self.molecule_a, a, next_a) == self.bonded(self.molecule_b, b, next_b)
        })
    }

    fn extend(&mut self, current: &mut Vec<(usize, usize)>) {
        self.steps += 1;
        if current.len() > self.best.len() {
            self.best = current.clone();
        }
        if self.steps >= self.max_steps {
            return;
        }

        let frontier = self.frontier(current);
        for (next_a, next_b) in frontier {
            current.push((next_a, next_b));
            self.extend(current);
            current.pop();
            if self.steps >= self.max_steps {
                return;
            }
        }
    }

    /// Unmatched candidate pairs adjacent to the current match, in ascending
    /// index order.
    fn frontier(&self, current: &[(usize, usize)]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for &(a, b) in current {
            let (Some(id_a), Some(id_b)) = (
                self.molecule_a.id_by_index(a),
                self.molecule_b.id_by_index(b),
            ) else {
                continue;
            };
            let neighbors_a = self.molecule_a.neighbors(id_a).unwrap_or(&[]);
            let neighbors_b = self.molecule_b.neighbors(id_b).unwrap_or(&[]);
            for &na in neighbors_a {
                let Some(next_a) = self.molecule_a.index_of(na) else {
                    continue;
                };
                if current.iter().any(|&(x, _)| x == next_a) {
                    continue;
                }
                for &nb in neighbors_b {
                    let Some(next_b) = self.molecule_b.index_of(nb) else {
                        continue;
                    };
                    if !self.candidates_b.contains(&next_b) {
                        continue;
                    }
                    if current.iter().any(|&(_, y)| y == next_b) {
                        continue;
                    }
                    if !self.compatible(next_a, next_b) {
                        continue;
                    }
                    if !self.consistent(current, next_a, next_b) {
                        continue;
                    }
                    if !pairs.contains(&(next_a, next_b)) {
                        pairs.push((next_a, next_b));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}
