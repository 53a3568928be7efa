use tracing::{debug, warn};

use super::error::EngineError;
use crate::core::models::mapping::AtomMapping;
use crate::core::models::merged::{EndState, EndStateAtom, MergedMolecule, Mutation, PerturbedAtom};
use crate::core::models::molecule::Molecule;

/// Combines two aligned, parametrized end states into one dual-topology
/// molecule.
///
/// Mapped atoms become core atoms carrying both parameter sets; unmapped
/// atoms of `state_a` disappear (dummy in B) and unmapped atoms of `state_b`
/// appear (dummy in A). Atom order is `state_a`'s order followed by the
/// appearing atoms in `state_b`'s order, so the merged molecule has
/// `nA + nB - |mapping|` atoms. The bond list is the union of both inputs'
/// bonds expressed in merged indices.
///
/// # Errors
///
/// Fails if either input is unparametrized or the mapping indexes atoms
/// outside either molecule.
pub fn merge(
    state_a: &Molecule,
    state_b: &Molecule,
    mapping: &AtomMapping,
) -> Result<MergedMolecule, EngineError> {
    mapping.validate_for(state_a, state_b)?;
    if !state_a.is_parametrized() {
        return Err(EngineError::Merge(format!(
            "molecule '{}' is not parametrized",
            state_a.name
        )));
    }
    if !state_b.is_parametrized() {
        return Err(EngineError::Merge(format!(
            "molecule '{}' is not parametrized",
            state_b.name
        )));
    }

    let mut merged = MergedMolecule::new(&format!("{}~{}", state_a.name, state_b.name));

    // A atoms keep their order; mapped ones become core.
    let mut b_to_merged = vec![None; state_b.atom_count()];
    for (index_a, _, atom_a) in state_a.atoms_iter() {
        let perturbed = match mapping.get(index_a) {
            Some(index_b) => {
                let atom_b = state_b
                    .atom_by_index(index_b)
                    .ok_or_else(|| EngineError::Merge(format!("atom index {index_b} out of range")))?;
                b_to_merged[index_b] = Some(merged.atom_count());
                PerturbedAtom {
                    name: atom_a.name.clone(),
                    position: atom_a.position,
                    mutation: Mutation::Core,
                    state_a: EndStateAtom::from_atom(atom_a),
                    state_b: EndStateAtom::from_atom(atom_b),
                }
            }
            None => PerturbedAtom {
                name: atom_a.name.clone(),
                position: atom_a.position,
                mutation: Mutation::Disappearing,
                state_a: EndStateAtom::from_atom(atom_a),
                state_b: EndStateAtom::dummy(),
            },
        };
        merged.push_atom(perturbed);
    }

    // Unmapped B atoms are appended as appearing atoms.
    for (index_b, _, atom_b) in state_b.atoms_iter() {
        if b_to_merged[index_b].is_some() {
            continue;
        }
        b_to_merged[index_b] = Some(merged.atom_count());
        merged.push_atom(PerturbedAtom {
            name: atom_b.name.clone(),
            position: atom_b.position,
            mutation: Mutation::Appearing,
            state_a: EndStateAtom::dummy(),
            state_b: EndStateAtom::from_atom(atom_b),
        });
    }

    for bond in state_a.bonds() {
        let (Some(i), Some(j)) = (
            state_a.index_of(bond.atom1_id),
            state_a.index_of(bond.atom2_id),
        ) else {
            continue;
        };
        merged.add_bond(i, j, bond.order);
    }
    for bond in state_b.bonds() {
        let (Some(i), Some(j)) = (
            state_b.index_of(bond.atom1_id),
            state_b.index_of(bond.atom2_id),
        ) else {
            continue;
        };
        let (Some(mi), Some(mj)) = (b_to_merged[i], b_to_merged[j]) else {
            continue;
        };
        merged.add_bond(mi, mj, bond.order);
    }

    let charge_drift =
        (merged.total_charge(EndState::A) - merged.total_charge(EndState::B)).abs();
    if charge_drift > 1e-6 {
        warn!(
            charge_drift,
            "end states carry different total charges; the alchemical path is not charge-neutral"
        );
    }

    debug!(
        atoms = merged.atom_count(),
        core = merged.count_mutation(Mutation::Core),
        disappearing = merged.count_mutation(Mutation::Disappearing),
        appearing = merged.count_mutation(Mutation::Appearing),
        "merge complete"
    );
    Ok(merged)
}
