use tracing::debug;

use super::error::EngineError;
use crate::core::models::mapping::AtomMapping;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{calculate_rmsd, kabsch_superposition};

/// Minimum number of mapped pairs needed to determine a rigid rotation.
const MIN_ANCHOR_PAIRS: usize = 3;

/// Rigidly superposes `mobile` onto `reference` using mapped atom pairs as
/// anchors, mutating the positions of `mobile` in place.
///
/// The optimal rotation is found with the Kabsch algorithm over the mapped
/// pairs; unmapped atoms ride along with the rigid-body transform. Returns
/// the post-alignment RMSD over the mapped pairs, in Angstroms.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientAnchors`] when fewer than three pairs
/// are mapped, and [`EngineError::InvalidMapping`] when the mapping indexes
/// atoms outside either molecule.
pub fn align(
    mobile: &mut Molecule,
    reference: &Molecule,
    mapping: &AtomMapping,
) -> Result<f64, EngineError> {
    mapping.validate_for(mobile, reference)?;
    if mapping.len() < MIN_ANCHOR_PAIRS {
        return Err(EngineError::InsufficientAnchors {
            required: MIN_ANCHOR_PAIRS,
            found: mapping.len(),
        });
    }

    let mut mobile_anchors = Vec::with_capacity(mapping.len());
    let mut reference_anchors = Vec::with_capacity(mapping.len());
    for (from, to) in mapping.iter() {
        // validate_for guarantees both indices resolve.
        if let (Some(atom_m), Some(atom_r)) =
            (mobile.atom_by_index(from), reference.atom_by_index(to))
        {
            mobile_anchors.push(atom_m.position);
            reference_anchors.push(atom_r.position);
        }
    }

    let transform = kabsch_superposition(&mobile_anchors, &reference_anchors).ok_or(
        EngineError::InsufficientAnchors {
            required: MIN_ANCHOR_PAIRS,
            found: mapping.len(),
        },
    )?;

    mobile.transform_positions(|p| transform.apply(p));

    let aligned: Vec<_> = mobile_anchors.iter().map(|p| transform.apply(p)).collect();
    let rmsd = calculate_rmsd(&aligned, &reference_anchors).unwrap_or(0.0);
    debug!(rmsd, pairs = mapping.len(), "alignment complete");
    Ok(rmsd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use nalgebra::{Point3, Rotation3, Vector3};

    fn tetrahedron(name: &str) -> Molecule {
        let mut mol = Molecule::new(name);
        mol.add_atom("C1", Element::C, Point3::new(0.0, 0.0, 0.0));
        mol.add_atom("C2", Element::C, Point3::new(1.5, 0.0, 0.0));
        mol.add_atom("C3", Element::C, Point3::new(0.0, 1.5, 0.0));
        mol.add_atom("C4", Element::C, Point3::new(0.0, 0.0, 1.5));
        mol
    }

    fn identity_mapping(n: usize) -> AtomMapping {
        AtomMapping::from_pairs((0..n).map(|i| (i, i))).unwrap()
    }

    #[test]
    fn aligning_a_displaced_copy_recovers_zero_rmsd() {
        let reference = tetrahedron("REF");
        let mut mobile = tetrahedron("MOB");
        let rotation = Rotation3::from_euler_angles(0.4, -0.2, 1.1);
        mobile.transform_positions(|p| rotation * p + Vector3::new(3.0, -2.0, 5.0));

        let rmsd = align(&mut mobile, &reference, &identity_mapping(4)).unwrap();
        assert!(rmsd < 1e-9);

        for i in 0..4 {
            let pm = mobile.atom_by_index(i).unwrap().position;
            let pr = reference.atom_by_index(i).unwrap().position;
            assert!((pm - pr).norm() < 1e-9);
        }
    }

    #[test]
    fn unmapped_atoms_ride_along() {
        let reference = tetrahedron("REF");
        let mut mobile = tetrahedron("MOB");
        mobile.transform_positions(|p| p + Vector3::new(10.0, 0.0, 0.0));

        // Only three of four atoms anchor the fit.
        align(&mut mobile, &reference, &identity_mapping(3)).unwrap();
        let pm = mobile.atom_by_index(3).unwrap().position;
        let pr = reference.atom_by_index(3).unwrap().position;
        assert!((pm - pr).norm() < 1e-9);
    }

    #[test]
    fn too_few_anchors_are_rejected() {
        let reference = tetrahedron("REF");
        let mut mobile = tetrahedron("MOB");

        let result = align(&mut mobile, &reference, &identity_mapping(2));
        assert!(matches!(
            result,
            Err(EngineError::InsufficientAnchors {
                required: 3,
                found: 2
            })
        ));
    }
}
