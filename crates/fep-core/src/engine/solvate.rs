use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use super::config::SolvationConfig;
use super::error::EngineError;
use crate::core::models::system::{PeriodicBox, Solute, System, WaterMolecule};

// TIP3P internal geometry.
const OH_BOND: f64 = 0.9572;
const HOH_ANGLE_DEG: f64 = 104.52;

/// Immerses a solute in a box of TIP3P water.
///
/// The box is either the explicitly requested one or the solute's bounding
/// box grown by the configured padding on every face. The solute is shifted
/// so its bounding-box center sits at the box center, then water oxygens are
/// placed on a regular grid and any water overlapping the solute is
/// discarded. The number of retained waters is returned.
///
/// # Errors
///
/// Returns [`EngineError::SoluteTooLarge`] when an explicit box cannot
/// contain the solute.
pub fn solvate(system: &mut System, config: &SolvationConfig) -> Result<usize, EngineError> {
    let positions = system.solute.positions();
    if positions.is_empty() {
        return Err(EngineError::Solvation(
            "cannot solvate an empty solute".into(),
        ));
    }

    let (min, max) = bounding_box(&positions);
    let extent = max - min;

    let lengths = match config.box_lengths {
        Some(edges) => {
            for axis in 0..3 {
                if extent[axis] >= edges[axis] {
                    return Err(EngineError::SoluteTooLarge {
                        extent: extent[axis],
                        edge: edges[axis],
                    });
                }
            }
            Vector3::new(edges[0], edges[1], edges[2])
        }
        None => extent + Vector3::repeat(2.0 * config.padding),
    };
    let boundary = PeriodicBox::new(lengths.x, lengths.y, lengths.z);

    // Center the solute's bounding box in the box.
    let bbox_center = min + extent / 2.0;
    let shift = Point3::from(lengths / 2.0) - bbox_center;
    translate_solute(&mut system.solute, shift);
    let solute_positions = system.solute.positions();

    let mut waters = Vec::new();
    let counts = [
        (lengths.x / config.spacing).floor() as usize,
        (lengths.y / config.spacing).floor() as usize,
        (lengths.z / config.spacing).floor() as usize,
    ];
    let min_distance_sq = config.min_distance * config.min_distance;

    for ix in 0..counts[0] {
        for iy in 0..counts[1] {
            for iz in 0..counts[2] {
                let oxygen = Point3::new(
                    (ix as f64 + 0.5) * config.spacing,
                    (iy as f64 + 0.5) * config.spacing,
                    (iz as f64 + 0.5) * config.spacing,
                );
                if !boundary.contains(&oxygen) {
                    continue;
                }
                let overlaps = solute_positions
                    .iter()
                    .any(|p| (p - oxygen).norm_squared() < min_distance_sq);
                if overlaps {
                    continue;
                }
                waters.push(place_water(oxygen));
            }
        }
    }

    debug!(
        box_x = lengths.x,
        box_y = lengths.y,
        box_z = lengths.z,
        "solvation box constructed"
    );
    info!(waters = waters.len(), "solute solvated");

    let count = waters.len();
    system.waters = waters;
    system.boundary = Some(boundary);
    Ok(count)
}

fn bounding_box(positions: &[Point3<f64>]) -> (Point3<f64>, Point3<f64>) {
    let mut min = positions[0];
    let mut max = positions[0];
    for p in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

fn translate_solute(solute: &mut Solute, shift: Vector3<f64>) {
    match solute {
        Solute::Molecule(mol) => mol.transform_positions(|p| p + shift),
        Solute::Perturbable(merged) => merged.transform_positions(|p| p + shift),
    }
}

/// Builds a TIP3P water with both hydrogens in the xy plane of the oxygen.
fn place_water(oxygen: Point3<f64>) -> WaterMolecule {
    let half_angle = (HOH_ANGLE_DEG / 2.0).to_radians();
    let dx = OH_BOND * half_angle.sin();
    let dy = OH_BOND * half_angle.cos();
    WaterMolecule {
        oxygen,
        hydrogen1: oxygen + Vector3::new(dx, dy, 0.0),
        hydrogen2: oxygen + Vector3::new(-dx, dy, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use crate::core::models::molecule::Molecule;

    fn small_solute() -> System {
        let mut mol = Molecule::new("ETH");
        mol.add_atom("C1", Element::C, Point3::new(0.0, 0.0, 0.0));
        mol.add_atom("C2", Element::C, Point3::new(1.54, 0.0, 0.0));
        System::vacuum(Solute::Molecule(mol))
    }

    #[test]
    fn solvation_fills_the_box_and_centers_the_solute() {
        let mut system = small_solute();
        let count = solvate(&mut system, &SolvationConfig::default()).unwrap();

        assert!(count > 0);
        assert_eq!(system.water_count(), count);
        let boundary = system.boundary.as_ref().unwrap();
        // default padding of 10 A on each face
        assert!((boundary.lengths.x - 21.54).abs() < 1e-9);
        assert!((boundary.lengths.y - 20.0).abs() < 1e-9);

        // Solute bounding-box center sits at the box center.
        let positions = system.solute.positions();
        let mid = (positions[0].coords + positions[1].coords) / 2.0;
        assert!((mid.x - boundary.lengths.x / 2.0).abs() < 1e-9);
        assert!((mid.y - boundary.lengths.y / 2.0).abs() < 1e-9);
    }

    #[test]
    fn no_water_overlaps_the_solute() {
        let mut system = small_solute();
        let config = SolvationConfig::default();
        solvate(&mut system, &config).unwrap();

        let solute_positions = system.solute.positions();
        for water in &system.waters {
            for p in &solute_positions {
                assert!((p - water.oxygen).norm() >= config.min_distance);
            }
        }
    }

    #[test]
    fn all_waters_lie_inside_the_box() {
        let mut system = small_solute();
        solvate(&mut system, &SolvationConfig::default()).unwrap();

        let boundary = system.boundary.clone().unwrap();
        for water in &system.waters {
            assert!(boundary.contains(&water.oxygen));
        }
    }

    #[test]
    fn explicit_box_too_small_for_solute_is_rejected() {
        let mut system = small_solute();
        let config = SolvationConfig {
            box_lengths: Some([1.0, 10.0, 10.0]),
            ..SolvationConfig::default()
        };

        assert!(matches!(
            solvate(&mut system, &config),
            Err(EngineError::SoluteTooLarge { .. })
        ));
    }

    #[test]
    fn empty_solute_is_reported_as_a_solvation_error() {
        let mut system = System::vacuum(Solute::Molecule(Molecule::new("EMP")));
        assert!(matches!(
            solvate(&mut system, &SolvationConfig::default()),
            Err(EngineError::Solvation(_))
        ));
    }

    #[test]
    fn water_geometry_matches_tip3p() {
        let water = place_water(Point3::origin());
        let oh1 = (water.hydrogen1 - water.oxygen).norm();
        let oh2 = (water.hydrogen2 - water.oxygen).norm();
        assert!((oh1 - OH_BOND).abs() < 1e-9);
        assert!((oh2 - OH_BOND).abs() < 1e-9);

        let v1 = (water.hydrogen1 - water.oxygen).normalize();
        let v2 = (water.hydrogen2 - water.oxygen).normalize();
        let angle = v1.dot(&v2).acos().to_degrees();
        assert!((angle - HOH_ANGLE_DEG).abs() < 1e-6);
    }
}
