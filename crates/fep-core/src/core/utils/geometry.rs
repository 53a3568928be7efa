use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// A rigid-body transform: rotate about the origin, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation * p + self.translation
    }
}

pub fn centroid(coords: &[Point3<f64>]) -> Option<Point3<f64>> {
    if coords.is_empty() {
        return None;
    }
    let sum = coords
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / coords.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Computes the Kabsch superposition moving `mobile` onto `reference`.
///
/// Both slices are paired coordinates (same length, index i of one
/// corresponds to index i of the other). The returned transform minimizes the
/// RMSD between the transformed mobile points and the reference points, with
/// the usual determinant correction so the rotation is proper (no
/// reflection). Returns `None` for fewer than three pairs or mismatched
/// lengths.
pub fn kabsch_superposition(
    mobile: &[Point3<f64>],
    reference: &[Point3<f64>],
) -> Option<RigidTransform> {
    if mobile.len() != reference.len() || mobile.len() < 3 {
        return None;
    }

    let centroid_mobile = centroid(mobile)?;
    let centroid_reference = centroid(reference)?;

    let mut covariance = Matrix3::zeros();
    for (m, r) in mobile.iter().zip(reference.iter()) {
        let dm = m - centroid_mobile;
        let dr = r - centroid_reference;
        covariance += dr * dm.transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let d = (u * v_t).determinant().signum();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);

    let translation = centroid_reference.coords - rotation * centroid_mobile.coords;
    Some(RigidTransform {
        rotation,
        translation,
    })
}
