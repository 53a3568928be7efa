use super::merged::MergedMolecule;
use super::molecule::Molecule;
use nalgebra::{Point3, Vector3};

/// An orthorhombic periodic simulation box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    /// Edge lengths along x, y, z in Angstroms.
    pub lengths: Vector3<f64>,
}

impl PeriodicBox {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            lengths: Vector3::new(x, y, z),
        }
    }

    pub fn cubic(edge: f64) -> Self {
        Self::new(edge, edge, edge)
    }

    /// Returns `true` if the point lies inside `[0, L)` on every axis.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| p[i] >= 0.0 && p[i] < self.lengths[i])
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }
}

/// One explicit water molecule (three-point model).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterMolecule {
    pub oxygen: Point3<f64>,
    pub hydrogen1: Point3<f64>,
    pub hydrogen2: Point3<f64>,
}

/// The solute carried by a [`System`]: either a plain molecule or a
/// perturbable dual-topology molecule.
#[derive(Debug, Clone)]
pub enum Solute {
    Molecule(Molecule),
    Perturbable(MergedMolecule),
}

impl Solute {
    pub fn atom_count(&self) -> usize {
        match self {
            Solute::Molecule(m) => m.atom_count(),
            Solute::Perturbable(m) => m.atom_count(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Solute::Molecule(m) => &m.name,
            Solute::Perturbable(m) => &m.name,
        }
    }

    /// Iterates over the positions of all solute atoms.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        match self {
            Solute::Molecule(m) => m.atoms_iter().map(|(_, _, a)| a.position).collect(),
            Solute::Perturbable(m) => m.atoms().iter().map(|a| a.position).collect(),
        }
    }
}

/// A solute embedded (optionally) in explicit solvent inside a periodic box.
#[derive(Debug, Clone)]
pub struct System {
    pub solute: Solute,
    pub waters: Vec<WaterMolecule>,
    pub boundary: Option<PeriodicBox>,
}

impl System {
    /// Wraps a bare solute with no solvent or box.
    pub fn vacuum(solute: Solute) -> Self {
        Self {
            solute,
            waters: Vec::new(),
            boundary: None,
        }
    }

    pub fn water_count(&self) -> usize {
        self.waters.len()
    }

    pub fn is_solvated(&self) -> bool {
        !self.waters.is_empty()
    }

    /// Total number of atoms, counting three per water molecule.
    pub fn atom_count(&self) -> usize {
        self.solute.atom_count() + 3 * self.waters.len()
    }
}
