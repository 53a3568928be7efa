use super::element::Element;
use nalgebra::Point3;

/// Caches Lennard-Jones parameters for an atom after parametrization.
///
/// Storing the parameters on the atom avoids repeated force-field table
/// lookups in the merge and input-writing stages, and gives dummy atoms a
/// natural "no interaction" representation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CachedLjParam {
    /// Lennard-Jones 12-6 parameters.
    LennardJones {
        /// The sigma parameter in Angstroms.
        sigma: f64,
        /// The well depth (epsilon) in kcal/mol.
        epsilon: f64,
    },
    /// No parameters assigned (unparametrized or dummy atom).
    #[default]
    None,
}

/// Represents an atom in a ligand with its properties and parameters.
///
/// This struct holds the identity, coordinates, and force-field parameters of
/// a single atom. Atoms are created from structure files with only name,
/// element, position, and (for MOL2 input) partial charge populated; the
/// remaining fields are filled in by the parametrization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "C1", "H12").
    pub name: String,
    /// The chemical element of the atom.
    pub element: Element,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The assigned force-field atom type (e.g., "c3", "os"); empty until
    /// parametrized.
    pub force_field_type: String,
    /// The atomic mass in g/mol.
    pub mass: f64,
    /// Cached Lennard-Jones parameters.
    pub lj_param: CachedLjParam,
}

impl Atom {
    /// Creates a new `Atom` with default values for the parametrized fields.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `element` - The chemical element.
    /// * `position` - The 3D coordinates in Angstroms.
    pub fn new(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element,
            position,
            partial_charge: 0.0,
            force_field_type: String::new(),
            mass: element.mass(),
            lj_param: CachedLjParam::None,
        }
    }

    /// Returns `true` once a force-field type and Lennard-Jones parameters
    /// have been assigned.
    pub fn is_parametrized(&self) -> bool {
        !self.force_field_type.is_empty() && self.lj_param != CachedLjParam::None
    }
}
