use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;

/// Represents a chemical element supported by the preparation pipeline.
///
/// The set covers the elements found in drug-like ligands plus [`Element::Dummy`],
/// the placeholder species used by merged molecules for atoms that exist in
/// only one alchemical end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    C,
    N,
    O,
    F,
    P,
    S,
    Cl,
    Br,
    I,
    /// Placeholder for an atom absent in one end state of a perturbation.
    Dummy,
}

static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "P" => Element::P,
    "S" => Element::S,
    "CL" => Element::Cl,
    "BR" => Element::Br,
    "I" => Element::I,
    "DU" => Element::Dummy,
    "XX" => Element::Dummy,
};

impl Element {
    /// Returns the standard chemical symbol of the element.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
            Element::Dummy => "Du",
        }
    }

    /// Returns the standard atomic mass in g/mol.
    ///
    /// Dummy atoms report zero mass; engine writers substitute the mass of
    /// the partner end state where a physical mass is required.
    pub fn mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::Br => 79.904,
            Element::I => 126.904,
            Element::Dummy => 0.0,
        }
    }

    /// Returns `true` for every element except hydrogen and dummies.
    pub fn is_heavy(&self) -> bool {
        !matches!(self, Element::H | Element::Dummy)
    }

    /// Parses an element from the leading symbol of a SYBYL atom type
    /// (e.g. `"C.3"`, `"N.ar"`, `"Cl"`).
    pub fn from_sybyl_type(s: &str) -> Option<Self> {
        let symbol = s.split('.').next().unwrap_or("");
        symbol.parse().ok()
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses a chemical symbol, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `()` if the string is not a recognized symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ELEMENT_SYMBOLS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_common_symbols() {
        assert_eq!("C".parse(), Ok(Element::C));
        assert_eq!("N".parse(), Ok(Element::N));
        assert_eq!("Cl".parse(), Ok(Element::Cl));
        assert_eq!("BR".parse(), Ok(Element::Br));
    }

    #[test]
    fn from_str_is_case_insensitive_and_trims() {
        assert_eq!(" cl ".parse(), Ok(Element::Cl));
        assert_eq!("h".parse(), Ok(Element::H));
    }

    #[test]
    fn from_str_rejects_unknown_symbols() {
        assert_eq!(Element::from_str("Xq"), Err(()));
        assert_eq!(Element::from_str(""), Err(()));
    }

    #[test]
    fn from_sybyl_type_strips_hybridization_suffix() {
        assert_eq!(Element::from_sybyl_type("C.3"), Some(Element::C));
        assert_eq!(Element::from_sybyl_type("N.ar"), Some(Element::N));
        assert_eq!(Element::from_sybyl_type("Cl"), Some(Element::Cl));
        assert_eq!(Element::from_sybyl_type("Q.2"), None);
    }

    #[test]
    fn dummy_is_not_heavy_and_has_zero_mass() {
        assert!(!Element::Dummy.is_heavy());
        assert!(!Element::H.is_heavy());
        assert!(Element::C.is_heavy());
        assert_eq!(Element::Dummy.mass(), 0.0);
    }

    #[test]
    fn display_matches_symbol() {
        assert_eq!(Element::Cl.to_string(), "Cl");
        assert_eq!(Element::Dummy.to_string(), "Du");
    }
}
