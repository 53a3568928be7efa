use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LjParam {
    /// Sigma in Angstroms.
    pub sigma: f64,
    /// Well depth (epsilon) in kcal/mol.
    pub epsilon: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobalParams {
    /// Human-readable force-field name (e.g. "gaff-lite").
    pub name: String,
    /// Combining rule: "lorentz-berthelot" or "geometric".
    pub combining_rule: String,
    /// 1-4 Lennard-Jones scale factor.
    pub fudge_lj: f64,
    /// 1-4 electrostatic scale factor.
    pub fudge_qq: f64,
}

/// One atom-typing rule. Rules are evaluated in file order; the first match
/// wins.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TypingRule {
    /// Element symbol the rule applies to.
    pub element: String,
    /// Required number of bonded heavy atoms; omitted means any.
    pub degree: Option<usize>,
    /// Required element symbol among bonded neighbors; omitted means any.
    pub neighbor: Option<String>,
    /// The force-field type assigned on match.
    #[serde(rename = "type")]
    pub ff_type: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct ForcefieldFile {
    globals: GlobalParams,
    lj: HashMap<String, LjParam>,
    #[serde(default)]
    typing: Vec<TypingRule>,
}

#[derive(Debug, Deserialize, Clone)]
struct ChargeRecord {
    ff_type: String,
    charge: f64,
}

/// A loaded force field: globals, Lennard-Jones tables, typing rules, and
/// fallback partial charges.
#[derive(Debug, Clone)]
pub struct Forcefield {
    pub globals: GlobalParams,
    pub lj: HashMap<String, LjParam>,
    pub typing: Vec<TypingRule>,
    pub fallback_charges: HashMap<String, f64>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl Forcefield {
    /// Loads a force field from its TOML parameter file and CSV fallback
    /// charge table.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read or parsed.
    pub fn load(params_path: &Path, charges_path: &Path) -> Result<Self, ParamLoadError> {
        let file = Self::load_params(params_path)?;
        let fallback_charges = Self::load_charge_csv(charges_path)?;

        Ok(Self {
            globals: file.globals,
            lj: file.lj,
            typing: file.typing,
            fallback_charges,
        })
    }

    /// Looks up the Lennard-Jones parameters for a force-field type.
    pub fn lj_for(&self, ff_type: &str) -> Option<LjParam> {
        self.lj.get(ff_type).copied()
    }

    fn load_params(path: &Path) -> Result<ForcefieldFile, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    fn load_charge_csv(path: &Path) -> Result<HashMap<String, f64>, ParamLoadError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ParamLoadError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut charges = HashMap::new();
        for result in reader.deserialize::<ChargeRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            charges.insert(record.ff_type, record.charge);
        }
        Ok(charges)
    }
}
