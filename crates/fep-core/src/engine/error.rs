use thiserror::Error;

use crate::core::forcefield::parameterization::ParameterizationError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::io::LoadError;
use crate::core::io::gro::GroError;
use crate::core::io::pert::PertError;
use crate::core::io::perturbable::PerturbableError;
use crate::core::io::top::TopError;
use crate::core::models::mapping::MappingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load structure: {source}")]
    Load {
        #[from]
        source: LoadError,
    },

    #[error("Force-field loading failed: {source}")]
    ForcefieldLoad {
        #[from]
        source: ParamLoadError,
    },

    #[error("Parametrization failed: {source}")]
    Parameterization {
        #[from]
        source: ParameterizationError,
    },

    #[error("Invalid atom mapping: {source}")]
    InvalidMapping {
        #[from]
        source: MappingError,
    },

    #[error("No common substructure found between '{molecule_a}' and '{molecule_b}'")]
    NoMappingFound {
        molecule_a: String,
        molecule_b: String,
    },

    #[error("Alignment requires at least {required} mapped atom pairs, found {found}")]
    InsufficientAnchors { required: usize, found: usize },

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Solvation failed: {0}")]
    Solvation(String),

    #[error("System solute is not perturbable; merge two end states first")]
    NotPerturbable,

    #[error(
        "Solute does not fit the requested box: extent {extent:.2} A exceeds box edge {edge:.2} A"
    )]
    SoluteTooLarge { extent: f64, edge: f64 },

    #[error("Failed to write {artifact}: {message}")]
    Output {
        artifact: &'static str,
        message: String,
    },
}

impl From<TopError> for EngineError {
    fn from(source: TopError) -> Self {
        EngineError::Output {
            artifact: "topology",
            message: source.to_string(),
        }
    }
}

impl From<PertError> for EngineError {
    fn from(source: PertError) -> Self {
        EngineError::Output {
            artifact: "perturbation file",
            message: source.to_string(),
        }
    }
}

impl From<PerturbableError> for EngineError {
    fn from(source: PerturbableError) -> Self {
        match source {
            PerturbableError::NotPerturbable => EngineError::NotPerturbable,
            other => EngineError::Output {
                artifact: "end-state files",
                message: other.to_string(),
            },
        }
    }
}

impl From<GroError> for EngineError {
    fn from(source: GroError) -> Self {
        EngineError::Output {
            artifact: "coordinate file",
            message: source.to_string(),
        }
    }
}
