use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// The simulation engine the generated inputs target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Somd,
    Gromacs,
}

impl FromStr for Engine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "somd" => Ok(Engine::Somd),
            "gromacs" => Ok(Engine::Gromacs),
            other => Err(ConfigError::InvalidParameter {
                parameter: "engine",
                reason: format!("unknown engine '{other}' (expected 'somd' or 'gromacs')"),
            }),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Somd => write!(f, "somd"),
            Engine::Gromacs => write!(f, "gromacs"),
        }
    }
}

/// A free-energy simulation protocol: integration settings plus the lambda
/// schedule that discretizes the alchemical path.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    pub timestep_fs: f64,
    pub runtime_ps: f64,
    pub num_windows: usize,
    pub engine: Engine,
}

impl Protocol {
    /// Evenly spaced lambda values from 0 to 1 inclusive.
    pub fn lambda_values(&self) -> Vec<f64> {
        let n = self.num_windows;
        (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
    }

    /// Number of integration steps per window.
    pub fn steps_per_window(&self) -> u64 {
        (self.runtime_ps * 1000.0 / self.timestep_fs).round() as u64
    }
}

#[derive(Default)]
pub struct ProtocolBuilder {
    timestep_fs: Option<f64>,
    runtime_ps: Option<f64>,
    num_windows: Option<usize>,
    engine: Option<Engine>,
}

impl ProtocolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestep_fs(mut self, timestep: f64) -> Self {
        self.timestep_fs = Some(timestep);
        self
    }

    pub fn runtime_ps(mut self, runtime: f64) -> Self {
        self.runtime_ps = Some(runtime);
        self
    }

    pub fn num_windows(mut self, n: usize) -> Self {
        self.num_windows = Some(n);
        self
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Protocol, ConfigError> {
        let timestep_fs = self
            .timestep_fs
            .ok_or(ConfigError::MissingParameter("timestep_fs"))?;
        let runtime_ps = self
            .runtime_ps
            .ok_or(ConfigError::MissingParameter("runtime_ps"))?;
        let num_windows = self
            .num_windows
            .ok_or(ConfigError::MissingParameter("num_windows"))?;
        let engine = self.engine.ok_or(ConfigError::MissingParameter("engine"))?;

        if timestep_fs <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "timestep_fs",
                reason: "must be positive".into(),
            });
        }
        if runtime_ps <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "runtime_ps",
                reason: "must be positive".into(),
            });
        }
        if num_windows < 2 {
            return Err(ConfigError::InvalidParameter {
                parameter: "num_windows",
                reason: "at least two windows are needed to span lambda 0 to 1".into(),
            });
        }

        Ok(Protocol {
            timestep_fs,
            runtime_ps,
            num_windows,
            engine,
        })
    }
}

/// Controls the maximum-common-substructure search.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// Whether hydrogens participate in the search (heavy atoms only by
    /// default; hydrogen placement is too degenerate to map reliably).
    pub match_hydrogens: bool,
    /// Upper bound on search states expanded before the best mapping found
    /// so far is returned.
    pub max_steps: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            match_hydrogens: false,
            max_steps: 100_000,
        }
    }
}

/// Controls solvation box construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvationConfig {
    /// Explicit box edge lengths in Angstroms; derived from the solute
    /// extent plus `padding` when absent.
    pub box_lengths: Option<[f64; 3]>,
    /// Minimum distance from any solute atom to the box face, in Angstroms.
    pub padding: f64,
    /// Water oxygen grid spacing in Angstroms.
    pub spacing: f64,
    /// Waters closer than this to any solute atom are discarded, in
    /// Angstroms.
    pub min_distance: f64,
}

impl Default for SolvationConfig {
    fn default() -> Self {
        Self {
            box_lengths: None,
            padding: 10.0,
            spacing: 3.1,
            min_distance: 2.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ProtocolBuilder {
        ProtocolBuilder::new()
            .timestep_fs(2.0)
            .runtime_ps(10.0)
            .num_windows(11)
            .engine(Engine::Somd)
    }

    #[test]
    fn build_succeeds_with_all_parameters() {
        let protocol = builder().build().unwrap();
        assert_eq!(protocol.num_windows, 11);
        assert_eq!(protocol.steps_per_window(), 5000);
    }

    #[test]
    fn build_fails_on_missing_parameter() {
        let result = ProtocolBuilder::new()
            .timestep_fs(2.0)
            .runtime_ps(10.0)
            .engine(Engine::Somd)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("num_windows")));
    }

    #[test]
    fn build_rejects_nonpositive_timestep() {
        let result = builder().timestep_fs(0.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                parameter: "timestep_fs",
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_single_window() {
        let result = builder().num_windows(1).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                parameter: "num_windows",
                ..
            })
        ));
    }

    #[test]
    fn lambda_schedule_spans_unit_interval() {
        let protocol = builder().num_windows(5).build().unwrap();
        let lambdas = protocol.lambda_values();
        assert_eq!(lambdas.len(), 5);
        assert_eq!(lambdas[0], 0.0);
        assert_eq!(*lambdas.last().unwrap(), 1.0);
        assert!(lambdas.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn engine_parses_case_insensitively() {
        assert_eq!("SOMD".parse::<Engine>().unwrap(), Engine::Somd);
        assert_eq!("gromacs".parse::<Engine>().unwrap(), Engine::Gromacs);
        assert!("amber".parse::<Engine>().is_err());
    }
}
