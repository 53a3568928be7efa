use crate::cli::SetupArgs;
use crate::error::{CliError, Result};
use fepforge::engine::config::{Engine, MappingConfig, ProtocolBuilder, SolvationConfig};
use fepforge::workflows::setup::SetupConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_TIMESTEP_FS: f64 = 2.0;
const DEFAULT_RUNTIME_PS: f64 = 1000.0;
const DEFAULT_NUM_WINDOWS: usize = 11;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialForcefieldConfig {
    #[serde(rename = "params-path")]
    params_path: Option<PathBuf>,
    #[serde(rename = "charges-path")]
    charges_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMappingConfig {
    #[serde(rename = "match-hydrogens")]
    match_hydrogens: Option<bool>,
    #[serde(rename = "max-steps")]
    max_steps: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSolvationConfig {
    #[serde(rename = "box-lengths")]
    box_lengths: Option<[f64; 3]>,
    padding: Option<f64>,
    spacing: Option<f64>,
    #[serde(rename = "min-distance")]
    min_distance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialProtocolConfig {
    engine: Option<String>,
    #[serde(rename = "timestep-fs")]
    timestep_fs: Option<f64>,
    #[serde(rename = "runtime-ps")]
    runtime_ps: Option<f64>,
    #[serde(rename = "num-windows")]
    num_windows: Option<usize>,
}

/// The job file: every section and field is optional so the file only needs
/// to state what differs from the defaults or the CLI flags.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSetupConfig {
    forcefield: Option<PartialForcefieldConfig>,
    mapping: Option<PartialMappingConfig>,
    solvation: Option<PartialSolvationConfig>,
    protocol: Option<PartialProtocolConfig>,
}

impl PartialSetupConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final pipeline configuration. CLI flags win over file
    /// values, which win over the built-in defaults.
    pub fn merge_with_cli(mut self, args: &SetupArgs) -> Result<SetupConfig> {
        let ff_config = self.forcefield.take().unwrap_or_default();
        let mapping_config = self.mapping.take().unwrap_or_default();
        let solvation_config = self.solvation.take().unwrap_or_default();
        let protocol_config = self.protocol.take().unwrap_or_default();

        let forcefield_path = args
            .forcefield_path
            .clone()
            .or(ff_config.params_path)
            .ok_or_else(|| {
                CliError::Config(
                    "A value for 'forcefield.params-path' is required either in the config file or via --forcefield-path.".to_string(),
                )
            })?;
        let charges_path = args
            .charges_path
            .clone()
            .or(ff_config.charges_path)
            .ok_or_else(|| {
                CliError::Config(
                    "A value for 'forcefield.charges-path' is required either in the config file or via --charges-path.".to_string(),
                )
            })?;

        let engine = match args.engine.as_deref().or(protocol_config.engine.as_deref()) {
            Some(name) => name
                .parse::<Engine>()
                .map_err(|e| CliError::Argument(e.to_string()))?,
            None => Engine::Somd,
        };
        let protocol = ProtocolBuilder::new()
            .timestep_fs(
                args.timestep_fs
                    .or(protocol_config.timestep_fs)
                    .unwrap_or(DEFAULT_TIMESTEP_FS),
            )
            .runtime_ps(
                args.runtime_ps
                    .or(protocol_config.runtime_ps)
                    .unwrap_or(DEFAULT_RUNTIME_PS),
            )
            .num_windows(
                args.num_windows
                    .or(protocol_config.num_windows)
                    .unwrap_or(DEFAULT_NUM_WINDOWS),
            )
            .engine(engine)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let defaults = MappingConfig::default();
        let mapping = MappingConfig {
            match_hydrogens: args.match_hydrogens
                || mapping_config.match_hydrogens.unwrap_or(false),
            max_steps: mapping_config.max_steps.unwrap_or(defaults.max_steps),
        };

        let defaults = SolvationConfig::default();
        let box_lengths = args
            .box_length
            .map(|edge| [edge, edge, edge])
            .or(solvation_config.box_lengths);
        let solvation = SolvationConfig {
            box_lengths,
            padding: args
                .padding
                .or(solvation_config.padding)
                .unwrap_or(defaults.padding),
            spacing: solvation_config.spacing.unwrap_or(defaults.spacing),
            min_distance: solvation_config
                .min_distance
                .unwrap_or(defaults.min_distance),
        };

        Ok(SetupConfig {
            ligand_a_path: args.ligand_a.clone(),
            ligand_b_path: args.ligand_b.clone(),
            forcefield_path,
            charges_path,
            mapping,
            solvation,
            protocol,
            output_dir: args.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("job.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn parse_setup_args(extra: &[&str]) -> SetupArgs {
        let mut argv = vec![
            "fepforge", "setup", "-a", "a.pdb", "-b", "b.pdb", "-o", "out",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Setup(args) => args,
            _ => panic!("Expected 'setup' subcommand"),
        }
    }

    #[test]
    fn file_values_fill_in_missing_cli_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            dir.path(),
            r#"
            [forcefield]
            params-path = "ff/gaff-lite.toml"
            charges-path = "ff/charges.csv"

            [protocol]
            engine = "gromacs"
            num-windows = 21

            [solvation]
            padding = 12.0
            "#,
        );

        let args = parse_setup_args(&[]);
        let partial = PartialSetupConfig::from_file(&config_path).unwrap();
        let config = partial.merge_with_cli(&args).unwrap();

        assert_eq!(config.forcefield_path, PathBuf::from("ff/gaff-lite.toml"));
        assert_eq!(config.protocol.engine, Engine::Gromacs);
        assert_eq!(config.protocol.num_windows, 21);
        assert_eq!(config.protocol.timestep_fs, DEFAULT_TIMESTEP_FS);
        assert_eq!(config.solvation.padding, 12.0);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            dir.path(),
            r#"
            [forcefield]
            params-path = "ff/gaff-lite.toml"
            charges-path = "ff/charges.csv"

            [protocol]
            engine = "gromacs"
            num-windows = 21
            "#,
        );

        let args = parse_setup_args(&["--engine", "somd", "-n", "5", "--box-length", "30.0"]);
        let partial = PartialSetupConfig::from_file(&config_path).unwrap();
        let config = partial.merge_with_cli(&args).unwrap();

        assert_eq!(config.protocol.engine, Engine::Somd);
        assert_eq!(config.protocol.num_windows, 5);
        assert_eq!(config.solvation.box_lengths, Some([30.0, 30.0, 30.0]));
    }

    #[test]
    fn missing_forcefield_is_a_config_error() {
        let args = parse_setup_args(&[]);
        let result = PartialSetupConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_engine_is_an_argument_error() {
        let args = parse_setup_args(&[
            "--forcefield-path",
            "ff.toml",
            "--charges-path",
            "q.csv",
            "--engine",
            "amber",
        ]);
        let result = PartialSetupConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn unknown_keys_in_file_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            dir.path(),
            r#"
            [protocol]
            lambda-count = 9
            "#,
        );

        let result = PartialSetupConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
