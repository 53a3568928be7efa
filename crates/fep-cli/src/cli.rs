use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "fepforge - prepares alchemical free-energy perturbation inputs from a pair of ligand structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full setup pipeline: parametrize, map, align, merge, solvate,
    /// and write per-window simulation inputs.
    Setup(SetupArgs),
    /// Compute and print the atom mapping between two ligands without
    /// running the rest of the pipeline.
    Map(MapArgs),
}

/// Arguments for the `setup` subcommand.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Structure file of the lambda = 0 ligand (PDB or MOL2).
    #[arg(short = 'a', long = "ligand-a", required = true, value_name = "PATH")]
    pub ligand_a: PathBuf,

    /// Structure file of the lambda = 1 ligand (PDB or MOL2).
    #[arg(short = 'b', long = "ligand-b", required = true, value_name = "PATH")]
    pub ligand_b: PathBuf,

    /// Directory the lambda window directories are created under.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a job configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Forcefield Overrides ---
    /// Override the force-field parameter file (TOML).
    #[arg(long, value_name = "PATH")]
    pub forcefield_path: Option<PathBuf>,

    /// Override the fallback partial charge table (CSV).
    #[arg(long, value_name = "PATH")]
    pub charges_path: Option<PathBuf>,

    // --- Protocol Overrides ---
    /// Override the target simulation engine ('somd' or 'gromacs').
    #[arg(short, long, value_name = "NAME")]
    pub engine: Option<String>,

    /// Override the number of lambda windows.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_windows: Option<usize>,

    /// Override the per-window runtime in picoseconds.
    #[arg(long, value_name = "FLOAT")]
    pub runtime_ps: Option<f64>,

    /// Override the integration timestep in femtoseconds.
    #[arg(long, value_name = "FLOAT")]
    pub timestep_fs: Option<f64>,

    // --- Mapping Overrides ---
    /// Include hydrogens in the atom-mapping search.
    #[arg(long)]
    pub match_hydrogens: bool,

    // --- Solvation Overrides ---
    /// Override the cubic box edge length in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub box_length: Option<f64>,

    /// Override the solvent padding around the solute in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub padding: Option<f64>,
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Structure file of the first ligand (PDB or MOL2).
    #[arg(short = 'a', long = "ligand-a", required = true, value_name = "PATH")]
    pub ligand_a: PathBuf,

    /// Structure file of the second ligand (PDB or MOL2).
    #[arg(short = 'b', long = "ligand-b", required = true, value_name = "PATH")]
    pub ligand_b: PathBuf,

    /// Include hydrogens in the atom-mapping search.
    #[arg(long)]
    pub match_hydrogens: bool,

    /// Upper bound on search states expanded.
    #[arg(long, value_name = "INT")]
    pub max_steps: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_subcommand_parses_required_arguments() {
        let cli = Cli::parse_from([
            "fepforge", "setup", "-a", "a.pdb", "-b", "b.mol2", "-o", "out",
        ]);
        match cli.command {
            Commands::Setup(args) => {
                assert_eq!(args.ligand_a, PathBuf::from("a.pdb"));
                assert_eq!(args.ligand_b, PathBuf::from("b.mol2"));
                assert_eq!(args.output, PathBuf::from("out"));
                assert!(args.config.is_none());
            }
            _ => panic!("Expected 'setup' subcommand"),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from([
            "fepforge", "map", "-a", "a.pdb", "-b", "b.pdb", "-q", "-v",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn protocol_overrides_parse() {
        let cli = Cli::parse_from([
            "fepforge",
            "setup",
            "-a",
            "a.pdb",
            "-b",
            "b.pdb",
            "-o",
            "out",
            "--engine",
            "gromacs",
            "-n",
            "21",
            "--match-hydrogens",
        ]);
        match cli.command {
            Commands::Setup(args) => {
                assert_eq!(args.engine.as_deref(), Some("gromacs"));
                assert_eq!(args.num_windows, Some(21));
                assert!(args.match_hydrogens);
            }
            _ => panic!("Expected 'setup' subcommand"),
        }
    }
}
