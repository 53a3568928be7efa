use std::path::PathBuf;
use tracing::{info, instrument};

use crate::core::forcefield::parameterization::Parameterizer;
use crate::core::forcefield::params::Forcefield;
use crate::core::io::load_molecule;
use crate::core::io::perturbable::{EndStateFiles, save_perturbable};
use crate::core::models::mapping::AtomMapping;
use crate::core::models::merged::Mutation;
use crate::core::models::system::{Solute, System};
use crate::engine::align::align;
use crate::engine::config::{MappingConfig, Protocol, SolvationConfig};
use crate::engine::error::EngineError;
use crate::engine::leg::FreeEnergyLeg;
use crate::engine::mapping::match_atoms;
use crate::engine::merge::merge;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solvate::solvate;

/// Everything needed to turn two ligand structures into ready-to-run
/// per-window simulation inputs.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// Structure file of the lambda = 0 ligand (PDB or MOL2).
    pub ligand_a_path: PathBuf,
    /// Structure file of the lambda = 1 ligand (PDB or MOL2).
    pub ligand_b_path: PathBuf,
    /// Force-field parameter file (TOML).
    pub forcefield_path: PathBuf,
    /// Fallback partial charge table (CSV).
    pub charges_path: PathBuf,
    pub mapping: MappingConfig,
    pub solvation: SolvationConfig,
    pub protocol: Protocol,
    /// Directory the lambda window directories are created under.
    pub output_dir: PathBuf,
}

/// Summary of a completed setup run.
#[derive(Debug, Clone)]
pub struct SetupResult {
    pub mapped_pairs: usize,
    /// Post-alignment RMSD over the mapped pairs, in Angstroms.
    pub alignment_rmsd: f64,
    pub merged_atoms: usize,
    pub core_atoms: usize,
    pub disappearing_atoms: usize,
    pub appearing_atoms: usize,
    pub water_count: usize,
    /// Per-end-state structure/topology pairs, `(A, B)`.
    pub end_state_files: (EndStateFiles, EndStateFiles),
    /// Window directories in lambda order.
    pub window_dirs: Vec<PathBuf>,
}

#[instrument(skip_all, name = "setup_workflow")]
pub fn run(config: &SetupConfig, reporter: &ProgressReporter) -> Result<SetupResult, EngineError> {
    // === Phase 0: Load and parametrize the end states ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        ligand_a = %config.ligand_a_path.display(),
        ligand_b = %config.ligand_b_path.display(),
        "Loading ligands and force field."
    );

    let forcefield = Forcefield::load(&config.forcefield_path, &config.charges_path)?;
    let mut ligand_a = load_molecule(&config.ligand_a_path)?;
    let mut ligand_b = load_molecule(&config.ligand_b_path)?;

    let parameterizer = Parameterizer::new(&forcefield);
    parameterizer.parameterize_molecule(&mut ligand_a)?;
    parameterizer.parameterize_molecule(&mut ligand_b)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Map common atoms ===
    reporter.report(Progress::PhaseStart { name: "Mapping" });
    let mapping = match_atoms(&ligand_a, &ligand_b, &config.mapping)?;
    info!(pairs = mapping.len(), "Atom mapping found.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Align A onto B ===
    reporter.report(Progress::PhaseStart { name: "Alignment" });
    let alignment_rmsd = align(&mut ligand_a, &ligand_b, &mapping)?;
    info!(rmsd = alignment_rmsd, "Ligands aligned.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Merge into a dual topology ===
    reporter.report(Progress::PhaseStart { name: "Merging" });
    let merged = merge(&ligand_a, &ligand_b, &mapping)?;
    let core_atoms = merged.count_mutation(Mutation::Core);
    let disappearing_atoms = merged.count_mutation(Mutation::Disappearing);
    let appearing_atoms = merged.count_mutation(Mutation::Appearing);
    let merged_atoms = merged.atom_count();
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Solvate ===
    reporter.report(Progress::PhaseStart { name: "Solvation" });
    let mut system = System::vacuum(Solute::Perturbable(merged));
    let water_count = solvate(&mut system, &config.solvation)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 5: Write end-state files and per-window inputs ===
    reporter.report(Progress::PhaseStart {
        name: "Input generation",
    });
    std::fs::create_dir_all(&config.output_dir).map_err(|e| EngineError::Output {
        artifact: "output directory",
        message: e.to_string(),
    })?;
    let end_state_files = save_perturbable(
        &system,
        &forcefield.globals,
        &config.output_dir,
        "ligand",
    )?;
    let leg = FreeEnergyLeg::new(&system, &config.protocol, &forcefield.globals);
    let window_dirs = leg.write_inputs(&config.output_dir, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        windows = window_dirs.len(),
        output = %config.output_dir.display(),
        "Setup complete."
    );
    Ok(SetupResult {
        mapped_pairs: mapping.len(),
        alignment_rmsd,
        merged_atoms,
        core_atoms,
        disappearing_atoms,
        appearing_atoms,
        water_count,
        end_state_files,
        window_dirs,
    })
}

/// The outcome of a mapping-only run.
#[derive(Debug, Clone)]
pub struct MappingReport {
    pub mapping: AtomMapping,
    /// Names of the mapped atoms in the first molecule, in mapping order.
    pub names_a: Vec<String>,
    /// Names of the mapped atoms in the second molecule, in mapping order.
    pub names_b: Vec<String>,
    /// RMSD over the mapped pairs as loaded, before any alignment, in
    /// Angstroms.
    pub rmsd: f64,
}

/// Maps two molecules without running the full pipeline.
///
/// Used by callers that want to inspect or hand-tune the mapping before
/// committing to a merge.
pub fn map_only(
    ligand_a_path: &std::path::Path,
    ligand_b_path: &std::path::Path,
    config: &MappingConfig,
) -> Result<MappingReport, EngineError> {
    let ligand_a = load_molecule(ligand_a_path)?;
    let ligand_b = load_molecule(ligand_b_path)?;
    let mapping = match_atoms(&ligand_a, &ligand_b, config)?;

    let mut names_a = Vec::with_capacity(mapping.len());
    let mut names_b = Vec::with_capacity(mapping.len());
    let mut coords_a = Vec::with_capacity(mapping.len());
    let mut coords_b = Vec::with_capacity(mapping.len());
    for (from, to) in mapping.iter() {
        // match_atoms only emits in-range indices.
        if let (Some(atom_a), Some(atom_b)) = (
            ligand_a.atom_by_index(from),
            ligand_b.atom_by_index(to),
        ) {
            names_a.push(atom_a.name.clone());
            names_b.push(atom_b.name.clone());
            coords_a.push(atom_a.position);
            coords_b.push(atom_b.position);
        }
    }
    let rmsd = crate::core::utils::geometry::calculate_rmsd(&coords_a, &coords_b).unwrap_or(0.0);

    Ok(MappingReport {
        mapping,
        names_a,
        names_b,
        rmsd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{Engine, ProtocolBuilder};
    use std::fs;
    use std::io::Write as _;

    const PARAMS_TOML: &str = r#"
[globals]
name = "gaff-lite"
combining_rule = "lorentz-berthelot"
fudge_lj = 0.5
fudge_qq = 0.8333

[lj.c3]
sigma = 3.3997
epsilon = 0.1094

[lj.oh]
sigma = 3.0665
epsilon = 0.2104

[[typing]]
element = "C"
type = "c3"

[[typing]]
element = "O"
type = "oh"
"#;

    const CHARGES_CSV: &str = "ff_type,charge\nc3,-0.06\noh,-0.55\n";

    const BUTANE_PDB: &str = "\
HETATM    1  C1  BUT A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  C2  BUT A   1       1.450   0.510   0.000  1.00  0.00           C
HETATM    3  C3  BUT A   1       2.430  -0.640   0.000  1.00  0.00           C
HETATM    4  C4  BUT A   1       3.880  -0.130   0.000  1.00  0.00           C
CONECT    1    2
CONECT    2    3
CONECT    3    4
END
";

    const PROPANOL_PDB: &str = "\
HETATM    1  C1  POL A   1       5.000   5.000   0.000  1.00  0.00           C
HETATM    2  C2  POL A   1       6.450   5.510   0.000  1.00  0.00           C
HETATM    3  C3  POL A   1       7.430   4.360   0.000  1.00  0.00           C
HETATM    4  O1  POL A   1       8.780   4.840   0.000  1.00  0.00           O
CONECT    1    2
CONECT    2    3
CONECT    3    4
END
";

    fn write_fixture(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn setup_config(dir: &std::path::Path) -> SetupConfig {
        SetupConfig {
            ligand_a_path: write_fixture(dir, "butane.pdb", BUTANE_PDB),
            ligand_b_path: write_fixture(dir, "propanol.pdb", PROPANOL_PDB),
            forcefield_path: write_fixture(dir, "params.toml", PARAMS_TOML),
            charges_path: write_fixture(dir, "charges.csv", CHARGES_CSV),
            mapping: MappingConfig::default(),
            solvation: SolvationConfig::default(),
            protocol: ProtocolBuilder::new()
                .timestep_fs(2.0)
                .runtime_ps(10.0)
                .num_windows(5)
                .engine(Engine::Somd)
                .build()
                .unwrap(),
            output_dir: dir.join("output"),
        }
    }

    #[test]
    fn full_pipeline_produces_all_windows() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup_config(dir.path());

        let result = run(&config, &ProgressReporter::new()).unwrap();

        // Butane and the propanol chain share a three-carbon core.
        assert_eq!(result.mapped_pairs, 3);
        assert_eq!(result.merged_atoms, 5);
        assert_eq!(result.core_atoms, 3);
        assert_eq!(result.disappearing_atoms, 1);
        assert_eq!(result.appearing_atoms, 1);
        assert!(result.water_count > 0);

        let (state_a, state_b) = &result.end_state_files;
        assert_eq!(state_a.structure, config.output_dir.join("ligand_A.pdb"));
        assert_eq!(state_b.topology, config.output_dir.join("ligand_B.top"));
        for files in [state_a, state_b] {
            assert!(files.structure.exists());
            assert!(files.topology.exists());
        }

        assert_eq!(result.window_dirs.len(), 5);
        for window in &result.window_dirs {
            assert!(window.join("somd.cfg").exists());
            assert!(window.join("somd.pert").exists());
            assert!(window.join("system.pdb").exists());
        }
    }

    #[test]
    fn gromacs_pipeline_writes_gromacs_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup_config(dir.path());
        config.protocol = ProtocolBuilder::new()
            .timestep_fs(2.0)
            .runtime_ps(10.0)
            .num_windows(3)
            .engine(Engine::Gromacs)
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.window_dirs.len(), 3);
        for window in &result.window_dirs {
            assert!(window.join("gromacs.mdp").exists());
            assert!(window.join("system.gro").exists());
            assert!(window.join("system.top").exists());
        }
    }

    #[test]
    fn phases_are_reported_in_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup_config(dir.path());

        let phases = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        run(&config, &reporter).unwrap();
        drop(reporter);

        assert_eq!(
            phases.into_inner().unwrap(),
            vec![
                "Preparation",
                "Mapping",
                "Alignment",
                "Merging",
                "Solvation",
                "Input generation"
            ]
        );
    }

    #[test]
    fn map_only_reports_paired_atom_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_fixture(dir.path(), "butane.pdb", BUTANE_PDB);
        let b = write_fixture(dir.path(), "propanol.pdb", PROPANOL_PDB);

        let report = map_only(&a, &b, &MappingConfig::default()).unwrap();
        assert_eq!(report.mapping.len(), 3);
        assert_eq!(report.names_a.len(), 3);
        assert_eq!(report.names_b.len(), 3);
        // Fixtures are translated copies, so the raw mapped RMSD is the
        // translation distance.
        assert!(report.rmsd > 1.0);
    }
}
