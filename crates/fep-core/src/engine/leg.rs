use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::config::{Engine, Protocol};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::forcefield::params::GlobalParams;
use crate::core::io::{gro, pdb, pert, top};
use crate::core::models::system::{Solute, System};

/// One leg of a free-energy calculation: a prepared system plus the
/// protocol used to discretize its alchemical path.
///
/// The leg borrows its inputs; it is a view used to write per-window
/// simulation directories, not an owner of the system.
pub struct FreeEnergyLeg<'a> {
    system: &'a System,
    protocol: &'a Protocol,
    globals: &'a GlobalParams,
}

fn output_error(artifact: &'static str, source: io::Error) -> EngineError {
    EngineError::Output {
        artifact,
        message: source.to_string(),
    }
}

impl<'a> FreeEnergyLeg<'a> {
    pub fn new(system: &'a System, protocol: &'a Protocol, globals: &'a GlobalParams) -> Self {
        Self {
            system,
            protocol,
            globals,
        }
    }

    /// Writes one directory of engine input files per lambda window.
    ///
    /// Directories are named `lambda_<value>` with the value printed to four
    /// decimals, so the lexicographic and numeric orders agree. Exactly
    /// `num_windows` directories are produced. Returns the window directory
    /// paths in lambda order.
    ///
    /// # Errors
    ///
    /// Fails if the solute is not perturbable or any file cannot be written.
    pub fn write_inputs(
        &self,
        output_dir: &Path,
        reporter: &ProgressReporter,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let merged = match &self.system.solute {
            Solute::Perturbable(merged) => merged,
            Solute::Molecule(_) => return Err(EngineError::NotPerturbable),
        };

        let lambdas = self.protocol.lambda_values();
        reporter.report(Progress::TaskStart {
            total_steps: lambdas.len() as u64,
        });

        let mut window_dirs = Vec::with_capacity(lambdas.len());
        for (index, &lambda) in lambdas.iter().enumerate() {
            let window_dir = output_dir.join(format!("lambda_{lambda:.4}"));
            fs::create_dir_all(&window_dir)
                .map_err(|e| output_error("window directory", e))?;

            match self.protocol.engine {
                Engine::Somd => self.write_somd_window(&window_dir, merged, lambda, &lambdas)?,
                Engine::Gromacs => self.write_gromacs_window(&window_dir, index, &lambdas)?,
            }

            reporter.report(Progress::WindowWritten { index, lambda });
            reporter.report(Progress::TaskIncrement);
            window_dirs.push(window_dir);
        }
        reporter.report(Progress::TaskFinish);

        info!(
            windows = window_dirs.len(),
            engine = %self.protocol.engine,
            "simulation inputs written"
        );
        Ok(window_dirs)
    }

    fn write_somd_window(
        &self,
        window_dir: &Path,
        merged: &crate::core::models::merged::MergedMolecule,
        lambda: f64,
        lambdas: &[f64],
    ) -> Result<(), EngineError> {
        let lambda_array = lambdas
            .iter()
            .map(|l| format!("{l:.4}"))
            .collect::<Vec<_>>()
            .join(", ");
        let config = format!(
            "ncycles = 1\n\
             nmoves = {moves}\n\
             timestep = {timestep:.2} * femtosecond\n\
             constraint = hbonds-notperturbed\n\
             lambda array = {lambda_array}\n\
             lambda_val = {lambda:.4}\n\
             perturbed residue number = 1\n",
            moves = self.protocol.steps_per_window(),
            timestep = self.protocol.timestep_fs,
        );
        fs::write(window_dir.join("somd.cfg"), config)
            .map_err(|e| output_error("SOMD config", e))?;

        pert::write_merged_to_path(merged, window_dir.join("somd.pert"))?;
        pdb::write_system_to_path(self.system, window_dir.join("system.pdb")).map_err(|e| {
            EngineError::Output {
                artifact: "coordinate file",
                message: e.to_string(),
            }
        })?;
        Ok(())
    }

    fn write_gromacs_window(
        &self,
        window_dir: &Path,
        index: usize,
        lambdas: &[f64],
    ) -> Result<(), EngineError> {
        let fep_lambdas = lambdas
            .iter()
            .map(|l| format!("{l:.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        let mdp = format!(
            "integrator           = sd\n\
             dt                   = {dt:.4}\n\
             nsteps               = {nsteps}\n\
             constraints          = h-bonds\n\
             free-energy          = yes\n\
             init-lambda-state    = {index}\n\
             fep-lambdas          = {fep_lambdas}\n\
             sc-alpha             = 0.5\n\
             sc-power             = 1\n",
            dt = self.protocol.timestep_fs / 1000.0,
            nsteps = self.protocol.steps_per_window(),
        );
        fs::write(window_dir.join("gromacs.mdp"), mdp)
            .map_err(|e| output_error("GROMACS mdp", e))?;

        gro::write_system_to_path(self.system, window_dir.join("system.gro"))?;
        top::write_system_to_path(self.system, self.globals, window_dir.join("system.top"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::CachedLjParam;
    use crate::core::models::element::Element;
    use crate::core::models::merged::{EndStateAtom, MergedMolecule, Mutation, PerturbedAtom};
    use crate::engine::config::ProtocolBuilder;

    use nalgebra::Point3;

    fn globals() -> GlobalParams {
        GlobalParams {
            name: "gaff-lite".into(),
            combining_rule: "lorentz-berthelot".into(),
            fudge_lj: 0.5,
            fudge_qq: 0.8333,
        }
    }

    fn carbon_state() -> EndStateAtom {
        EndStateAtom {
            element: Element::C,
            force_field_type: "c3".into(),
            partial_charge: 0.0,
            mass: Element::C.mass(),
            lj_param: CachedLjParam::LennardJones {
                sigma: 3.3997,
                epsilon: 0.1094,
            },
        }
    }

    fn perturbable_system() -> System {
        let mut merged = MergedMolecule::new("LIG");
        merged.push_atom(PerturbedAtom {
            name: "C1".into(),
            position: Point3::origin(),
            mutation: Mutation::Core,
            state_a: carbon_state(),
            state_b: carbon_state(),
        });
        let mut system = System::vacuum(Solute::Perturbable(merged));
        system.boundary = Some(crate::core::models::system::PeriodicBox::cubic(20.0));
        system
    }

    fn protocol(engine: Engine, windows: usize) -> Protocol {
        ProtocolBuilder::new()
            .timestep_fs(2.0)
            .runtime_ps(10.0)
            .num_windows(windows)
            .engine(engine)
            .build()
            .unwrap()
    }

    #[test]
    fn somd_leg_writes_one_directory_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let system = perturbable_system();
        let protocol = protocol(Engine::Somd, 5);
        let globals = globals();
        let leg = FreeEnergyLeg::new(&system, &protocol, &globals);

        let windows = leg
            .write_inputs(dir.path(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(windows.len(), 5);
        assert!(windows[0].ends_with("lambda_0.0000"));
        assert!(windows[4].ends_with("lambda_1.0000"));
        for window in &windows {
            assert!(window.join("somd.cfg").exists());
            assert!(window.join("somd.pert").exists());
            assert!(window.join("system.pdb").exists());
        }

        let cfg = fs::read_to_string(windows[1].join("somd.cfg")).unwrap();
        assert!(cfg.contains("lambda_val = 0.2500"));
        assert!(cfg.contains("nmoves = 5000"));
    }

    #[test]
    fn gromacs_leg_writes_mdp_gro_and_top() {
        let dir = tempfile::tempdir().unwrap();
        let system = perturbable_system();
        let protocol = protocol(Engine::Gromacs, 3);
        let globals = globals();
        let leg = FreeEnergyLeg::new(&system, &protocol, &globals);

        let windows = leg
            .write_inputs(dir.path(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(windows.len(), 3);
        for window in &windows {
            assert!(window.join("gromacs.mdp").exists());
            assert!(window.join("system.gro").exists());
            assert!(window.join("system.top").exists());
        }

        let mdp = fs::read_to_string(windows[2].join("gromacs.mdp")).unwrap();
        assert!(mdp.contains("init-lambda-state    = 2"));
        assert!(mdp.contains("fep-lambdas          = 0.0000 0.5000 1.0000"));
    }

    #[test]
    fn plain_solute_cannot_form_a_leg() {
        let dir = tempfile::tempdir().unwrap();
        let mut mol = crate::core::models::molecule::Molecule::new("ETH");
        mol.add_atom("C1", Element::C, Point3::origin());
        let system = System::vacuum(Solute::Molecule(mol));
        let protocol = protocol(Engine::Somd, 3);
        let globals = globals();
        let leg = FreeEnergyLeg::new(&system, &protocol, &globals);

        assert!(matches!(
            leg.write_inputs(dir.path(), &ProgressReporter::new()),
            Err(EngineError::NotPerturbable)
        ));
    }

    #[test]
    fn window_events_are_reported_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let system = perturbable_system();
        let protocol = protocol(Engine::Somd, 4);
        let globals = globals();
        let leg = FreeEnergyLeg::new(&system, &protocol, &globals);

        let lambdas = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::WindowWritten { lambda, .. } = event {
                lambdas.lock().unwrap().push(lambda);
            }
        }));
        leg.write_inputs(dir.path(), &reporter).unwrap();
        drop(reporter);

        let lambdas = lambdas.into_inner().unwrap();
        assert_eq!(lambdas.len(), 4);
        assert!(lambdas.windows(2).all(|w| w[1] > w[0]));
    }
}
