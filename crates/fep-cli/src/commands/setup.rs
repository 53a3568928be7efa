use crate::cli::SetupArgs;
use crate::config::PartialSetupConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use fepforge::engine::progress::ProgressReporter;
use fepforge::workflows;
use tracing::info;

pub fn run(args: SetupArgs) -> Result<()> {
    let partial_config = if let Some(config_path) = &args.config {
        PartialSetupConfig::from_file(config_path)?
    } else {
        PartialSetupConfig::default()
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting free-energy setup...");
    info!("Invoking the core setup workflow...");
    let result = workflows::setup::run(&config, &reporter)?;

    println!(
        "✓ Mapped {} atom pairs (alignment RMSD {:.3} A).",
        result.mapped_pairs, result.alignment_rmsd
    );
    println!(
        "✓ Merged molecule: {} atoms ({} core, {} disappearing, {} appearing).",
        result.merged_atoms, result.core_atoms, result.disappearing_atoms, result.appearing_atoms
    );
    println!("✓ Solvated with {} water molecules.", result.water_count);
    let (state_a, state_b) = &result.end_state_files;
    println!(
        "✓ End-state files written: {}, {}",
        state_a.structure.display(),
        state_b.structure.display()
    );
    println!(
        "✓ {} lambda windows written under: {}",
        result.window_dirs.len(),
        config.output_dir.display()
    );

    Ok(())
}
