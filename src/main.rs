//! orcaprep command-line entry point.
//!
//! Loads `orcaprep_config.cfg`, starts the logger at the configured level and
//! runs the interactive session on stdin/stdout. `RUST_LOG` overrides the
//! configured level:
//!
//! ```bash
//! orcaprep
//! RUST_LOG=debug orcaprep    # show obabel command lines
//! ```

use log::{error, info, warn};
use orcaprep::embedding::OpenBabel;
use orcaprep::menu::Prompter;
use orcaprep::session::Session;
use orcaprep::settings::SettingsManager;
use std::io;
use std::process;

fn main() {
    let settings = match SettingsManager::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };

    settings
        .logging()
        .logger_builder(env_logger::Env::default())
        .init();
    for problem in settings.skipped_files() {
        warn!("{}", problem);
    }
    info!("Configuration loaded from: {}", settings.config_source());

    let babel = OpenBabel::new(settings.embedding().command.clone());
    info!(
        "Using {} (gen3d speed {}), writing to {}",
        babel.command,
        settings.embedding().speed,
        settings.general().output_dir.display()
    );

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout());
    let mut session = Session::from_settings(&babel, &settings, prompter);

    match session.run() {
        Ok(summary) => {
            println!(
                "Done: {} input file(s) written, {} failed.",
                summary.generated.len(),
                summary.failures
            );
        }
        Err(e) => {
            error!("Session aborted: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
