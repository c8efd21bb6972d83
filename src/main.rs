use std::process::ExitCode;

use log::error;
use orbit_viewer::{app, create_clap_command, handle_clap_matches, init_logging, ViewerConfig};

fn main() -> ExitCode {
    let matches = match create_clap_command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            // --help and --version land here too and are not failures.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let config = handle_clap_matches(&matches);

    if let Err(e) = init_logging(config.log_level, config.log_file.as_deref()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ViewerConfig) -> orbit_viewer::Result<()> {
    // Load before any window exists so a bad asset fails fast.
    let mesh = config.load_mesh()?;
    app::run(config, mesh)
}
