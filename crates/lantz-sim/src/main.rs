//! lantz-sim: run one of the instrument simulators
//!
//! ```text
//! lantz-sim fungen --port 5678
//! ```

use std::process::ExitCode;

use lantz_sim::{logging, Dispatcher};
use tracing::error;

fn main() -> ExitCode {
    logging::init();

    let registry = match lantz_simulators::registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Simulator registry is invalid");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = Dispatcher::new(registry);
    let dispatch = match dispatcher.parse_from(std::env::args_os()) {
        Ok(dispatch) => dispatch,
        Err(usage) => usage.exit(),
    };

    match dispatcher.run(dispatch, &mut std::io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        // Simulators parse their own flags; keep clap's formatting and exit codes
        Err(e) => match e.downcast::<clap::Error>() {
            Ok(usage) => usage.exit(),
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
