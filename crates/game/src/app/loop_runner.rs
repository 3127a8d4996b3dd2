use std::process::ExitCode;

use engine::run_headless;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    match run_headless(app.config, &mut app.scene) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                blits = summary.blits,
                quit_requested = summary.quit_requested,
                "run_complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
