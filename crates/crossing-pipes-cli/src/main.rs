mod cli;
mod logging;
mod run;

use cli::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::setup_logging();
    let settings = Settings::from_cli();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("Failed to start async runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run::run(settings)) {
        Ok(count) => {
            tracing::info!("Found {} crossing pipes", count);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
