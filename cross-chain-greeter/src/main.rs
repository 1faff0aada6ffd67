use cross_chain_greeter::{artifacts::Artifacts, config::Config, greeter, logging};
use std::process::ExitCode;
use tracing::{error, info};

/// Application entry point
///
/// This is the main function that:
/// 1. Sets up logging
/// 2. Checks the environment (no network activity before this passes)
/// 3. Checks and loads the compiled contracts
/// 4. Runs the cross-chain greeter walkthrough
#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("Failed to set up logging: {e}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> eyre::Result<()> {
    let config = Config::from_env()?;
    let artifacts = Artifacts::load(&config.artifacts)?;

    let outcome = greeter::run(&config, &artifacts).await?;
    info!(
        "Done: L1 greeter {}, L2 greeter {}, ticket {}",
        outcome.l1_greeter, outcome.l2_greeter, outcome.status
    );
    Ok(())
}
