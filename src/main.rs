use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use kvrest::config::Config;
use kvrest::engine::ffi::NativeEngine;
use kvrest::{Gateway, logging, server};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = logging::init(&config.log) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_version = %config.rest.api_version,
        "starting kvrest"
    );

    let engine = match NativeEngine::connect(&config.engine.connection_string(), true) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            error!(%err, "engine init failed");
            return ExitCode::FAILURE;
        }
    };

    let gateway = Arc::new(Gateway::new(&config.rest, engine));

    if let Err(err) = server::serve(&config, Arc::clone(&gateway)).await {
        error!(%err, "server failed");
        let _ = gateway.shutdown();
        return ExitCode::FAILURE;
    }

    if let Err(err) = gateway.shutdown() {
        error!(%err, "engine shutdown failed");
    }
    info!("bye");
    ExitCode::SUCCESS
}
