use std::sync::Arc;

use tracing::{error, info};

use hoard::web::WebServer;
use hoard::{Config, TreeService};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = hoard::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        hoard::logging::init_console_only(&config.logging.level);
    }

    info!("Hoard - hierarchical file organizer");

    let service = match TreeService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Failed to initialize tree service");
            std::process::exit(1);
        }
    };
    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path,
        max_upload_size_mb = config.storage.max_upload_size_mb,
        "Blob storage ready"
    );

    let server = match WebServer::new(&config, service) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Invalid server address");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!(error = %e, "Web server error");
        std::process::exit(1);
    }
}
