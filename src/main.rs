use std::process::ExitCode;

use tracing::{error, info, warn};

use vpspanel::auth::bootstrap_superuser;
use vpspanel::web::WebServer;
use vpspanel::{AccountRepository, Config, Database};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = vpspanel::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        vpspanel::logging::init_console_only(&config.logging.level);
    }

    info!("vpspanel starting");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            return ExitCode::FAILURE;
        }
    };

    if config.admin.is_configured() {
        let repo = AccountRepository::new(db.pool());
        match bootstrap_superuser(&repo, &config.admin).await {
            Ok(_) => {}
            Err(e) => warn!("Failed to create initial superuser: {}", e),
        }
    }

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to set up web server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
