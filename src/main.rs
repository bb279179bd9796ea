use tracing::{error, info};

use filevault::{Config, Database, FileService, FileStorage, WebServer};

#[tokio::main]
async fn main() {
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = filevault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filevault::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "FileVault stopped with an error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> filevault::Result<()> {
    config.validate()?;

    info!("FileVault - personal file storage");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open_with(&config.database.path, config.database.max_connections).await?;
    info!(path = %config.database.path, "Database ready");

    let storage = FileStorage::new(&config.files.storage_path)?;
    info!(path = %storage.base_path().display(), "File storage ready");

    let files = FileService::new(db.clone(), storage, config.files.allowed_extensions.clone());
    WebServer::new(&config, files)?.run().await?;

    db.close().await;
    Ok(())
}
