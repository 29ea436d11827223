#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use service_roster::{AppConfig, SqliteRosterStore, http_api, init_tracing};

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_filter);

    let store = SqliteRosterStore::new(&config.database_path)?;
    tracing::info!(database = %config.database_path.display(), "opened roster database");

    let state = http_api::AppState::new(store).export_file_name(config.export_file_name.clone());
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
