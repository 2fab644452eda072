use plazos_rust::{api, create_pool, AppConfig, PgRecordStore, Recommender};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (.env, plazos.toml, environment)
    let config = AppConfig::load()?;

    // Logging: local time, RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    info!("Starting server with config: {:?}", config.server);

    // Document store
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let store = Arc::new(PgRecordStore::new(
        pool,
        Duration::from_secs(config.database.query_timeout_secs),
    ));
    let recommender = Arc::new(Recommender::new(store));

    let app = api::router(recommender, &config.cors);

    let addr = config.bind_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET /consultar-rut?rut=<RUT>            - term recommendation");
    info!("  GET /api/recommend/<RUT>                - term recommendation");
    info!("  GET /api/recommend/<RUT>/history.csv    - matched payment history");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
