use std::net::SocketAddr;
use std::sync::Arc;

use pawhaven_api::{app, AppState, AuthConfig};
use pawhaven_core::{AppointmentRepository, PetDirectory};
use pawhaven_store::database::DbClient;
use pawhaven_store::{
    Config, MemoryAppointmentStore, MemoryPetDirectory, PgAppointmentStore, PgPetDirectory,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawhaven_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting PawHaven scheduling API on port {}", config.server.port);

    let database_url = config
        .database
        .url
        .as_deref()
        .filter(|url| !url.is_empty());

    let (store, pets): (Arc<dyn AppointmentRepository>, Arc<dyn PetDirectory>) =
        match database_url {
            Some(url) => {
                let db = DbClient::new(url)
                    .await
                    .expect("Failed to connect to Postgres");
                db.migrate().await.expect("Failed to run migrations");
                (
                    Arc::new(PgAppointmentStore::new(db.pool.clone())),
                    Arc::new(PgPetDirectory::new(db.pool)),
                )
            }
            None => {
                tracing::info!("No database url configured, using the in-memory store");
                (
                    Arc::new(MemoryAppointmentStore::new()),
                    Arc::new(MemoryPetDirectory::new()),
                )
            }
        };

    let app_state = AppState::new(
        store,
        pets,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
