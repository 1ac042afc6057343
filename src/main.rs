use gallery_api::{
    AppState,
    config::{AppConfig, Env, RevocationBackend},
    create_router,
    mailer::{MailerState, SendGridMailer},
    repository::{PostgresRepository, RepositoryState},
    revocation::{InMemoryRevocationStore, PostgresRevocationStore, RevocationState},
    storage::{S3StorageClient, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs the subscriber, connects Postgres and S3, then serves the
/// router until the process is stopped.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    // Panics on missing production secrets.
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gallery_api=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // --- Database ---
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let postgres_repo = PostgresRepository::new(pool.clone());
    postgres_repo
        .migrate()
        .await
        .expect("FATAL: Failed to apply database migrations.");
    let repo = Arc::new(postgres_repo) as RepositoryState;

    // --- Revoked token store ---
    let revocations: RevocationState = match config.revocation_store {
        RevocationBackend::Memory => {
            tracing::warn!("Revoked tokens are kept in memory and reset on restart");
            Arc::new(InMemoryRevocationStore::new())
        }
        RevocationBackend::Postgres => Arc::new(PostgresRevocationStore::new(pool)),
    };

    // --- Object storage ---
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
        &config.storage_public_url,
    )
    .await;

    // MinIO bucket bootstrap for the local docker setup.
    if config.env == Env::Local {
        use gallery_api::storage::StorageService;
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    // --- Email ---
    if config.sendgrid_api_key.is_empty() {
        tracing::warn!("SENDGRID_API_KEY is not set; welcome emails will be skipped");
    }
    let mailer = Arc::new(SendGridMailer::new(
        &config.sendgrid_api_key,
        &config.mail_sender,
    )) as MailerState;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        mailer,
        revocations,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
