use std::sync::Arc;

use identity_service::config::Config;
use identity_service::domain::account::service::AuthService;
use identity_service::domain::registration::service::RegistrationService;
use identity_service::domain::token::TokenIssuer;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::PostgresCredentialRepository;
use identity_service::outbound::repositories::PostgresRegistrationRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        token_issuer = %config.jwt.issuer,
        token_ttl_minutes = config.jwt.ttl_minutes,
        "Configuration loaded"
    );

    // Fails here when no signing secret is configured
    let token_issuer = Arc::new(TokenIssuer::new(
        &config.jwt.secret,
        &config.jwt.issuer,
        &config.jwt.audience,
        config.jwt.ttl_minutes,
    )?);

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let credential_repository = Arc::new(PostgresCredentialRepository::new(pg_pool.clone()));
    let registration_repository = Arc::new(PostgresRegistrationRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        credential_repository,
        Arc::clone(&token_issuer),
    ));
    let registration_service = Arc::new(RegistrationService::new(
        registration_repository,
        Arc::clone(&token_issuer),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, registration_service, token_issuer);

    axum::serve(http_listener, http_application).await?;

    Ok(())
}
