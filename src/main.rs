use std::sync::Arc;

use local_auth::core::auth::{
    AuthApiState, AuthService, JwtService, PasswordHasher, auth_api_router,
};
use local_auth::core::config::Config;
use local_auth::core::db::{MemoryUserStore, UserRepository, UserStore, create_pool_with_migrations};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let jwt_service = JwtService::from_env()?;

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, bind_addr={}",
        config.has_database(),
        config.bind_addr
    );

    let store: Arc<dyn UserStore> = match config.db_config() {
        Some(db_config) => {
            let pool = create_pool_with_migrations(&db_config).await?;
            Arc::new(UserRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory and lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let auth_service = AuthService::new(store, jwt_service, PasswordHasher::default());

    let app = auth_api_router(AuthApiState { auth_service })
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
