use api::routes::create_router_with_cors;
use api::{ApiDoc, AppState};
use services::geo::{GeoServiceImpl, HttpGeoLocator};
use services::payments::RazorpayClient;
use services::quota::QuotaServiceImpl;
use services::subscription::{SubscriptionServiceConfig, SubscriptionServiceImpl};
use services::trial::TrialServiceImpl;
use services::user::UserServiceImpl;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
        eprintln!("Continuing with environment variables...");
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api=debug,services=debug,database=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FormFit billing API...");

    // Load configuration from environment
    let config = config::Config::from_env();

    tracing::info!(
        "Database: {}:{}/{}",
        config.database.host,
        config.database.port,
        config.database.database
    );
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    if !config.razorpay.is_configured() {
        tracing::warn!("Razorpay credentials missing; payment endpoints will return 503");
    }

    // Create database and run migrations
    tracing::info!("Connecting to database...");
    let db = database::Database::from_config(&config.database).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    // Create services
    tracing::info!("Initializing services...");
    let gateway = Arc::new(RazorpayClient::new(
        config.razorpay.key_id.clone(),
        config.razorpay.key_secret.clone(),
        config.razorpay.base_url.clone(),
    ));

    let trial_service = Arc::new(TrialServiceImpl::new(db.trial_repository()));
    let quota_service = Arc::new(QuotaServiceImpl::new(db.quota_ledger_repository()));
    let user_service = Arc::new(UserServiceImpl::new(db.user_repository()));
    let subscription_service = Arc::new(SubscriptionServiceImpl::new(SubscriptionServiceConfig {
        db_pool: db.pool().clone(),
        plan_repo: db.plan_repository(),
        subscription_repo: db.subscription_repository(),
        transaction_repo: db.transaction_repository(),
        user_repo: db.user_repository(),
        gateway,
    }));
    let geo_locator = Arc::new(HttpGeoLocator::new(
        config.geo.base_url.clone(),
        config.geo.timeout_secs,
    ));
    let geo_service = Arc::new(GeoServiceImpl::new(
        geo_locator,
        config.geo.inr_conversion_rate,
    ));

    // Create application state
    let app_state = AppState {
        trial_service,
        quota_service,
        subscription_service,
        user_service,
        geo_service,
    };

    // Create router
    let app = create_router_with_cors(app_state, config.cors)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
