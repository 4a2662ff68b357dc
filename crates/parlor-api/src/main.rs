use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use parlor_api::{
    config::Config,
    middleware::logging,
    openapi::ApiDoc,
    routes::{accounts, conversations, health, messages, webhook},
    state::AppState,
};
use parlor_graph::{GraphApi, GraphClient};
use parlor_inbox::{MessageSender, WebhookProcessor};
use parlor_store::{InboxStore, StoreClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Parlor API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Initialize persistence (MongoDB)
    tracing::info!("Connecting to MongoDB");
    let store = StoreClient::new(&config.mongodb_uri, &config.mongodb.database).await?;
    store.ensure_indexes().await?;
    tracing::info!("MongoDB connected, indexes ensured");

    // Initialize the Graph API client
    tracing::info!("Initializing Graph API client");
    let graph_client = GraphClient::builder()
        .api_version(config.graph.api_version.as_str())
        .timeout(Duration::from_secs(config.graph.timeout_secs))
        .build()?;
    let graph: Arc<dyn GraphApi> = Arc::new(graph_client);

    // Webhook processor and outbound sender share the store seam
    let inbox_store: Arc<dyn InboxStore> = Arc::new(store.clone());
    let processor = WebhookProcessor::new(
        inbox_store.clone(),
        graph.clone(),
        config.meta_verify_token.clone(),
    );
    let sender = MessageSender::new(inbox_store, graph.clone());

    // Create application state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        graph,
        processor,
        sender,
    ));

    // Build router
    let app = build_router(state.clone());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Webhook
        .route("/v1/webhook", get(webhook::verify_webhook))
        .route("/v1/webhook", post(webhook::receive_webhook))
        // Accounts
        .route("/v1/accounts", post(accounts::create_account))
        .route("/v1/accounts", get(accounts::list_accounts))
        .route("/v1/accounts/:account_id", get(accounts::get_account))
        .route("/v1/accounts/:account_id", patch(accounts::update_account))
        .route("/v1/accounts/:account_id", delete(accounts::delete_account))
        .route(
            "/v1/accounts/:account_id/profile",
            get(accounts::get_account_profile),
        )
        // Conversations
        .route(
            "/v1/conversations/:account_id",
            get(conversations::list_conversations),
        )
        .route(
            "/v1/conversations/detail/:conversation_id",
            get(conversations::get_conversation),
        )
        .route(
            "/v1/conversations/detail/:conversation_id",
            delete(conversations::delete_conversation),
        )
        // Messages
        .route("/v1/messages/:conversation_id", get(messages::list_messages))
        .route("/v1/messages/:conversation_id", post(messages::send_message))
        .route(
            "/v1/messages/:conversation_id/read",
            post(messages::mark_messages_read),
        );

    // Build full router with middleware
    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .nest("/", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            // Parse all origins and collect them
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
