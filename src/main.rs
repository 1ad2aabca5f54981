use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use dotenv::dotenv;
use tower_http::cors::{Any, CorsLayer};

use workbridge::{
    config::Config,
    db::{DBClient, MemoryStore, Store},
    mail::{mails::EmailNotifier, sendmail::Mailer},
    routes::create_router,
    service::notification_service::{LogNotifier, Notifier},
    AppState,
};

const MAX_DB_CONNECTIONS: u32 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let client = DBClient::connect(url, MAX_DB_CONNECTIONS)
                .await
                .context("failed to connect to the database")?;
            Arc::new(client)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::default())
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.resend_api_key {
        Some(api_key) => {
            let mailer = Mailer::new(api_key.clone(), config.from_email.clone())
                .context("failed to build the mail client")?;
            Arc::new(EmailNotifier::new(mailer))
        }
        None => {
            tracing::info!("RESEND_API_KEY not set, lifecycle events are only logged");
            Arc::new(LogNotifier)
        }
    };

    let app_state = Arc::new(AppState::new(db_client, config.clone(), notifier));

    if let Some(bootstrap) = &config.bootstrap_admin {
        app_state
            .admin_service
            .bootstrap_admin(&bootstrap.email, &bootstrap.password, &bootstrap.name)
            .await
            .context("failed to seed the bootstrap admin")?;
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    tracing::info!(port = config.port, "server listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
