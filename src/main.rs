use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enroll_backend::api::router;
use enroll_backend::config::AppConfig;
use enroll_backend::email::{EmailConfig, Mailer, NoopMailer, SmtpMailer};
use enroll_backend::payments::{PaymentProvider, StripeClient, StripeConfig};
use enroll_backend::state::AppState;
use enroll_backend::store::{DocumentStore, FirestoreClient, FirestoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "enroll_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::new_from_env()?);
    let store: Arc<dyn DocumentStore> =
        Arc::new(FirestoreClient::new(FirestoreConfig::new_from_env()?)?);
    let payments: Arc<dyn PaymentProvider> =
        Arc::new(StripeClient::new(StripeConfig::new_from_env()?)?);
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email_config) => Arc::new(SmtpMailer::new(email_config)),
        None => {
            warn!("EMAIL_USER/EMAIL_PASSWORD not set, confirmation emails disabled");
            Arc::new(NoopMailer)
        }
    };

    let state = AppState {
        store,
        payments,
        mailer,
        config,
    };

    let app = router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
