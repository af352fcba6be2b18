use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use trekdesk_api::{app, worker, AppState};
use trekdesk_booking::{RefundError, RefundPolicy};
use trekdesk_store::app_config::{BackendMode, Config, RefundPolicyConfig};
use trekdesk_store::{InMemoryBackend, RestBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn refund_policy(config: &RefundPolicyConfig) -> Result<RefundPolicy, RefundError> {
    RefundPolicy::new(
        config.early_min_days,
        config.early_percent,
        config.late_min_days,
        config.late_percent,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trekdesk_api=debug,trekdesk_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting trekdesk admin API on port {}", config.server.port);

    let policy = refund_policy(&config.refund_policy)?;
    let app_state = match config.backend.mode {
        BackendMode::Rest => {
            tracing::info!("Using booking backend at {}", config.backend.base_url);
            AppState::new(Arc::new(RestBackend::new(&config.backend)?), policy)
        }
        BackendMode::Memory => {
            tracing::warn!("Using in-memory backend, data is lost on restart");
            AppState::new(Arc::new(InMemoryBackend::new()), policy)
        }
    };

    tokio::spawn(worker::start_flow_sweeper(
        app_state.flows.clone(),
        config.server.intake_ttl_minutes,
        Duration::from_secs(60),
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
