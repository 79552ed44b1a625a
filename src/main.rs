use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use lead_qualifier::agent::AdvisorAgent;
use lead_qualifier::config::{AppConfig, StorageBackend};
use lead_qualifier::db::{MemoryStore, PostgresStore, Storage};
use lead_qualifier::flow::copy::BrandConfig;
use lead_qualifier::notify::email::SmtpNotifier;
use lead_qualifier::notify::{LeadNotifier, LogOnlyNotifier};
use lead_qualifier::{build_router, AppState};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_qualifier=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ── Storage ───────────────────────────────────────────────────────────────
    let store: Arc<dyn Storage> = match &config.storage {
        StorageBackend::Postgres { database_url, max_connections } => {
            Arc::new(PostgresStore::connect(database_url, *max_connections).await?)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; leads and events are lost on restart");
            Arc::new(MemoryStore::default())
        }
    };

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let brand = BrandConfig { features: config.features, ..BrandConfig::default() };

    let notifier: Arc<dyn LeadNotifier> = match config.email.clone() {
        Some(email) => Arc::new(SmtpNotifier::new(
            email,
            config.staff_email.clone(),
            brand.name.clone(),
            config.app_url.clone(),
        )),
        None => {
            warn!("SMTP_HOST not set; lead notifications will only be logged");
            Arc::new(LogOnlyNotifier)
        }
    };

    let agent = AdvisorAgent::new(config.ai.as_ref(), &brand.name);
    let state = AppState::new(store, notifier, agent, brand, config.session_idle_ttl);
    state.sessions.spawn_eviction(SESSION_SWEEP_PERIOD);
    let app = build_router(state);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
