//! Aegis server binary.
//!
//! Loads configuration, connects to PostgreSQL, primes the authorization gate,
//! starts the expiry sweeper and serves the subscription API until ctrl-c or
//! SIGTERM.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use aegis::adapters::bitvora::{BitvoraConfig, BitvoraInvoiceAdapter};
use aegis::adapters::http::subscription::dto::RelayInfoResponse;
use aegis::adapters::http::{app_router, HttpSettings, SubscriptionAppState};
use aegis::adapters::postgres::PostgresSubscriptionStore;
use aegis::application::{AuthorizationGate, ExpirySweeper, InvoiceSettings, SweeperSettings};
use aegis::config::{AppConfig, ServerConfig};
use aegis::domain::subscription::PaymentNotificationVerifier;
use aegis::ports::{InvoiceProvider, SubscriptionStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let addr = config.server.socket_addr()?;
    tracing::info!(
        environment = ?config.server.environment,
        relay = %config.relay.name,
        "Starting aegis"
    );

    // Persistence
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(Some(config.database.idle_timeout()))
        .max_lifetime(Some(config.database.max_lifetime()))
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let store: Arc<dyn SubscriptionStore> = Arc::new(
        PostgresSubscriptionStore::new(pool.clone()).with_busy_retries(config.database.busy_retries),
    );

    // Gate must be primed before the first write arrives
    let gate = Arc::new(AuthorizationGate::new(store.clone()));
    gate.reload().await?;

    // Expiry sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(
        store.clone(),
        gate.clone(),
        SweeperSettings::default()
            .with_interval(config.sweeper.interval())
            .with_reload_gate(config.sweeper.reload_gate),
    );
    let sweeper_handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    // HTTP
    let invoice_provider: Arc<dyn InvoiceProvider> = Arc::new(BitvoraInvoiceAdapter::new(
        BitvoraConfig::new(config.payment.api_key.clone()).with_base_url(config.payment.api_base_url.clone()),
    ));

    let state = SubscriptionAppState {
        store,
        invoice_provider,
        gate,
        verifier: PaymentNotificationVerifier::new(config.payment.webhook_secret.clone()),
        invoice_settings: InvoiceSettings {
            amount: config.payment.price_per_year,
            currency: config.payment.currency.clone(),
            description: config.payment.invoice_description.clone(),
            expiry_secs: config.payment.invoice_expiry_secs,
        },
        store_timeout: config.database.operation_timeout(),
        relay_info: Arc::new(RelayInfoResponse {
            name: config.relay.name.clone(),
            description: config.relay.description.clone(),
            pubkey: config.relay.pubkey.clone(),
            icon: config.relay.icon.clone(),
            contact: config.relay.contact.clone(),
            url: config.relay.url.clone(),
            price_per_year: config.payment.price_per_year,
            currency: config.payment.currency.clone(),
        }),
    };

    let http_settings = HttpSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = app_router(state, &http_settings);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background work
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "Expiry sweeper task failed");
    }
    pool.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
