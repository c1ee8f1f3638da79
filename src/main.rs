use payroll_backend::{
    config::{get_config, init_config},
    database::{
        pool::{create_pool, run_migrations},
        MemoryStore, PayrollStore, PgStore,
    },
    routes, AppSettings, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let store: Arc<dyn PayrollStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    if config.mail_relay_url.is_none() {
        warn!("MAIL_RELAY_URL not set; messages will only be logged");
    }

    let app_state = AppState::new(store, AppSettings::from(config))?;

    {
        let notifier = app_state.notification_service.clone();
        let interval = Duration::from_secs(config.message_sweep_secs.max(1));
        tokio::spawn(notifier.run_sweeper(interval));
    }

    let app = routes::app(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
