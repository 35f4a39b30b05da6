mod api;
pub mod config;
mod state;
mod watcher;

use axum::{
    Router,
    routing::{get, post},
};
use sheet_ledger::LedgerConfig;
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use state::{AppState, FileChangeEvent};
use watcher::FileWatcher;

pub const DEFAULT_PORT: u16 = 8472;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/inventory", get(api::inventory))
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/sales", get(api::sales).post(api::record_sale))
        .route(
            "/api/purchases",
            get(api::purchases).post(api::record_purchase),
        )
        .route("/api/sales/delete", post(api::delete_sale))
        .route("/api/purchases/delete", post(api::delete_purchase))
        .route("/api/events", get(api::file_changes_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(workbook: PathBuf, config: LedgerConfig, port: u16) -> anyhow::Result<()> {
    // Initialize tracing if not already initialized
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheet_ledger=info,sheet_ledger_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let (file_change_tx, _) = broadcast::channel(16);
    let state = AppState::new(&workbook, config, file_change_tx.clone());

    let _watcher = FileWatcher::new(&workbook, move || {
        // no subscribers is not an error
        let _ = file_change_tx.send(FileChangeEvent);
    })?;

    let listen = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("Server listening on http://{}", listen);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
