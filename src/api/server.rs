use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::reader::{BoundedReader, Converter};
use crate::service::{AppResult, NetworkConfig, ReadConfig};
use crate::source::MessageSource;

use super::read::handle_read;

/// Shared per-process state handed to every request handler. The shutdown
/// token doubles as the parent cancellation context of every read.
pub struct AppState<S> {
    pub reader: Arc<BoundedReader<S>>,
    pub source: Arc<S>,
    pub read: ReadConfig,
    pub shutdown: CancellationToken,
}

impl<S: MessageSource> AppState<S> {
    pub fn new(
        source: Arc<S>,
        converter: Converter,
        read: ReadConfig,
        shutdown: CancellationToken,
    ) -> AppState<S> {
        AppState {
            reader: Arc::new(BoundedReader::new(Arc::clone(&source), converter)),
            source,
            read,
            shutdown,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            reader: Arc::clone(&self.reader),
            source: Arc::clone(&self.source),
            read: self.read.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

pub async fn run_server<S: MessageSource + 'static>(
    network: &NetworkConfig,
    state: AppState<S>,
) -> AppResult<()> {
    let shutdown = state.shutdown.clone();
    let app = Router::new()
        .route("/read", get(handle_read::<S>))
        .route("/healthz", get(health))
        .route("/readiness", get(health))
        .with_state(state);

    let listener = TcpListener::bind(format!("{}:{}", network.ip, network.port)).await?;
    info!(ip = %network.ip, port = network.port, "starting http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    info!("http server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}
