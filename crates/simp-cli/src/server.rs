use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use simp_core::{ConstantRequest, Resolution, Resolver, UnavailableStore};
use simp_store::Store;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::envelope::Envelope;

pub const CONSTANTS_PATH: &str = "/calculoKPC/obterConstantesFisicas";

pub struct AppState {
    store: Arc<Mutex<Store>>,
    lock_timeout: Duration,
}

impl AppState {
    pub fn new(store: Store, lock_timeout: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            lock_timeout,
        }
    }

    /// Resolve against the store, or against static tables alone if the
    /// store is not free within the lock timeout. SQLite work runs on the
    /// blocking pool so a slow query never stalls the async workers.
    async fn resolve(&self, request: ConstantRequest) -> Resolution {
        let store =
            match tokio::time::timeout(self.lock_timeout, Arc::clone(&self.store).lock_owned())
                .await
            {
                Ok(store) => store,
                Err(_) => {
                    tracing::warn!(
                        "store busy for more than {:?}; resolving from static tables",
                        self.lock_timeout
                    );
                    return resolve_without_store(&request, "store lock timed out");
                }
            };

        let lookup =
            tokio::task::spawn_blocking(move || Resolver::new(&*store).resolve_request(&request));
        match lookup.await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!("store resolution task failed: {e}; resolving from static tables");
                resolve_without_store(&request, "store task failed")
            }
        }
    }
}

fn resolve_without_store(request: &ConstantRequest, reason: &str) -> Resolution {
    Resolver::new(UnavailableStore::new(reason)).resolve_request(request)
}

#[derive(Debug, Default, Deserialize)]
pub struct ConstantParams {
    pub tipo: Option<String>,
    pub diametro_nominal: Option<String>,
    pub projecao_tap: Option<String>,
    pub temperatura: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CONSTANTS_PATH, get(obter_constantes))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Constants endpoint. Always answers with a JSON envelope; bad input is
/// reported as `success: false`, never as an HTTP error.
pub async fn obter_constantes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConstantParams>,
) -> Json<Envelope> {
    let request = match ConstantRequest::parse(
        params.tipo.as_deref(),
        params.diametro_nominal.as_deref(),
        params.projecao_tap.as_deref(),
        params.temperatura.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!("rejected constants request: {e}");
            return Json(Envelope::error(&e));
        }
    };

    Json(Envelope::from(state.resolve(request).await))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
