//! HTTP surface of the dashboard
//!
//! `GET /api/forecast` answers the day/hour grid as JSON; everything else is
//! served from the static directory holding the dashboard page.

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::Result;
use crate::cache::CacheStore;
use crate::forecast_cache::ForecastCache;
use crate::view::{ViewBuilder, ViewGrid};
use crate::weather::ForecastSource;

/// What a request handler needs to answer the dashboard
pub struct AppState<S, C> {
    pub forecast: ForecastCache<S, C>,
    pub cache_key: String,
}

pub fn router<S, C>(state: Arc<AppState<S, C>>, static_dir: &str) -> Router
where
    S: ForecastSource + 'static,
    C: CacheStore + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/forecast", get(get_forecast::<S, C>))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(ServiceBuilder::new().layer(cors))
}

async fn get_forecast<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
) -> std::result::Result<Json<ViewGrid>, (StatusCode, String)>
where
    S: ForecastSource + 'static,
    C: CacheStore + 'static,
{
    match state.forecast.get(&state.cache_key).await {
        Ok(series) => Ok(Json(ViewBuilder::build(&series))),
        Err(err) => {
            tracing::error!("Failed to load the hourly forecast: {err}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.user_message()))
        }
    }
}

/// Serves `app` on `addr` until Ctrl-C or SIGTERM
pub async fn run(app: Router, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard running at http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::debug!("Received shutdown signal");
}
