pub mod api;
pub mod dtos;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Extension, Router, ServiceExt,
    extract::Request,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use api::{health_controller::health_endpoint, stream_controller::StreamController};
use error::Error;
use services::AppServices;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct RelayApplicationServer;

impl RelayApplicationServer {
    pub async fn serve(config: Arc<AppConfig>) -> anyhow::Result<()> {
        Lazy::force(&STARTED_AT);

        let metrics = Self::metrics_handle()?;

        // cancelled on ctrl-c/sigterm, every relay token hangs off this one
        let shutdown = CancellationToken::new();
        let services = AppServices::new(config.clone(), shutdown.clone())?;

        let app = Self::app(
            Self::router(services)
                .route("/metrics", get(move || std::future::ready(metrics.render()))),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("could not bind {}", addr))?;

        info!("relay listening on {}", addr);

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(Self::shutdown_signal(shutdown))
            .await
            .context("server error")?;

        info!("relay stopped");
        Ok(())
    }

    /// the full app minus the metrics endpoint, which needs a global recorder
    pub fn router(services: AppServices) -> Router {
        let cors = Self::cors_layer(&services.config.cors_origin);

        Router::new()
            .nest("/stream", StreamController::app())
            .route("/health", get(health_endpoint))
            .fallback(|| async { Error::NotFound })
            .layer(Extension(services))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// wraps the router so `/stream/12/` and `/stream/12` land on the same route. Has to sit
    /// outside the `Router`, a layer added with `Router::layer` runs after routing
    pub fn app(router: Router) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(router)
    }

    fn metrics_handle() -> anyhow::Result<PrometheusHandle> {
        PrometheusBuilder::new()
            .install_recorder()
            .context("could not install prometheus recorder")
    }

    fn cors_layer(cors_origin: &str) -> CorsLayer {
        let origin = if cors_origin.trim() == "*" {
            AllowOrigin::from(Any)
        } else {
            let origins: Vec<HeaderValue> = cors_origin
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter_map(|o| match o.parse() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!("ignoring invalid cors origin: {}", o);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        // players need to read these back to seek
        let exposed: [HeaderName; 3] = [
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
        ];

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers([header::RANGE, header::CONTENT_TYPE])
            .expose_headers(exposed)
    }

    async fn shutdown_signal(shutdown: CancellationToken) {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {}", e);
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
                    warn!("failed to listen for sigterm: {}", e);
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

        info!("shutdown signal received, closing open relays...");
        shutdown.cancel();
    }
}
