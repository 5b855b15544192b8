//! Application startup and lifecycle management.

use axum::middleware::from_fn;
use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{InvoicingConfig, StorageBackend};
use crate::handlers::{self, invoices};
use crate::middleware::http_metrics_middleware;
use crate::services::{Database, InFileDatabase, InMemoryDatabase, InvoiceService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub invoices: InvoiceService,
}

/// Open the store selected by `config`.
pub fn open_database(config: &InvoicingConfig) -> Result<Arc<dyn Database>, AppError> {
    let db: Arc<dyn Database> = match config.storage.backend {
        StorageBackend::File => {
            tracing::info!(
                database_file = %config.storage.database_file,
                id_file = %config.storage.id_file,
                "Using file-backed invoice store"
            );
            Arc::new(InFileDatabase::new(
                &config.storage.database_file,
                &config.storage.id_file,
            )?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory invoice store; invoices are lost on restart");
            Arc::new(InMemoryDatabase::new())
        }
    };
    Ok(db)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/invoices",
            get(invoices::list_invoices)
                .post(invoices::save_invoice)
                .delete(invoices::remove_invoice),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice).put(invoices::update_invoice),
        )
        .route(
            "/invoices/:date_from/:date_to",
            get(invoices::find_invoices_by_date_range),
        )
        .layer(from_fn(http_metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        let db = open_database(&config)?;
        db.health_check().await.map_err(|e| {
            tracing::error!("Invoice store is not usable: {}", e);
            AppError::from(e)
        })?;

        let state = AppState {
            invoices: InvoiceService::new(db),
        };

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Invoicing service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use service_core::config::Config;
    use tower::ServiceExt;

    fn memory_config() -> InvoicingConfig {
        InvoicingConfig {
            common: Config::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_file: String::new(),
                id_file: String::new(),
            },
        }
    }

    fn router() -> Router {
        let config = memory_config();
        let db = open_database(&config).unwrap();
        build_router(AppState {
            invoices: InvoiceService::new(db),
        })
    }

    #[test]
    fn file_backend_rejects_empty_paths() {
        let mut config = memory_config();
        config.storage.backend = StorageBackend::File;

        assert!(matches!(
            open_database(&config),
            Err(AppError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn post_then_get_over_memory_store() {
        let app = router();
        let body = r#"{"identifier":"FV/1","issuedDate":"2018-02-01","buyer":"Acme","seller":"Globex",
            "entries":[{"description":"Tea","price":"12.00","vat":"REDUCED5"}]}"#;

        let response = app
            .clone()
            .oneshot(
                Request::post("/invoices")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/invoices/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_invoice_is_not_found() {
        let response = router()
            .oneshot(Request::get("/invoices/3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
