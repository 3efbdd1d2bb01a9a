use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post, put},
};
use clinic_api::ApiResult;
use clinic_auth::{Action, Allowed, AuthState, JwtService, PolicyEngine, Principal, ResourceRef};
use clinic_db_memory::InMemoryStorage;
use clinic_db_postgres::PostgresStorage;
use clinic_storage::{DynStorage, StorageOwnership};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend};
use crate::{bootstrap, handlers, middleware as app_middleware};

/// Shared handler state. Everything is injected at construction.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub jwt_service: Arc<JwtService>,
    pub policy: PolicyEngine,
}

impl AppState {
    pub fn new(storage: DynStorage, jwt_service: Arc<JwtService>) -> Self {
        Self {
            storage,
            jwt_service,
            policy: PolicyEngine::new(),
        }
    }

    /// Runs the policy engine against this state's store.
    pub async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        resource: ResourceRef,
    ) -> ApiResult<Allowed> {
        let resolver = StorageOwnership::new(self.storage.as_ref());
        Ok(self
            .policy
            .authorize(principal, action, &resource, &resolver)
            .await?)
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        AuthState::new(state.jwt_service.clone())
    }
}

pub fn build_app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Accounts
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        // Patients
        .route("/api/patients", get(handlers::patients::list_patients))
        .route(
            "/api/patients/{id}",
            get(handlers::patients::get_patient).put(handlers::patients::update_patient),
        )
        .route(
            "/api/patients/{id}/appointments",
            get(handlers::appointments::list_patient_appointments),
        )
        .route(
            "/api/patients/{id}/medical-records",
            get(handlers::medical_records::list_patient_medical_records),
        )
        .route(
            "/api/patients/{id}/prescriptions",
            get(handlers::prescriptions::list_patient_prescriptions),
        )
        .route(
            "/api/patients/{id}/billing",
            get(handlers::billing::list_patient_billing),
        )
        // Providers
        .route("/api/providers", get(handlers::providers::list_providers))
        .route("/api/providers/{id}", get(handlers::providers::get_provider))
        .route(
            "/api/providers/{id}/appointments",
            get(handlers::appointments::list_provider_appointments),
        )
        // Appointments
        .route(
            "/api/appointments",
            post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/{id}/status",
            put(handlers::appointments::update_appointment_status),
        )
        // Clinical
        .route(
            "/api/medical-records",
            post(handlers::medical_records::create_medical_record),
        )
        .route(
            "/api/prescriptions",
            post(handlers::prescriptions::create_prescription),
        )
        // Billing
        .route("/api/billing", post(handlers::billing::create_billing))
        .route(
            "/api/billing/{id}/status",
            put(handlers::billing::update_billing_status),
        )
        // Reports
        .route(
            "/api/reports/appointments",
            get(handlers::reports::appointment_report),
        )
        .route("/api/reports/revenue", get(handlers::reports::revenue_report))
        .with_state(state)
        // Middleware stack, innermost first; request id runs before the
        // trace span is created so the span can record it.
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ClinicServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    storage: Option<DynStorage>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            storage: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses an already constructed store instead of the configured backend.
    pub fn with_storage(mut self, storage: DynStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub async fn build(self) -> anyhow::Result<ClinicServer> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => create_storage(&self.config).await?,
        };

        let auth = &self.config.auth;
        let jwt_service = Arc::new(
            JwtService::new(auth.jwt_secret.as_bytes(), auth.issuer.clone())
                .with_lifetime_secs(auth.token_lifetime_secs),
        );

        if let Some(ref admin) = self.config.bootstrap.admin_user {
            bootstrap::bootstrap_admin_user(storage.as_ref(), admin)
                .await
                .context("admin bootstrap failed")?;
        }

        let state = AppState::new(storage, jwt_service);
        let app = build_app(state, self.config.server.body_limit_bytes);

        Ok(ClinicServer {
            addr: self.addr,
            app,
        })
    }
}

async fn create_storage(cfg: &AppConfig) -> anyhow::Result<DynStorage> {
    match cfg.storage.backend {
        StorageBackend::Postgres => {
            let storage = PostgresStorage::new(cfg.storage.postgres.to_postgres_config())
                .await
                .context("failed to initialize PostgreSQL storage")?;
            tracing::info!("PostgreSQL storage initialized");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(InMemoryStorage::new()))
        }
    }
}

impl ClinicServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
