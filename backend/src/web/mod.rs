use axum::extract::{Request, State};
use axum::http::HeaderName;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::admin::AdminService;
use crate::config::Config;
use crate::repository::TaskRepository;
use crate::store::{MemoryStore, RedisStore, Store};

pub mod api;
mod error;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskRepository<dyn Store>,
    pub admin: AdminService<dyn Store>,
    pub identity_header: HeaderName,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, identity_header: HeaderName) -> Self {
        Self {
            tasks: TaskRepository::new(store.clone()),
            admin: AdminService::new(store),
            identity_header,
        }
    }
}

/// Resolves the caller from the identity header forwarded by the gateway.
/// A missing or unparsable header leaves the request anonymous; handlers
/// then answer 401.
pub async fn identify(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .headers()
        .get(&state.identity_header)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok());

    if let Some(user_id) = user_id {
        let caller = state.admin.resolve_caller(user_id).await?;
        request.extensions_mut().insert(caller);
    }

    Ok(next.run(request).await)
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/api/tasks/:id",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/api/tasks/:id/completion", put(api::set_completion))
        .route("/api/overview", get(api::overview))
        .route("/api/today", get(api::today))
        .route("/api/calendar", get(api::calendar))
        .route("/api/profile", put(api::update_profile))
        .route(
            "/api/admin/tasks",
            get(api::list_all_tasks).post(api::assign_task),
        )
        .route("/api/admin/users", get(api::list_users))
        .route("/api/admin/dashboard", get(api::admin_dashboard))
        .layer(from_fn_with_state(state.clone(), identify));

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("Using Redis task store");
            Ok(Arc::new(RedisStore::open(url)?))
        }
        None => {
            tracing::warn!("REDIS_URL not set, tasks are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let identity_header = HeaderName::from_bytes(config.identity_header.as_bytes())?;
    let state = AppState::new(open_store(&config)?, identity_header);

    if let Some(admin_id) = config.admin_user_id {
        state.admin.ensure_admin(admin_id, &config.admin_email).await?;
    }

    let server_address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Server running on http://{}", server_address);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
