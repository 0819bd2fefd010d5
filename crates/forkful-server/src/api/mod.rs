//! HTTP surface: router assembly, shared state and the small handlers that
//! do not belong to a resource module.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Path, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use forkful_shared::constants::APP_NAME;
use forkful_shared::token::TokenSigner;
use forkful_store::Database;

use crate::config::ServerConfig;
use crate::credential::LEGACY_HEADER;
use crate::error::{InternalDetail, ServerError};
use crate::image_store::ImageStore;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

mod auth;
mod menu;
mod orders;
mod restaurants;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub tokens: Arc<TokenSigner>,
    pub images: Arc<ImageStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

/// JSON body extractor whose rejection is a regular 400 error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// Parse a path identifier, reporting a malformed one as a validation error.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServerError::validation("id", format!("Invalid {what} id")))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(LEGACY_HEADER),
        ]);

    let credential_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let routes = Router::new()
        .route("/", get(service_info))
        .merge(credential_routes)
        .route("/auth/verify", get(auth::verify))
        .route("/restaurants", get(restaurants::list))
        .route("/restaurants/create-restaurant", post(restaurants::create))
        .route("/restaurants/owner", get(restaurants::list_owned))
        .route("/restaurants/:id", get(restaurants::get_one))
        .route("/menu/create-menu", post(menu::create))
        .route("/menu/restaurant/:restaurant_id", get(menu::list_for_restaurant))
        .route("/menu/owner-menu/:restaurant_id", get(menu::owner_menu))
        .route("/orders", get(orders::list_for_restaurant))
        .route("/orders/create-order", post(orders::create))
        .route("/orders/customer-orders", get(orders::list_for_customer))
        .route("/orders/:id", get(orders::get_one).delete(orders::cancel))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/uploads/:file", get(serve_image));

    let mut router = Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(state.images.max_size() + 1024 * 1024));

    if state.config.dev_mode {
        router = router.layer(middleware::from_fn(expose_internal_detail));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    status: &'static str,
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

async fn serve_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ServerError> {
    let (data, content_type) = state.images.read_image(&file).await?;
    Ok(([(CONTENT_TYPE, content_type)], data).into_response())
}

/// Development mode only: put the underlying error text back into 500
/// bodies.
async fn expose_internal_detail(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<InternalDetail>() {
        Some(InternalDetail(detail)) => {
            let body = serde_json::json!({
                "message": "Internal server error",
                "code": "INTERNAL_ERROR",
                "detail": detail,
            });
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
