mod rate_limit;

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use atoll_catalog::{Catalog, CatalogStats};
use atoll_core::{Activity, EditOp, EssentialsConfig, PlannerConfig};
use atoll_observability::{AppMetrics, MetricsSnapshot};
use atoll_service::{
    ActivitiesUpdate, CreateTripRequest, HotelUpdate, PartyUpdate, PlanRequest, SelectionUpdate,
    ServiceError, StartDateUpdate, TripService,
};
use atoll_storage::Store;
use axum::extract::{Json, Path as AxumPath, State};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::rate_limit::IpRateLimiter;

const DEFAULT_TRIP_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;
const PURGE_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
#[allow(private_interfaces)]
pub struct ApiState {
    pub service: Arc<TripService<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
}

pub async fn build_app(catalog_root: impl AsRef<Path>) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let catalog = Catalog::from_dir(catalog_root).context("failed to load catalog")?;
    metrics.add_catalog_records_skipped(catalog.stats().skipped_records);

    let config = match env::var("ATOLL_PLANNER_CONFIG") {
        Ok(path) => PlannerConfig::from_json_file(&path)
            .with_context(|| format!("failed to load planner config from {path}"))?,
        Err(_) => PlannerConfig::default(),
    };

    let store = if let Ok(database_url) = env::var("ATOLL_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let trip_ttl_seconds = env::var("ATOLL_TRIP_TTL_SECONDS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TRIP_TTL_SECONDS);

    let service = Arc::new(TripService::new(
        Arc::new(catalog),
        config,
        Arc::new(store),
        metrics.clone(),
        chrono::Duration::seconds(trip_ttl_seconds),
    ));
    spawn_purge_loop(service.clone());

    let api_key = env::var("ATOLL_API_KEY").unwrap_or_else(|_| "dev-atoll-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("ATOLL_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("ATOLL_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);

    let state = ApiState {
        service,
        metrics,
        api_key,
        limiter: IpRateLimiter::new(rate_limit_window, rate_limit_max),
    };

    Ok(build_router(state))
}

/// Sweeps expired trips hourly for the life of the process.
fn spawn_purge_loop(service: Arc<TripService<Store>>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match service.purge_expired_trips().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "purged expired trips"),
                Err(error) => warn!(error = %error, "trip purge sweep failed"),
            }
        }
    });
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/catalog/locations", get(catalog_locations))
        .route("/v1/catalog/activities", get(catalog_activities))
        .route(
            "/v1/catalog/locations/:id/suggestions",
            get(location_suggestions),
        )
        .route("/v1/plan", post(plan))
        .route("/v1/trips", post(trip_create))
        .route("/v1/trips/:id", get(trip_get).delete(trip_delete))
        .route("/v1/trips/:id/selection", post(trip_update_selection))
        .route("/v1/trips/:id/essentials", post(trip_update_essentials))
        .route("/v1/trips/:id/hotels", post(trip_choose_hotel))
        .route("/v1/trips/:id/party", post(trip_set_party))
        .route("/v1/trips/:id/activities", post(trip_set_activities))
        .route("/v1/trips/:id/start-date", post(trip_set_start_date))
        .route("/v1/trips/:id/edits", post(trip_apply_edit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    catalog: CatalogStats,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        catalog: state.service.catalog().stats(),
    };
    (StatusCode::OK, Json(payload))
}

async fn catalog_locations(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.catalog().locations().to_vec())
}

async fn catalog_activities(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.catalog().activities().to_vec())
}

async fn location_suggestions(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    let catalog = state.service.catalog();
    if catalog.location(&id).is_none() {
        return error_response(
            StatusCode::NOT_FOUND,
            "unknown_location",
            &format!("no location with id {id}"),
        );
    }

    let suggestions: Vec<Activity> = catalog.suggest_for(&id).into_iter().cloned().collect();
    Json(suggestions).into_response()
}

async fn plan(State(state): State<ApiState>, Json(request): Json<PlanRequest>) -> impl IntoResponse {
    Json(state.service.plan_once(request).await)
}

async fn trip_create(
    State(state): State<ApiState>,
    Json(request): Json<CreateTripRequest>,
) -> Response {
    match state.service.create_trip(request).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_get(State(state): State<ApiState>, AxumPath(id): AxumPath<String>) -> Response {
    match state.service.get_trip(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_delete(State(state): State<ApiState>, AxumPath(id): AxumPath<String>) -> Response {
    match state.service.delete_trip(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "trip_not_found",
            &format!("no trip with id {id}"),
        ),
        Err(error) => service_error_response(error),
    }
}

async fn trip_update_selection(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<SelectionUpdate>,
) -> Response {
    match state.service.update_selection(&id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_update_essentials(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(essentials): Json<EssentialsConfig>,
) -> Response {
    match state.service.update_essentials(&id, essentials).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_choose_hotel(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<HotelUpdate>,
) -> Response {
    match state.service.choose_hotel(&id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_set_party(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<PartyUpdate>,
) -> Response {
    match state.service.set_party(&id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_set_activities(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<ActivitiesUpdate>,
) -> Response {
    match state.service.set_activities(&id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_set_start_date(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<StartDateUpdate>,
) -> Response {
    match state.service.set_start_date(&id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn trip_apply_edit(
    State(state): State<ApiState>,
    AxumPath(id): AxumPath<String>,
    Json(op): Json<EditOp>,
) -> Response {
    match state.service.apply_edit(&id, op).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => service_error_response(error),
    }
}

fn service_error_response(error: ServiceError) -> Response {
    match &error {
        ServiceError::TripNotFound(trip_id) => error_response(
            StatusCode::NOT_FOUND,
            "trip_not_found",
            &format!("no trip with id {trip_id}"),
        ),
        ServiceError::Edit(edit) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "edit_rejected",
            &edit.to_string(),
        ),
        ServiceError::Internal(internal) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            &internal.to_string(),
        ),
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-api-key",
        );
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded for this IP",
        );
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_forwarded_for(value: Option<&str>) -> Request<Body> {
        let builder = Request::builder().uri("/v1/plan");
        let builder = match value {
            Some(header) => builder.header("x-forwarded-for", header),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn request_ip_takes_first_forwarded_hop() {
        let request = request_with_forwarded_for(Some("203.0.113.9, 198.51.100.2"));
        assert_eq!(request_ip(&request), "203.0.113.9");
    }

    #[test]
    fn request_ip_falls_back_to_local() {
        let request = request_with_forwarded_for(None);
        assert_eq!(request_ip(&request), "local");
    }

    #[test]
    fn only_health_is_public() {
        assert!(is_public_endpoint("/health"));
        assert!(!is_public_endpoint("/v1/plan"));
        assert!(!is_public_endpoint("/v1/trips"));
    }
}
