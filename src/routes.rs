//! HTTP transport: route definitions, handlers, and server startup
//!
//! Handlers translate query/path parameters into typed service calls and
//! serialize the results to JSON. All endpoints are reads under `/api/v1`.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::models::{
    BusinessDto, BusinessTimeline, CityComparison, CityTimeline, DateWindow, PhotoDto, ReviewDto,
    StateComparison, StateTimeline,
};
use crate::state::AppState;
use crate::validation::InputValidator;

/// Build the API router with tracing and CORS middleware
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Businesses
        .route("/api/v1/businesses", get(list_businesses))
        .route("/api/v1/businesses/search", get(search_businesses))
        .route("/api/v1/businesses/viewport", get(businesses_in_viewport))
        .route("/api/v1/businesses/:id", get(get_business))
        .route("/api/v1/businesses/:id/reviews", get(get_business_reviews))
        .route("/api/v1/businesses/:id/photos", get(get_business_photos))
        // Locations
        .route("/api/v1/locations/states", get(get_states))
        .route("/api/v1/locations/cities", get(get_cities))
        // Analytics
        .route(
            "/api/v1/analytics/business/:id/ratings-timeline",
            get(business_ratings_timeline),
        )
        .route(
            "/api/v1/analytics/business/:id/sentiment-timeline",
            get(business_sentiment_timeline),
        )
        .route(
            "/api/v1/analytics/business/:id/comparison/city",
            get(business_city_comparison),
        )
        .route(
            "/api/v1/analytics/business/:id/comparison/state",
            get(business_state_comparison),
        )
        .route(
            "/api/v1/analytics/city/:state/:city/ratings-timeline",
            get(city_ratings_timeline),
        )
        .route(
            "/api/v1/analytics/state/:state/ratings-timeline",
            get(state_ratings_timeline),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(allowed_origins))
}

/// Serve the router with graceful shutdown on ctrl-c or SIGTERM
pub async fn start_server(router: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
struct ListParams {
    state: Option<String>,
    city: Option<String>,
    #[serde(default)]
    skip: u32,
    limit: Option<u32>,
}

async fn list_businesses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<BusinessDto>>> {
    let results = state
        .businesses
        .list_businesses(params.state, params.city, params.skip, params.limit)
        .await?;
    Ok(Json(results))
}

async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BusinessDto>> {
    let business = state.businesses.get_business(&id).await?;
    Ok(Json(business))
}

#[derive(Debug, Deserialize)]
struct ViewportParams {
    south: f64,
    north: f64,
    west: f64,
    east: f64,
    limit: Option<u32>,
}

async fn businesses_in_viewport(
    State(state): State<AppState>,
    Query(params): Query<ViewportParams>,
) -> Result<Json<Vec<BusinessDto>>> {
    let results = state
        .businesses
        .businesses_in_viewport(
            params.south,
            params.north,
            params.west,
            params.east,
            params.limit,
        )
        .await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    skip: u32,
    limit: Option<u32>,
}

async fn search_businesses(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BusinessDto>>> {
    let results = state
        .businesses
        .search_businesses(&params.q, params.skip, params.limit)
        .await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    skip: u32,
    limit: Option<u32>,
}

async fn get_business_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ReviewDto>>> {
    let results = state
        .businesses
        .reviews_for_business(&id, params.skip, params.limit)
        .await?;
    Ok(Json(results))
}

async fn get_business_photos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PhotoDto>>> {
    let results = state.businesses.photos_for_business(&id).await?;
    Ok(Json(results))
}

async fn get_states(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let states = state.businesses.get_states().await?;
    Ok(Json(states))
}

#[derive(Debug, Deserialize)]
struct CitiesParams {
    state: String,
}

async fn get_cities(
    State(state): State<AppState>,
    Query(params): Query<CitiesParams>,
) -> Result<Json<Vec<String>>> {
    let cities = state.businesses.get_cities(&params.state).await?;
    Ok(Json(cities))
}

#[derive(Debug, Deserialize)]
struct TimelineParams {
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl TimelineParams {
    /// Parse into a typed (period, window) pair, rejecting bad input before
    /// any query runs
    fn parse(&self) -> Result<(crate::models::Period, DateWindow)> {
        let period = InputValidator::parse_period(self.period.as_deref())?;
        let window = DateWindow {
            start: InputValidator::parse_date(self.start_date.as_deref(), "start_date")?,
            end: InputValidator::parse_date(self.end_date.as_deref(), "end_date")?,
        };
        Ok((period, window))
    }
}

#[derive(Debug, Deserialize)]
struct ComparisonParams {
    metric: Option<String>,
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl ComparisonParams {
    fn parse(&self) -> Result<(crate::models::Metric, crate::models::Period, DateWindow)> {
        let metric = InputValidator::parse_metric(self.metric.as_deref())?;
        let period = InputValidator::parse_period(self.period.as_deref())?;
        let window = DateWindow {
            start: InputValidator::parse_date(self.start_date.as_deref(), "start_date")?,
            end: InputValidator::parse_date(self.end_date.as_deref(), "end_date")?,
        };
        Ok((metric, period, window))
    }
}

async fn business_ratings_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<BusinessTimeline>> {
    let (period, window) = params.parse()?;
    let timeline = state
        .analytics
        .business_ratings_timeline(&id, period, window)
        .await?;
    Ok(Json(timeline))
}

async fn business_sentiment_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<BusinessTimeline>> {
    let (period, window) = params.parse()?;
    let timeline = state
        .analytics
        .business_sentiment_timeline(&id, period, window)
        .await?;
    Ok(Json(timeline))
}

async fn business_city_comparison(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<CityComparison>> {
    let (metric, period, window) = params.parse()?;
    let comparison = state
        .analytics
        .city_comparison(&id, metric, period, window)
        .await?;
    Ok(Json(comparison))
}

async fn business_state_comparison(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<StateComparison>> {
    let (metric, period, window) = params.parse()?;
    let comparison = state
        .analytics
        .state_comparison(&id, metric, period, window)
        .await?;
    Ok(Json(comparison))
}

async fn city_ratings_timeline(
    State(state): State<AppState>,
    Path((state_code, city)): Path<(String, String)>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<CityTimeline>> {
    let (period, window) = params.parse()?;
    let timeline = state
        .analytics
        .city_ratings_timeline(&state_code, &city, period, window)
        .await?;
    Ok(Json(timeline))
}

async fn state_ratings_timeline(
    State(state): State<AppState>,
    Path(state_code): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<StateTimeline>> {
    let (period, window) = params.parse()?;
    let timeline = state
        .analytics
        .state_ratings_timeline(&state_code, period, window)
        .await?;
    Ok(Json(timeline))
}
