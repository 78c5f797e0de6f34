//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::snapshot::FeedUnavailable;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations))
        .route("/api/stations/:station_id", get(get_station))
        .route("/api/status", get(cache_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List stations with at least `min_bikes` bikes available.
async fn list_stations(
    State(state): State<AppState>,
    Query(req): Query<StationsQuery>,
) -> Result<Json<Vec<StationResult>>, AppError> {
    let stations = state.snapshots.query(req.min_bikes()).await?;

    Ok(Json(
        stations.iter().map(StationResult::from_station).collect(),
    ))
}

/// Look up one station by id.
async fn get_station(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
) -> Result<Json<StationResult>, AppError> {
    let station = state
        .snapshots
        .station(&station_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown station: {station_id}"),
        })?;

    Ok(Json(StationResult::from_station(&station)))
}

/// Report what is cached, without touching upstream.
async fn cache_status(State(state): State<AppState>) -> Json<CacheStatusResponse> {
    let ttl_secs = state.snapshots.config().ttl.as_secs();

    let response = match state.snapshots.peek().await {
        Some(snapshot) => CacheStatusResponse {
            cached: true,
            station_count: snapshot.len(),
            captured_at: Some(snapshot.captured_at().to_rfc3339()),
            age_secs: Some(snapshot.age(Instant::now()).as_secs()),
            ttl_secs,
        },
        None => CacheStatusResponse {
            cached: false,
            station_count: 0,
            captured_at: None,
            age_secs: None,
            ttl_secs,
        },
    };

    Json(response)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Unavailable { message: String },
}

impl From<FeedUnavailable> for AppError {
    fn from(e: FeedUnavailable) -> Self {
        AppError::Unavailable {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            error!(%status, "{message}");
        } else {
            debug!(%status, "{message}");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedSource, MockFeedClient};
    use crate::snapshot::{CacheConfig, SnapshotCache};
    use serde_json::{Value, json};

    fn mock() -> MockFeedClient {
        MockFeedClient::new(
            json!({ "data": { "stations": [
                { "station_id": "A", "name": "Gare", "lat": 50.63, "lon": 3.07 }
            ] } }),
            json!({ "data": { "stations": [
                { "station_id": "A", "num_bikes_available": 5, "num_docks_available": 10 },
                { "station_id": "B", "num_bikes_available": 0, "num_docks_available": 3 }
            ] } }),
        )
    }

    fn state_for(mock: &MockFeedClient) -> AppState {
        AppState::new(SnapshotCache::new(
            FeedSource::from(mock.clone()),
            CacheConfig::default(),
        ))
    }

    fn min_bikes(raw: &str) -> Query<StationsQuery> {
        Query(StationsQuery {
            min_bikes: Some(raw.to_string()),
        })
    }

    fn ids(stations: &[StationResult]) -> Vec<&str> {
        stations.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn list_all_stations_by_default() {
        let state = state_for(&mock());

        let Json(stations) = list_stations(State(state), Query(StationsQuery::default()))
            .await
            .unwrap();

        assert_eq!(ids(&stations), ["A", "B"]);
        assert_eq!(stations[0].name.as_deref(), Some("Gare"));
        assert_eq!(stations[1].name, None);
    }

    #[tokio::test]
    async fn threshold_filters_and_negative_clamps() {
        let state = state_for(&mock());

        let Json(some) = list_stations(State(state.clone()), min_bikes("1"))
            .await
            .unwrap();
        let Json(negative) = list_stations(State(state.clone()), min_bikes("-5"))
            .await
            .unwrap();
        let Json(garbage) = list_stations(State(state), min_bikes("many"))
            .await
            .unwrap();

        assert_eq!(ids(&some), ["A"]);
        assert_eq!(ids(&negative), ["A", "B"]);
        assert_eq!(ids(&garbage), ["A", "B"]);
    }

    #[tokio::test]
    async fn upstream_failure_with_empty_cache_is_503() {
        let mock = mock();
        mock.set_fail_discovery(true);
        let state = state_for(&mock);

        let err = list_stations(State(state), Query(StationsQuery::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unavailable { .. }));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_station_is_404() {
        let state = state_for(&mock());

        let Json(a) = get_station(State(state.clone()), Path("A".to_string()))
            .await
            .unwrap();
        let err = get_station(State(state), Path("Z".to_string()))
            .await
            .unwrap_err();

        assert_eq!(a.bikes, 5);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_does_not_trigger_a_fetch() {
        let mock = mock();
        let state = state_for(&mock);

        let Json(before) = cache_status(State(state.clone())).await;
        assert!(!before.cached);
        assert_eq!(mock.discovery_calls(), 0);

        let Json(listed) = list_stations(State(state.clone()), Query(StationsQuery::default()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);

        let Json(after) = cache_status(State(state)).await;
        assert!(after.cached);
        assert_eq!(after.station_count, 2);
        assert_eq!(after.ttl_secs, 60);
        assert!(after.captured_at.is_some());
        assert_eq!(mock.discovery_calls(), 1);
    }

    #[tokio::test]
    async fn router_serves_json_over_http() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = create_router(state_for(&mock()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let http = reqwest::Client::new();

        let health = http.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let body: Value = http
            .get(format!("{base}/api/stations?min_bikes=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            body,
            json!([{ "id": "A", "name": "Gare", "lat": 50.63, "lon": 3.07, "bikes": 5, "docks": 10 }])
        );

        let missing = http
            .get(format!("{base}/api/stations/Z"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }
}
