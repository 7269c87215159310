use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use services::geo::ports::GeoCurrency;

/// First address in x-forwarded-for, or empty to let the lookup service
/// resolve the connecting address itself.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Currency display info for the caller's location
#[utoipa::path(
    get,
    path = "/location",
    tag = "Geo",
    responses(
        (status = 200, description = "Currency display info (USD defaults when lookup fails)", body = GeoCurrency)
    )
)]
pub async fn location(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Json<GeoCurrency> {
    let ip = client_ip(&headers);
    Json(app_state.geo_service.currency_for_ip(&ip).await)
}

pub fn create_geo_router() -> Router<AppState> {
    Router::new().route("/location", get(location))
}
