use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::analytics::{DashboardStats, SalesReport, SalesReportQuery},
    error::AppResult,
    middleware::auth::AuthAdmin,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/sales-report", get(sales_report))
}

#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<DashboardStats>),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "Analytics"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    Ok(Json(analytics_service::dashboard(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/sales-report",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Period sales report", body = ApiResponse<SalesReport>),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "Analytics"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let period = query.period.unwrap_or_default();
    Ok(Json(analytics_service::sales_report(&state, period).await?))
}
