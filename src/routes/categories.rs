use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    error::AppResult,
    middleware::auth::AuthAdmin,
    models::CategoryView,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories", body = ApiResponse<CategoryList>),
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(category_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    responses(
        (status = 200, description = "Category", body = ApiResponse<CategoryView>),
        (status = 404, description = "Not found"),
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    Ok(Json(category_service::get_category(&state, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<CategoryView>),
        (status = 409, description = "Duplicate key"),
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    Ok(Json(
        category_service::create_category(&state, &admin, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<CategoryView>),
        (status = 404, description = "Not found"),
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    Ok(Json(
        category_service::update_category(&state, &admin, &id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        category_service::delete_category(&state, &admin, &id).await?,
    ))
}
