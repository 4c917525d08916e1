use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::CategoryView,
    resolver,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<CategoryView> = Categories::find()
        .order_by_asc(Column::Key)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CategoryView::from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_category(state: &AppState, raw_id: &str) -> AppResult<ApiResponse<CategoryView>> {
    let category = resolver::resolve_required::<Categories, _>(&state.orm, raw_id).await?;
    Ok(ApiResponse::success(
        "Category",
        CategoryView::from_entity(category),
        None,
    ))
}

pub async fn create_category(
    state: &AppState,
    admin: &AuthAdmin,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<CategoryView>> {
    let duplicate = Categories::find()
        .filter(Column::Key.eq(payload.key.clone()))
        .one(&state.orm)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "Category with this key already exists".into(),
        ));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        key: Set(payload.key),
        label: Set(payload.label),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let category = active.insert(&state.orm).await?;
    let view = CategoryView::from_entity(category);

    if let Ok(value) = serde_json::to_value(&view) {
        state.hub.emit_category_created(value);
    }

    audit(state, admin, "category_create", &view.id).await;

    Ok(ApiResponse::success(
        "Category created",
        view,
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<CategoryView>> {
    let existing = resolver::resolve_required::<Categories, _>(&state.orm, raw_id).await?;

    if let Some(key) = payload.key.as_ref() {
        let duplicate = Categories::find()
            .filter(Column::Key.eq(key.clone()))
            .filter(Column::Id.ne(existing.id))
            .one(&state.orm)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "Category with this key already exists".into(),
            ));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(key) = payload.key {
        active.key = Set(key);
    }
    if let Some(label) = payload.label {
        active.label = Set(label);
    }
    active.updated_at = Set(Utc::now().into());

    let category = active.update(&state.orm).await?;
    let view = CategoryView::from_entity(category);

    if let Ok(value) = serde_json::to_value(&view) {
        state.hub.emit_category_updated(value);
    }

    audit(state, admin, "category_update", &view.id).await;

    Ok(ApiResponse::success("Updated", view, Some(Meta::empty())))
}

pub async fn delete_category(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let category = resolver::resolve_required::<Categories, _>(&state.orm, raw_id).await?;
    let category_id = category.id.to_string();

    Categories::delete_by_id(category.id)
        .exec(&state.orm)
        .await?;

    state.hub.emit_category_deleted(&category_id);
    audit(state, admin, "category_delete", &category_id).await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn audit(state: &AppState, admin: &AuthAdmin, action: &str, category_id: &str) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.admin_id),
        action,
        Some("categories"),
        Some(serde_json::json!({ "category_id": category_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
