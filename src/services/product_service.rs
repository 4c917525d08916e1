use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, ProductQuery, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::{ProductView, join_list},
    resolver,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }
    if query.best_sellers.unwrap_or(false) {
        condition = condition.add(Column::IsBestSeller.eq(true));
    }
    if query.new_arrivals.unwrap_or(false) {
        condition = condition.add(Column::IsNewArrival.eq(true));
    }

    let items: Vec<ProductView> = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductView::from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_product(state: &AppState, raw_id: &str) -> AppResult<ApiResponse<ProductView>> {
    let product = resolver::resolve_required::<Products, _>(&state.orm, raw_id).await?;
    Ok(ApiResponse::success(
        "Product",
        ProductView::from_entity(product),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    admin: &AuthAdmin,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let duplicate = Products::find()
        .filter(Column::Slug.eq(payload.slug.clone()))
        .one(&state.orm)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "Product with this slug already exists".into(),
        ));
    }

    let category_id = parse_optional_id(payload.category_id.as_deref())?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(payload.slug),
        name: Set(payload.name),
        description: Set(payload.description),
        notes: Set(payload.notes),
        price: Set(payload.price),
        sizes: Set(join_list(&payload.sizes)),
        default_size: Set(payload.default_size),
        category: Set(payload.category),
        is_best_seller: Set(payload.is_best_seller),
        is_new_arrival: Set(payload.is_new_arrival),
        image: Set(payload.image),
        gallery: Set(payload.gallery.as_deref().map(join_list)),
        category_id: Set(category_id),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;
    let view = ProductView::from_entity(product);

    if let Ok(value) = serde_json::to_value(&view) {
        state.hub.emit_product_created(value);
    }

    audit(state, admin, "product_create", &view.id).await;

    Ok(ApiResponse::success(
        "Product created",
        view,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let existing = resolver::resolve_required::<Products, _>(&state.orm, raw_id).await?;

    if let Some(slug) = payload.slug.as_ref() {
        let duplicate = Products::find()
            .filter(Column::Slug.eq(slug.clone()))
            .filter(Column::Id.ne(existing.id))
            .one(&state.orm)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "Product with this slug already exists".into(),
            ));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(join_list(&sizes));
    }
    if let Some(default_size) = payload.default_size {
        active.default_size = Set(default_size);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(flag) = payload.is_best_seller {
        active.is_best_seller = Set(flag);
    }
    if let Some(flag) = payload.is_new_arrival {
        active.is_new_arrival = Set(flag);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    if let Some(gallery) = payload.gallery {
        active.gallery = Set(Some(join_list(&gallery)));
    }
    if let Some(category_id) = payload.category_id.as_deref() {
        active.category_id = Set(parse_optional_id(Some(category_id))?);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;
    let view = ProductView::from_entity(product);

    if let Ok(value) = serde_json::to_value(&view) {
        state.hub.emit_product_updated(value);
    }

    audit(state, admin, "product_update", &view.id).await;

    Ok(ApiResponse::success("Updated", view, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = resolver::resolve_required::<Products, _>(&state.orm, raw_id).await?;
    let product_id = product.id.to_string();

    Products::delete_by_id(product.id).exec(&state.orm).await?;

    state.hub.emit_product_deleted(&product_id);
    audit(state, admin, "product_delete", &product_id).await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn parse_optional_id(raw: Option<&str>) -> AppResult<Option<Uuid>> {
    match raw {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => resolver::parse_canonical(raw)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid category id: {raw}"))),
    }
}

async fn audit(state: &AppState, admin: &AuthAdmin, action: &str, product_id: &str) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.admin_id),
        action,
        Some("products"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
