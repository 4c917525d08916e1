use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::{OrderStatus, OrderView},
    resolver,
    response::{ApiResponse, Meta},
    services::pricing::{self, ShippingPolicy},
    state::AppState,
};

/// Next display order number from the most recent one. Seeds #1001 when no
/// order exists or the stored value does not parse.
pub fn next_from(last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.trim_start_matches('#').parse::<i64>().ok())
        .map(|n| n + 1)
        .unwrap_or(1001);
    format!("#{next}")
}

/// Read-then-write with no lock: concurrent creators can compute the same
/// number; the unique index on order_number fails one of them instead of
/// storing a duplicate.
pub async fn next_order_number<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    let last = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .one(db)
        .await?;
    Ok(next_from(last.as_ref().map(|o| o.order_number.as_str())))
}

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let policy = ShippingPolicy::from_config(&state.config);
    let cart = pricing::price_cart(&state.orm, &payload.items, &policy).await?;
    let order_number = next_order_number(&state.orm).await?;

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        customer_name: Set(payload.customer_name),
        email: Set(payload.email),
        phone: Set(payload.phone),
        address: Set(payload.address),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        total: Set(cart.total),
        shipping: Set(cart.shipping),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &cart.lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            size: Set(line.size),
            quantity: Set(line.quantity),
            price: Set(line.subtotal),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let view = order_view(&state.orm, order).await?;
    emit_guarded(&view, |value| state.hub.emit_new_order(value));

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": view.id, "order_number": view.order_number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        view,
        Some(Meta::empty()),
    ))
}

pub async fn get_order(state: &AppState, raw_id: &str) -> AppResult<ApiResponse<OrderView>> {
    let order = resolver::resolve_required::<Orders, _>(&state.orm, raw_id).await?;
    let view = order_view(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", view, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    status: Option<String>,
) -> AppResult<ApiResponse<OrderList>> {
    let mut finder = Orders::find().order_by_desc(OrderCol::CreatedAt);
    if let Some(raw) = status.as_ref().filter(|s| !s.is_empty()) {
        let status =
            OrderStatus::from_str(raw).map_err(AppError::BadRequest)?;
        finder = finder.filter(OrderCol::Status.eq(status.as_str()));
    }

    let orders = finder.all(&state.orm).await?;
    let items = order_views(&state.orm, orders).await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::total(total)),
    ))
}

/// Overwrite the status unconditionally; no transition graph is enforced.
pub async fn update_status(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let order = resolver::resolve_required::<Orders, _>(&state.orm, raw_id).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    let view = order_view(&state.orm, order).await?;
    let order_id = view.id.clone();
    emit_guarded(&view, |value| {
        state
            .hub
            .emit_order_status_change(&order_id, payload.status.as_str(), value)
    });

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.admin_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": view.id, "status": payload.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        view,
        Some(Meta::empty()),
    ))
}

/// Delete cascades to the order's items. No event is emitted for deletion.
pub async fn delete_order(
    state: &AppState,
    admin: &AuthAdmin,
    raw_id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = resolver::resolve_required::<Orders, _>(&state.orm, raw_id).await?;
    let order_id = order.id;

    Orders::delete_by_id(order_id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.admin_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Flatten one order with its items and the referenced products' display
/// fields.
pub async fn order_view<C: ConnectionTrait>(db: &C, order: OrderModel) -> AppResult<OrderView> {
    let mut views = order_views(db, vec![order]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order projection missing")))
}

async fn order_views<C: ConnectionTrait>(
    db: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderView>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(db)
        .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<_>> = HashMap::new();
    for item in items {
        let product = products.get(&item.product_id).cloned();
        grouped.entry(item.order_id).or_default().push((item, product));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let pairs = grouped.remove(&order.id).unwrap_or_default();
            OrderView::from_parts(order, pairs)
        })
        .collect())
}

/// Serialize the projection and hand it to the hub; a failed emission must
/// never fail the underlying write.
fn emit_guarded(view: &OrderView, emit: impl FnOnce(serde_json::Value)) {
    match serde_json::to_value(view) {
        Ok(value) => emit(value),
        Err(err) => tracing::warn!(error = %err, "skipping notification, projection not serializable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_at_1001_when_no_order_exists() {
        assert_eq!(next_from(None), "#1001");
    }

    #[test]
    fn increments_the_latest_number() {
        assert_eq!(next_from(Some("#1001")), "#1002");
        assert_eq!(next_from(Some("#2499")), "#2500");
    }

    #[test]
    fn unparsable_number_falls_back_to_seed() {
        assert_eq!(next_from(Some("ORD-17")), "#1001");
        assert_eq!(next_from(Some("#")), "#1001");
    }
}
