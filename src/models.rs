use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::entity::{categories, order_items, orders, products};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("invalid order status: {other}")),
        }
    }
}

/// Flattened product as exposed to callers: canonical string id,
/// array-typed size and gallery fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub notes: Option<String>,
    pub price: i64,
    pub sizes: Vec<String>,
    pub default_size: i32,
    pub category: String,
    pub is_best_seller: bool,
    pub is_new_arrival: bool,
    pub image: String,
    pub gallery: Vec<String>,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    pub fn from_entity(model: products::Model) -> Self {
        Self {
            id: model.id.to_string(),
            slug: model.slug,
            name: model.name,
            description: model.description,
            notes: model.notes,
            price: model.price,
            sizes: split_list(&model.sizes),
            default_size: model.default_size,
            category: model.category,
            is_best_seller: model.is_best_seller,
            is_new_arrival: model.is_new_arrival,
            image: model.image,
            gallery: model.gallery.as_deref().map(split_list).unwrap_or_default(),
            category_id: model.category_id.map(|id| id.to_string()),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: String,
    pub key: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryView {
    pub fn from_entity(model: categories::Model) -> Self {
        Self {
            id: model.id.to_string(),
            key: model.key,
            label: model.label,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Display fields of the purchased product; price lives on the line item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: String,
    pub product: ProductRef,
    pub size: i32,
    pub quantity: i32,
    /// Line subtotal captured at purchase time.
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub status: OrderStatus,
    pub total: i64,
    pub shipping: i64,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    /// Flatten an order and its items; each item carries only the
    /// referenced product's display fields, never the full record.
    pub fn from_parts(
        order: orders::Model,
        items: Vec<(order_items::Model, Option<products::Model>)>,
    ) -> Self {
        let items = items
            .into_iter()
            .map(|(item, product)| OrderItemView {
                id: item.id.to_string(),
                product: match product {
                    Some(p) => ProductRef {
                        id: p.id.to_string(),
                        name: p.name,
                        image: p.image,
                    },
                    None => ProductRef {
                        id: item.product_id.to_string(),
                        name: String::new(),
                        image: String::new(),
                    },
                },
                size: item.size,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        Self {
            id: order.id.to_string(),
            order_number: order.order_number,
            customer_name: order.customer_name,
            email: order.email,
            phone: order.phone,
            address: order.address,
            city: order.city,
            postal_code: order.postal_code,
            // Stored statuses are constrained to the known set by a CHECK
            // on orders.status, so this fallback cannot trigger.
            status: OrderStatus::from_str(&order.status).unwrap_or(OrderStatus::Pending),
            total: order.total,
            shipping: order.shipping,
            items,
            created_at: order.created_at.with_timezone(&Utc),
            updated_at: order.updated_at.with_timezone(&Utc),
        }
    }
}

/// Split a stored comma-separated list into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join array input back into the stored comma-separated form.
pub fn join_list(values: &[String]) -> String {
    values.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empties() {
        assert_eq!(split_list("50ml, 100ml ,,150ml"), vec!["50ml", "100ml", "150ml"]);
        assert_eq!(split_list(""), Vec::<String>::new());
    }

    #[test]
    fn order_status_round_trips() {
        for s in ["pending", "processing", "shipped", "delivered", "cancelled"] {
            assert_eq!(OrderStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(OrderStatus::from_str("paid").is_err());
    }
}
