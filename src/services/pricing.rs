//! Order pricing: turns cart lines and a live catalog snapshot into priced
//! line items and an order total. Pure computation; persistence belongs to
//! the order service.

use sea_orm::ConnectionTrait;

use crate::{
    config::AppConfig,
    dto::orders::CreateOrderItem,
    entity::products,
    error::{AppError, AppResult},
    resolver,
};

#[derive(Debug, Clone, Copy)]
pub struct ShippingPolicy {
    pub free_threshold: i64,
    pub flat_fee: i64,
}

impl ShippingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            free_threshold: config.free_shipping_threshold,
            flat_fee: config.shipping_fee,
        }
    }
}

#[derive(Debug)]
pub struct PricedLine {
    pub product: products::Model,
    pub size: i32,
    pub quantity: i32,
    /// Unit price x quantity, frozen at pricing time.
    pub subtotal: i64,
}

#[derive(Debug)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
}

pub fn shipping_for(subtotal: i64, policy: &ShippingPolicy) -> i64 {
    if subtotal >= policy.free_threshold {
        0
    } else {
        policy.flat_fee
    }
}

/// Reject malformed carts before anything touches persistence.
pub fn validate_lines(lines: &[CreateOrderItem]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Order item is missing a product reference".into(),
            ));
        }
        if line.quantity < 1 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Price resolved lines. Size is recorded but never affects price.
pub fn price_lines(
    resolved: Vec<(products::Model, &CreateOrderItem)>,
    policy: &ShippingPolicy,
) -> PricedCart {
    let mut lines = Vec::with_capacity(resolved.len());
    let mut subtotal: i64 = 0;
    for (product, line) in resolved {
        let line_subtotal = product.price * line.quantity as i64;
        subtotal += line_subtotal;
        lines.push(PricedLine {
            product,
            size: line.size,
            quantity: line.quantity,
            subtotal: line_subtotal,
        });
    }
    let shipping = shipping_for(subtotal, policy);
    PricedCart {
        lines,
        subtotal,
        shipping,
        total: subtotal + shipping,
    }
}

/// Resolve every cart line and price the whole cart, or fail without side
/// effects naming the first identifier that does not resolve.
pub async fn price_cart<C: ConnectionTrait>(
    db: &C,
    lines: &[CreateOrderItem],
    policy: &ShippingPolicy,
) -> AppResult<PricedCart> {
    validate_lines(lines)?;

    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let product = resolver::resolve_required::<products::Entity, C>(db, &line.product_id).await?;
        resolved.push((product, line));
    }

    Ok(price_lines(resolved, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            free_threshold: 3999,
            flat_fee: 200,
        }
    }

    fn product(price: i64) -> products::Model {
        let now = Utc::now().into();
        products::Model {
            id: Uuid::new_v4(),
            slug: "amber-oud".into(),
            name: "Amber Oud".into(),
            description: "".into(),
            notes: None,
            price,
            sizes: "50,100".into(),
            default_size: 100,
            category: "colognes".into(),
            is_best_seller: false,
            is_new_arrival: false,
            image: "".into(),
            gallery: None,
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product_id: &str, size: i32, quantity: i32) -> CreateOrderItem {
        CreateOrderItem {
            product_id: product_id.into(),
            size,
            quantity,
        }
    }

    #[test]
    fn below_threshold_pays_flat_shipping() {
        let l = line("p1", 100, 2);
        let cart = price_lines(vec![(product(1999), &l)], &policy());
        assert_eq!(cart.subtotal, 3998);
        assert_eq!(cart.shipping, 200);
        assert_eq!(cart.total, 4198);
    }

    #[test]
    fn at_or_above_threshold_ships_free() {
        let l = line("p1", 100, 1);
        let cart = price_lines(vec![(product(4200), &l)], &policy());
        assert_eq!(cart.shipping, 0);
        assert_eq!(cart.total, 4200);

        let l = line("p1", 100, 1);
        let boundary = price_lines(vec![(product(3999), &l)], &policy());
        assert_eq!(boundary.shipping, 0);
    }

    #[test]
    fn line_subtotal_is_price_times_quantity() {
        let a = line("p1", 50, 3);
        let b = line("p2", 100, 1);
        let cart = price_lines(vec![(product(500), &a), (product(250), &b)], &policy());
        assert_eq!(cart.lines[0].subtotal, 1500);
        assert_eq!(cart.lines[1].subtotal, 250);
        assert_eq!(cart.subtotal, 1750);
        assert_eq!(cart.total, cart.subtotal + cart.shipping);
    }

    #[test]
    fn size_never_affects_price() {
        let small = line("p1", 50, 1);
        let large = line("p1", 150, 1);
        let a = price_lines(vec![(product(1000), &small)], &policy());
        let b = price_lines(vec![(product(1000), &large)], &policy());
        assert_eq!(a.subtotal, b.subtotal);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&[line("  ", 100, 1)]).is_err());
        assert!(validate_lines(&[line("p1", 100, 0)]).is_err());
        assert!(validate_lines(&[line("p1", 100, 1)]).is_ok());
    }
}
