//! Point-in-time dashboard counters and period-comparative sales reports.
//! Everything is computed on demand by scanning order records; there are no
//! materialized rollups. The report math is pure and lives below the service
//! entry points so it can be tested without a database.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::analytics::{
        Comparison, DashboardStats, PreviousPeriod, ReportPeriod, SalesBucket, SalesReport,
        TopProduct,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::AppResult,
    models::OrderStatus,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOP_PRODUCTS_CAP: usize = 10;

#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub product_id: String,
    pub name: String,
    /// Line subtotal frozen at purchase time.
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub total: i64,
    pub items: Vec<ItemRecord>,
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Current and immediately preceding windows of equal semantic length.
pub fn period_windows(period: ReportPeriod, today: NaiveDate) -> (Window, Window) {
    match period {
        ReportPeriod::Weekly => {
            let start = today - Duration::days(7);
            let prev_end = start - Duration::days(1);
            let prev_start = prev_end - Duration::days(7);
            (
                Window { start, end: today },
                Window {
                    start: prev_start,
                    end: prev_end,
                },
            )
        }
        ReportPeriod::Monthly => {
            let start = first_of_month(today);
            let prev_end = start - Duration::days(1);
            (
                Window { start, end: today },
                Window {
                    start: first_of_month(prev_end),
                    end: prev_end,
                },
            )
        }
        ReportPeriod::Yearly => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let prev_start = NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap_or(today);
            let prev_end = NaiveDate::from_ymd_opt(today.year() - 1, 12, 31).unwrap_or(today);
            (
                Window { start, end: today },
                Window {
                    start: prev_start,
                    end: prev_end,
                },
            )
        }
    }
}

fn bucket_key(date: NaiveDate, period: ReportPeriod) -> String {
    match period {
        ReportPeriod::Yearly => format!("{:04}-{:02}", date.year(), date.month()),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

/// Bucket series over the whole window, zero-filled: daily buckets for
/// weekly/monthly, monthly buckets for yearly.
pub fn sales_series(orders: &[OrderRecord], window: &Window, period: ReportPeriod) -> Vec<SalesBucket> {
    let mut acc: HashMap<String, (i64, i64)> = HashMap::new();
    for order in orders.iter().filter(|o| window.contains(o.date)) {
        let entry = acc.entry(bucket_key(order.date, period)).or_insert((0, 0));
        entry.0 += order.total;
        entry.1 += 1;
    }

    let mut series = Vec::new();
    match period {
        ReportPeriod::Yearly => {
            let mut cursor = first_of_month(window.start);
            while cursor <= window.end {
                let key = bucket_key(cursor, period);
                let (sales, orders) = acc.get(&key).copied().unwrap_or((0, 0));
                series.push(SalesBucket {
                    date: key,
                    sales,
                    orders,
                });
                cursor = next_month(cursor);
            }
        }
        _ => {
            let mut cursor = window.start;
            while cursor <= window.end {
                let key = bucket_key(cursor, period);
                let (sales, orders) = acc.get(&key).copied().unwrap_or((0, 0));
                series.push(SalesBucket {
                    date: key,
                    sales,
                    orders,
                });
                match cursor.succ_opt() {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }
    }
    series
}

/// (total sales, order count, average order value) within a window.
pub fn summarize(orders: &[OrderRecord], window: &Window) -> (i64, i64, f64) {
    let mut sales: i64 = 0;
    let mut count: i64 = 0;
    for order in orders.iter().filter(|o| window.contains(o.date)) {
        sales += order.total;
        count += 1;
    }
    let avg = if count > 0 {
        sales as f64 / count as f64
    } else {
        0.0
    };
    (sales, count, avg)
}

/// Percent change, floored to 0 when the previous value is 0. A deliberate
/// floor, not a true percentage.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Top products by revenue inside the window, ties broken by first
/// encounter, capped at ten entries.
pub fn top_products(orders: &[OrderRecord], window: &Window) -> Vec<TopProduct> {
    let mut ranked: Vec<TopProduct> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for order in orders.iter().filter(|o| window.contains(o.date)) {
        for item in &order.items {
            match index.get(&item.product_id) {
                Some(&i) => {
                    ranked[i].sales += item.price;
                    ranked[i].quantity += item.quantity as i64;
                }
                None => {
                    index.insert(item.product_id.clone(), ranked.len());
                    ranked.push(TopProduct {
                        product_id: item.product_id.clone(),
                        name: item.name.clone(),
                        sales: item.price,
                        quantity: item.quantity as i64,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-encounter order among equal revenues.
    ranked.sort_by(|a, b| b.sales.cmp(&a.sales));
    ranked.truncate(TOP_PRODUCTS_CAP);
    ranked
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn build_report(
    period: ReportPeriod,
    today: NaiveDate,
    records: &[OrderRecord],
) -> SalesReport {
    let (current, previous) = period_windows(period, today);

    let (cur_sales, cur_orders, cur_avg) = summarize(records, &current);
    let (prev_sales, prev_orders, prev_avg) = summarize(records, &previous);

    SalesReport {
        period,
        start_date: iso(current.start),
        end_date: iso(current.end),
        total_sales: cur_sales,
        total_orders: cur_orders,
        average_order_value: cur_avg,
        top_products: top_products(records, &current),
        sales_by_date: sales_series(records, &current, period),
        comparison: Comparison {
            previous_period: PreviousPeriod {
                start_date: iso(previous.start),
                end_date: iso(previous.end),
                total_sales: prev_sales,
                total_orders: prev_orders,
                average_order_value: prev_avg,
                sales_by_date: sales_series(records, &previous, period),
            },
            sales_change: percent_change(cur_sales as f64, prev_sales as f64),
            orders_change: percent_change(cur_orders as f64, prev_orders as f64),
            avg_order_value_change: percent_change(cur_avg, prev_avg),
        },
    }
}

pub async fn dashboard(state: &AppState) -> AppResult<ApiResponse<DashboardStats>> {
    let total_products = Products::find().count(&state.orm).await? as i64;
    let total_orders = Orders::find().count(&state.orm).await? as i64;

    let orders = Orders::find().all(&state.orm).await?;
    let total_revenue = orders.iter().map(|o| o.total).sum();

    let pending_orders = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_products,
            total_orders,
            total_revenue,
            pending_orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn sales_report(
    state: &AppState,
    period: ReportPeriod,
) -> AppResult<ApiResponse<SalesReport>> {
    let records = load_records(state).await?;
    let report = build_report(period, Utc::now().date_naive(), &records);
    Ok(ApiResponse::success("Sales report", report, Some(Meta::empty())))
}

/// Full scan over orders, items and product names; dataset sizes keep this
/// acceptable, there is no pagination on analytics reads.
async fn load_records(state: &AppState) -> AppResult<Vec<OrderRecord>> {
    let orders = Orders::find().all(&state.orm).await?;
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(&state.orm)
        .await?;

    let names: HashMap<Uuid, String> = Products::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<ItemRecord>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(ItemRecord {
            product_id: item.product_id.to_string(),
            name: names.get(&item.product_id).cloned().unwrap_or_default(),
            price: item.price,
            quantity: item.quantity,
        });
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderRecord {
            date: order.created_at.with_timezone(&Utc).date_naive(),
            total: order.total,
            items: grouped.remove(&order.id).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn order(date: NaiveDate, total: i64) -> OrderRecord {
        OrderRecord {
            date,
            total,
            items: Vec::new(),
        }
    }

    fn order_with_items(date: NaiveDate, total: i64, items: Vec<ItemRecord>) -> OrderRecord {
        OrderRecord { date, total, items }
    }

    fn item(product_id: &str, name: &str, price: i64, quantity: i32) -> ItemRecord {
        ItemRecord {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    #[test]
    fn monthly_windows_on_the_first_of_a_month() {
        let (current, previous) = period_windows(ReportPeriod::Monthly, d(2026, 3, 1));
        assert_eq!(current, Window { start: d(2026, 3, 1), end: d(2026, 3, 1) });
        assert_eq!(previous, Window { start: d(2026, 2, 1), end: d(2026, 2, 28) });
    }

    #[test]
    fn weekly_windows_are_adjacent() {
        let (current, previous) = period_windows(ReportPeriod::Weekly, d(2026, 8, 23));
        assert_eq!(current, Window { start: d(2026, 8, 16), end: d(2026, 8, 23) });
        assert_eq!(previous, Window { start: d(2026, 8, 8), end: d(2026, 8, 15) });
    }

    #[test]
    fn yearly_previous_window_is_the_entire_prior_year() {
        let (current, previous) = period_windows(ReportPeriod::Yearly, d(2026, 8, 23));
        assert_eq!(current.start, d(2026, 1, 1));
        assert_eq!(current.end, d(2026, 8, 23));
        assert_eq!(previous, Window { start: d(2025, 1, 1), end: d(2025, 12, 31) });
    }

    #[test]
    fn percent_change_floors_to_zero_without_a_previous_value() {
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(100.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
    }

    #[test]
    fn series_zero_fills_every_bucket() {
        let window = Window { start: d(2026, 8, 16), end: d(2026, 8, 23) };
        let records = vec![order(d(2026, 8, 17), 500), order(d(2026, 8, 17), 700)];
        let series = sales_series(&records, &window, ReportPeriod::Weekly);

        assert_eq!(series.len(), 8);
        assert_eq!(series[0], SalesBucket { date: "2026-08-16".into(), sales: 0, orders: 0 });
        assert_eq!(series[1], SalesBucket { date: "2026-08-17".into(), sales: 1200, orders: 2 });
        assert!(series[2..].iter().all(|b| b.sales == 0 && b.orders == 0));
    }

    #[test]
    fn yearly_series_buckets_by_month() {
        let window = Window { start: d(2025, 1, 1), end: d(2025, 12, 31) };
        let records = vec![order(d(2025, 3, 14), 900)];
        let series = sales_series(&records, &window, ReportPeriod::Yearly);

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].date, "2025-01");
        assert_eq!(series[2], SalesBucket { date: "2025-03".into(), sales: 900, orders: 1 });
        assert_eq!(series[11].date, "2025-12");
    }

    #[test]
    fn top_products_rank_by_revenue_with_stable_ties() {
        let window = Window { start: d(2026, 8, 1), end: d(2026, 8, 31) };
        let records = vec![
            order_with_items(
                d(2026, 8, 2),
                0,
                vec![item("p1", "First", 500, 1), item("p2", "Second", 500, 2)],
            ),
            order_with_items(d(2026, 8, 3), 0, vec![item("p3", "Third", 900, 1)]),
            order_with_items(d(2026, 8, 4), 0, vec![item("p1", "First", 100, 1)]),
        ];

        let top = top_products(&records, &window);
        assert_eq!(top[0].product_id, "p3");
        // p1 (600) beats p2 (500); equal revenues keep first-encounter order.
        assert_eq!(top[1].product_id, "p1");
        assert_eq!(top[1].sales, 600);
        assert_eq!(top[1].quantity, 2);
        assert_eq!(top[2].product_id, "p2");
    }

    #[test]
    fn top_products_cap_at_ten() {
        let window = Window { start: d(2026, 8, 1), end: d(2026, 8, 31) };
        let items = (0..15)
            .map(|i| item(&format!("p{i}"), "x", 100 + i, 1))
            .collect();
        let records = vec![order_with_items(d(2026, 8, 2), 0, items)];
        assert_eq!(top_products(&records, &window).len(), 10);
    }

    #[test]
    fn report_compares_current_against_previous_window() {
        // Monthly report on the 1st: current window is exactly one day.
        let today = d(2026, 3, 1);
        let records = vec![
            order(d(2026, 3, 1), 4200),
            order(d(2026, 2, 10), 1000),
            order(d(2026, 2, 20), 1000),
            // outside both windows
            order(d(2026, 1, 15), 9999),
        ];

        let report = build_report(ReportPeriod::Monthly, today, &records);
        assert_eq!(report.start_date, "2026-03-01");
        assert_eq!(report.end_date, "2026-03-01");
        assert_eq!(report.total_sales, 4200);
        assert_eq!(report.total_orders, 1);
        assert_eq!(report.sales_by_date.len(), 1);

        let prev = &report.comparison.previous_period;
        assert_eq!(prev.start_date, "2026-02-01");
        assert_eq!(prev.end_date, "2026-02-28");
        assert_eq!(prev.total_sales, 2000);
        assert_eq!(prev.total_orders, 2);
        assert_eq!(prev.sales_by_date.len(), 28);

        assert_eq!(report.comparison.sales_change, 110.0);
        assert_eq!(report.comparison.orders_change, -50.0);
    }

    #[test]
    fn report_with_empty_previous_window_floors_changes_to_zero() {
        let report = build_report(
            ReportPeriod::Monthly,
            d(2026, 3, 15),
            &[order(d(2026, 3, 10), 5000)],
        );
        assert_eq!(report.comparison.sales_change, 0.0);
        assert_eq!(report.comparison.orders_change, 0.0);
        assert_eq!(report.comparison.avg_order_value_change, 0.0);
    }
}
