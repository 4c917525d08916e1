use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SalesReportQuery {
    pub period: Option<ReportPeriod>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub pending_orders: i64,
}

/// One zero-filled bucket of the window series: a day for weekly/monthly
/// reports, a month for yearly ones.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesBucket {
    pub date: String,
    pub sales: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub sales: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviousPeriod {
    pub start_date: String,
    pub end_date: String,
    pub total_sales: i64,
    pub total_orders: i64,
    pub average_order_value: f64,
    pub sales_by_date: Vec<SalesBucket>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub previous_period: PreviousPeriod,
    pub sales_change: f64,
    pub orders_change: f64,
    pub avg_order_value_change: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub period: ReportPeriod,
    pub start_date: String,
    pub end_date: String,
    pub total_sales: i64,
    pub total_orders: i64,
    pub average_order_value: f64,
    pub top_products: Vec<TopProduct>,
    pub sales_by_date: Vec<SalesBucket>,
    pub comparison: Comparison,
}
