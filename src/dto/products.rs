use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::ProductView;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub notes: Option<String>,
    pub price: i64,
    pub sizes: Vec<String>,
    pub default_size: i32,
    pub category: String,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub is_new_arrival: bool,
    pub image: String,
    pub gallery: Option<Vec<String>>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub price: Option<i64>,
    pub sizes: Option<Vec<String>>,
    pub default_size: Option<i32>,
    pub category: Option<String>,
    pub is_best_seller: Option<bool>,
    pub is_new_arrival: Option<bool>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub best_sellers: Option<bool>,
    pub new_arrivals: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductView>,
}
