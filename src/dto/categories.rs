use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::CategoryView;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub key: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<CategoryView>,
}
