use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        analytics::{
            Comparison, DashboardStats, PreviousPeriod, ReportPeriod, SalesBucket, SalesReport,
            SalesReportQuery, TopProduct,
        },
        auth::{AdminInfo, LoginRequest, LoginResponse},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            CreateOrderItem, CreateOrderRequest, OrderList, OrderListQuery,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, ProductQuery, UpdateProductRequest},
    },
    models::{CategoryView, OrderItemView, OrderStatus, OrderView, ProductRef, ProductView},
    response::{ApiResponse, Meta},
    routes::{analytics, auth, categories, health, orders, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::delete_order,
        analytics::dashboard,
        analytics::sales_report,
    ),
    components(
        schemas(
            OrderStatus,
            ProductView,
            CategoryView,
            ProductRef,
            OrderItemView,
            OrderView,
            LoginRequest,
            LoginResponse,
            AdminInfo,
            CreateProductRequest,
            UpdateProductRequest,
            ProductQuery,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateOrderItem,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderListQuery,
            OrderList,
            ReportPeriod,
            SalesReportQuery,
            DashboardStats,
            SalesBucket,
            TopProduct,
            PreviousPeriod,
            Comparison,
            SalesReport,
            Meta,
            ApiResponse<ProductView>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<OrderView>,
            ApiResponse<OrderList>,
            ApiResponse<LoginResponse>,
            ApiResponse<DashboardStats>,
            ApiResponse<SalesReport>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Admin authentication"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Orders", description = "Checkout and order management"),
        (name = "Analytics", description = "Dashboard counters and sales reports"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
