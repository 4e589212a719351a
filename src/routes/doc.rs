use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartItem,
    dto::{
        admin::{CustomerList, CustomerSummary, UpdateOrderStatusRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest, SessionUser},
        cart::{CartQuote, QuoteLine, QuoteRequest},
        favorites::{FavoriteProductList, FavoriteRequest, FavoriteStatus},
        orders::{CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductPage, UpdateProductRequest},
        users::UpdateProfileRequest,
    },
    error::FieldError,
    models::{Dimensions, Order, OrderItem, OrderStatus, Product, Role, ShippingAddress, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, products, users},
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
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::logout,
        auth::session,
        cart::quote,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::create_order,
        orders::list_my_orders,
        orders::get_order,
        users::get_me,
        users::update_me,
        users::list_favorites,
        users::check_favorite,
        users::add_favorite,
        users::remove_favorite,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_customers
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            Dimensions,
            Order,
            OrderStatus,
            OrderItem,
            ShippingAddress,
            CartItem,
            FieldError,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SessionUser,
            QuoteRequest,
            QuoteLine,
            CartQuote,
            CreateProductRequest,
            UpdateProductRequest,
            ProductPage,
            CreateOrderRequest,
            OrderItemInput,
            OrderList,
            OrderWithItems,
            FavoriteRequest,
            FavoriteStatus,
            FavoriteProductList,
            UpdateProfileRequest,
            UpdateOrderStatusRequest,
            CustomerSummary,
            CustomerList,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductPage>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartQuote>,
            ApiResponse<CustomerList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Products", description = "Catalog browsing and admin product management"),
        (name = "Cart", description = "Cart reconciliation against the catalog"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Users", description = "Profile of the signed-in user"),
        (name = "Favorites", description = "Per-user favorite products"),
        (name = "Auth", description = "Registration and sessions"),
        (name = "Admin", description = "Order fulfilment and customers"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
