pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Store Catalog API",
        version = "1.0.0",
        description = "Product catalog backend with categories, image uploads and JWT authentication"
    ),
    paths(
        handlers::auth::register_user,
        handlers::auth::register_manager,
        handlers::auth::register_admin,
        handlers::auth::login,
        handlers::auth::me,
        handlers::category::list_categories,
        handlers::category::get_category,
        handlers::category::create_category,
        handlers::category::update_category,
        handlers::category::delete_category,
        handlers::product::list_products,
        handlers::product::get_product,
        handlers::product::create_product,
        handlers::product::update_product,
        handlers::product::delete_product,
    ),
    tags(
        (name = "Authentication", description = "Registration, login and token inspection"),
        (name = "Categories", description = "Category CRUD operations"),
        (name = "Products", description = "Product CRUD with image uploads"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if server.cors.allow_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(origins)
}
