use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/authenticate", auth_routes())
        .nest("/category", category_routes())
        .nest("/product", product_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register-user", post(handlers::auth::register_user))
        .route("/register-manager", post(handlers::auth::register_manager))
        .route("/register-admin", post(handlers::auth::register_admin))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route(
            "/{id}",
            get(handlers::category::get_category)
                .put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/{id}",
            get(handlers::product::get_product)
                .put(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
}
