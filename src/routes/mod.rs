use axum::Router;

use crate::state::AppState;

pub mod articles;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod stores;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/stores", stores::router())
        .nest("/products", products::router())
        .nest("/product-categories", categories::router())
        .nest("/articles", articles::router())
        .nest("/upload", articles::upload_router())
}
