use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::products::CategoryList, error::AppResult, response::ApiResponse,
    services::category_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/product-categories",
    responses(
        (status = 200, description = "List product categories", body = ApiResponse<CategoryList>)
    ),
    security(()),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}
