use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    dto::products::CategoryList,
    entity::product_categories::{Column, Entity as ProductCategories},
    error::AppResult,
    models::ProductCategory,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = ProductCategories::find()
        .order_by_asc(Column::CategoryName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductCategory::from)
        .collect();
    Ok(ApiResponse::success("Product categories", CategoryList { items }, Some(Meta::empty())))
}
