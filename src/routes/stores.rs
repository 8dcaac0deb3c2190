use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        form::MultipartForm,
        products::{StoreCatalog, StoreProducts},
        stores::{CreateStoreRequest, StoreList, UpdateStoreForm},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Store,
    response::ApiResponse,
    routes::params::PageQuery,
    services::{product_service, store_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route("/data", get(list_stores_paginated))
        .route("/user/{user_id}", get(get_store_by_user))
        .route("/{id}", get(get_store).put(update_store))
        .route("/{id}/products", get(list_store_products))
        .route("/{id}/catalog", get(store_catalog))
}

#[utoipa::path(
    get,
    path = "/api/stores",
    responses(
        (status = 200, description = "All stores", body = ApiResponse<StoreList>)
    ),
    security(()),
    tag = "Stores"
)]
pub async fn list_stores(State(state): State<AppState>) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = store_service::list_stores(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/data",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated stores", body = ApiResponse<StoreList>),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "Stores"
)]
pub async fn list_stores_paginated(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = store_service::list_stores_paginated(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Owner user ID")
    ),
    responses(
        (status = 200, description = "Store of a user", body = ApiResponse<Store>),
        (status = 404, description = "User has no store")
    ),
    security(()),
    tag = "Stores"
)]
pub async fn get_store_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::get_store_by_user(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created", body = ApiResponse<Store>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Only sellers can open a store"),
        (status = 409, description = "Store name already taken")
    ),
    tag = "Stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStoreRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Store>>)> {
    let resp = store_service::create_store(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/stores/{id}",
    params(
        ("id" = i64, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Store", body = ApiResponse<Store>),
        (status = 404, description = "Store not found")
    ),
    tag = "Stores"
)]
pub async fn get_store(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::get_store(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/stores/{id}",
    params(
        ("id" = i64, Path, description = "Store ID")
    ),
    request_body(content = UpdateStoreForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Store updated", body = ApiResponse<Store>),
        (status = 403, description = "Not the store owner"),
        (status = 404, description = "Store not found")
    ),
    tag = "Stores"
)]
pub async fn update_store(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Store>>> {
    let form = UpdateStoreForm::try_from(MultipartForm::read(multipart).await?)?;
    let resp = store_service::update_store(&state, &user, id, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{id}/products",
    params(
        ("id" = i64, Path, description = "Store ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Products of an owned store", body = ApiResponse<StoreProducts>),
        (status = 403, description = "Not the store owner"),
        (status = 404, description = "Store not found")
    ),
    tag = "Stores"
)]
pub async fn list_store_products(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<StoreProducts>>> {
    let resp = product_service::list_store_products(&state, &user, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{id}/catalog",
    params(
        ("id" = i64, Path, description = "Store ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Public store catalog", body = ApiResponse<StoreCatalog>),
        (status = 404, description = "Store not found")
    ),
    security(()),
    tag = "Stores"
)]
pub async fn store_catalog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<StoreCatalog>>> {
    let resp = product_service::store_catalog(&state, id, query).await?;
    Ok(Json(resp))
}
