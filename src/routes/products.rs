use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    dto::{
        form::MultipartForm,
        products::{AddProductImageForm, CreateProductForm, PublicProductList, UpdateProductForm},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Product, ProductDetail, ProductImage},
    response::ApiResponse,
    routes::params::PageQuery,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/latest", get(latest_products))
        .route("/category/{slug}", get(list_products_by_category))
        .route(
            "/{slug}",
            get(get_public_product)
                .put(update_product)
                .delete(delete_product),
        )
        .route("/{slug}/detail", get(get_product))
        .route("/{slug}/images", post(add_product_image))
        .route("/{slug}/images/{image_id}", delete(delete_product_image))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(PageQuery),
    responses(
        (status = 200, description = "Public product listing, page order shuffled", body = ApiResponse<PublicProductList>)
    ),
    security(()),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<PublicProductList>>> {
    let resp = product_service::list_public_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/latest",
    responses(
        (status = 200, description = "Newest products", body = ApiResponse<PublicProductList>)
    ),
    security(()),
    tag = "Products"
)]
pub async fn latest_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PublicProductList>>> {
    let resp = product_service::latest_products(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/category/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Products in a category", body = ApiResponse<PublicProductList>),
        (status = 404, description = "Category not found")
    ),
    security(()),
    tag = "Products"
)]
pub async fn list_products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<PublicProductList>>> {
    let resp = product_service::list_products_by_category(&state, &slug, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Public product detail", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    security(()),
    tag = "Products"
)]
pub async fn get_public_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_public_product(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}/detail",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product with images", body = ApiResponse<Product>),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, &user, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid form or first image rejected"),
        (status = 403, description = "Not the store owner")
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let form = CreateProductForm::try_from(MultipartForm::read(multipart).await?)?;
    let resp = product_service::create_product(&state, &user, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    request_body(content = UpdateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, description = "Invalid form or image path"),
        (status = 403, description = "Not the store owner"),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = UpdateProductForm::try_from(MultipartForm::read(multipart).await?)?;
    let resp = product_service::update_product(&state, &user, &slug, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 403, description = "Not the store owner"),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{slug}/images",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    request_body(content = AddProductImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image added", body = ApiResponse<ProductImage>),
        (status = 400, description = "Image rejected"),
        (status = 403, description = "Not the store owner")
    ),
    tag = "Products"
)]
pub async fn add_product_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductImage>>)> {
    let form = AddProductImageForm::try_from(MultipartForm::read(multipart).await?)?;
    let resp = product_service::add_product_image(&state, &user, &slug, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{slug}/images/{image_id}",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ("image_id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 400, description = "Image is the only thumbnail"),
        (status = 403, description = "Not the store owner"),
        (status = 404, description = "Image not found on this product")
    ),
    tag = "Products"
)]
pub async fn delete_product_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((slug, image_id)): Path<(String, i64)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product_image(&state, &user, &slug, image_id).await?;
    Ok(Json(resp))
}
