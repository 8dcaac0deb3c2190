use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        articles::{ArticleList, ArticleRequest, UploadImageForm, UploadImageResponse},
        form::MultipartForm,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Article,
    response::ApiResponse,
    routes::params::{ArticleSearchQuery, PageQuery},
    services::article_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route("/latest", get(latest_articles))
        .route("/search", get(search_articles))
        .route("/slug/{slug}", get(get_article_by_slug))
        .route(
            "/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
}

pub fn upload_router() -> Router<AppState> {
    Router::new().route("/", post(upload_image))
}

#[utoipa::path(
    get,
    path = "/api/articles",
    params(PageQuery),
    responses(
        (status = 200, description = "List articles", body = ApiResponse<ArticleList>)
    ),
    security(()),
    tag = "Articles"
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ArticleList>>> {
    let resp = article_service::list_articles(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/articles/latest",
    responses(
        (status = 200, description = "Newest articles", body = ApiResponse<ArticleList>)
    ),
    security(()),
    tag = "Articles"
)]
pub async fn latest_articles(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ArticleList>>> {
    let resp = article_service::latest_articles(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/articles/search",
    params(ArticleSearchQuery),
    responses(
        (status = 200, description = "Articles matching q", body = ApiResponse<ArticleList>),
        (status = 400, description = "Missing q")
    ),
    security(()),
    tag = "Articles"
)]
pub async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleSearchQuery>,
) -> AppResult<Json<ApiResponse<ArticleList>>> {
    let resp = article_service::search_articles(&state, query.into()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Article", body = ApiResponse<Article>),
        (status = 404, description = "Article not found")
    ),
    security(()),
    tag = "Articles"
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Article>>> {
    let resp = article_service::get_article(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/articles/slug/{slug}",
    params(
        ("slug" = String, Path, description = "Article slug")
    ),
    responses(
        (status = 200, description = "Article", body = ApiResponse<Article>),
        (status = 404, description = "Article not found")
    ),
    security(()),
    tag = "Articles"
)]
pub async fn get_article_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Article>>> {
    let resp = article_service::get_article_by_slug(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = ArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ApiResponse<Article>),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Articles"
)]
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Article>>)> {
    let resp = article_service::create_article(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ApiResponse<Article>),
        (status = 404, description = "Article not found")
    ),
    tag = "Articles"
)]
pub async fn update_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<Json<ApiResponse<Article>>> {
    let resp = article_service::update_article(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 404, description = "Article not found")
    ),
    tag = "Articles"
)]
pub async fn delete_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = article_service::delete_article(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = ApiResponse<UploadImageResponse>),
        (status = 400, description = "Missing or rejected image")
    ),
    tag = "Articles"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<UploadImageResponse>>)> {
    let form = UploadImageForm::try_from(MultipartForm::read(multipart).await?)?;
    let resp = article_service::upload_image(&state, &user, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
