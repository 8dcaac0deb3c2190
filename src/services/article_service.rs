use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde_json::json;

use crate::{
    audit,
    dto::articles::{ArticleList, ArticleRequest, EXCERPT_MAX_CHARS, UploadImageForm, UploadImageResponse},
    entity::articles::{self, Column, Entity as Articles},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Article,
    pagination::{DEFAULT_LIMIT, Pagination},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    slug::{ensure_unique_slug, ensure_unique_slug_except, generate_excerpt, generate_slug},
    state::AppState,
    storage::{ARTICLE_IMAGE_DIR, FileStorage, MAX_IMAGE_BYTES},
};

pub const MAX_PAGE_LIMIT: i64 = 100;
pub const LATEST_ARTICLES: u64 = 5;

const SLUG_PREFIX: &str = "article";

async fn slug_exists(state: &AppState, slug: String) -> AppResult<bool> {
    let count = Articles::find()
        .filter(Column::Slug.eq(slug))
        .count(&state.orm)
        .await?;
    Ok(count > 0)
}

fn search(query: &PageQuery) -> Select<Articles> {
    let mut finder = Articles::find();
    if let Some(pattern) = query.search_pattern() {
        finder = finder.filter(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Excerpt).ilike(pattern)),
        );
    }
    finder.order_by_desc(Column::CreatedAt)
}

/// Paginated listing, optionally filtered by title, description or excerpt.
pub async fn list_articles(
    state: &AppState,
    query: PageQuery,
) -> AppResult<ApiResponse<ArticleList>> {
    let (page, limit) = query.resolve(DEFAULT_LIMIT, MAX_PAGE_LIMIT);
    let finder = search(&query);

    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::new(page, limit, total);
    let items = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Article::from)
        .collect();

    Ok(ApiResponse::paginated("Articles", ArticleList { items }, pagination))
}

pub async fn search_articles(
    state: &AppState,
    query: PageQuery,
) -> AppResult<ApiResponse<ArticleList>> {
    if query.search_pattern().is_none() {
        return Err(AppError::validation("search query q is required"));
    }
    list_articles(state, query).await
}

pub async fn latest_articles(state: &AppState) -> AppResult<ApiResponse<ArticleList>> {
    let items = Articles::find()
        .order_by_desc(Column::CreatedAt)
        .limit(LATEST_ARTICLES)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Article::from)
        .collect();
    Ok(ApiResponse::success("Latest articles", ArticleList { items }, Some(Meta::empty())))
}

pub async fn get_article(state: &AppState, id: i64) -> AppResult<ApiResponse<Article>> {
    let article = Articles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Article", Article::from(article), Some(Meta::empty())))
}

pub async fn get_article_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Article>> {
    let article = Articles::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Article", Article::from(article), Some(Meta::empty())))
}

fn excerpt_for(payload: &ArticleRequest) -> String {
    match payload.excerpt.as_deref().map(str::trim) {
        Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
        _ => generate_excerpt(payload.description.trim(), EXCERPT_MAX_CHARS),
    }
}

pub async fn create_article(
    state: &AppState,
    user: &AuthUser,
    payload: ArticleRequest,
) -> AppResult<ApiResponse<Article>> {
    payload.validate()?;
    let title = payload.title.trim().to_string();
    let base = generate_slug(&title, SLUG_PREFIX);
    let slug = ensure_unique_slug(&base, |candidate| slug_exists(state, candidate)).await?;

    let article = articles::ActiveModel {
        id: NotSet,
        excerpt: Set(excerpt_for(&payload)),
        title: Set(title),
        slug: Set(slug),
        description: Set(payload.description.trim().to_string()),
        image_url: Set(payload.image_url.unwrap_or_default()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        user.user_id,
        "article_create",
        "articles",
        json!({ "article_id": article.id, "slug": article.slug }),
    )
    .await;

    Ok(ApiResponse::success("Article created", Article::from(article), Some(Meta::empty())))
}

/// The slug is regenerated only when the title changes.
pub async fn update_article(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: ArticleRequest,
) -> AppResult<ApiResponse<Article>> {
    payload.validate()?;
    let existing = Articles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let title = payload.title.trim().to_string();
    let slug = if title != existing.title {
        let base = generate_slug(&title, SLUG_PREFIX);
        ensure_unique_slug_except(&base, &existing.slug, |candidate| slug_exists(state, candidate))
            .await?
    } else {
        existing.slug.clone()
    };
    let excerpt = excerpt_for(&payload);
    let image_url = payload.image_url.unwrap_or_else(|| existing.image_url.clone());

    let mut active: articles::ActiveModel = existing.into();
    active.title = Set(title);
    active.slug = Set(slug);
    active.description = Set(payload.description.trim().to_string());
    active.excerpt = Set(excerpt);
    active.image_url = Set(image_url);
    active.updated_at = Set(Utc::now().fixed_offset());
    let article = active.update(&state.orm).await?;

    audit::record(
        state,
        user.user_id,
        "article_update",
        "articles",
        json!({ "article_id": article.id }),
    )
    .await;

    Ok(ApiResponse::success("Article updated", Article::from(article), Some(Meta::empty())))
}

pub async fn delete_article(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Articles::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        user.user_id,
        "article_delete",
        "articles",
        json!({ "article_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Article deleted", json!({ "id": id }), Some(Meta::empty())))
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    form: UploadImageForm,
) -> AppResult<ApiResponse<UploadImageResponse>> {
    let storage = state.storage.as_ref();
    storage.validate(&form.image, MAX_IMAGE_BYTES)?;
    let image_url = storage.store(&form.image, ARTICLE_IMAGE_DIR).await?;
    let filename = image_url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    tracing::debug!(user_id = user.user_id, path = %image_url, "article image uploaded");

    let resp = UploadImageResponse {
        filename,
        size: form.image.size(),
        image_url,
        uploaded_at: Utc::now(),
    };
    Ok(ApiResponse::success("Image uploaded", resp, Some(Meta::empty())))
}
