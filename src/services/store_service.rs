use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::json;

use crate::{
    audit,
    dto::stores::{CreateStoreRequest, StoreList, UpdateStoreForm},
    entity::stores::{self, Column, Entity as Stores},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner, ensure_seller},
    models::Store,
    pagination::{DEFAULT_LIMIT, Pagination},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    state::AppState,
    storage::{
        FileStorage, MAX_IMAGE_BYTES, STORE_AVATAR_DIR, STORE_BANNER_DIR, UploadFile,
        discard_files,
    },
};

pub const MAX_PAGE_LIMIT: i64 = 100;

pub async fn list_stores(state: &AppState) -> AppResult<ApiResponse<StoreList>> {
    let items = Stores::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Store::from)
        .collect();
    Ok(ApiResponse::success("Stores", StoreList { items }, Some(Meta::empty())))
}

pub async fn list_stores_paginated(
    state: &AppState,
    query: PageQuery,
) -> AppResult<ApiResponse<StoreList>> {
    let (page, limit) = query.resolve(DEFAULT_LIMIT, MAX_PAGE_LIMIT);
    let mut finder = Stores::find().order_by_desc(Column::CreatedAt);
    if let Some(pattern) = query.search_pattern() {
        finder = finder.filter(Expr::col(Column::Name).ilike(pattern));
    }

    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::new(page, limit, total);
    let items = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Store::from)
        .collect();

    Ok(ApiResponse::paginated("Stores", StoreList { items }, pagination))
}

pub async fn get_store_by_user(state: &AppState, user_id: i64) -> AppResult<ApiResponse<Store>> {
    let store = Stores::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Store", Store::from(store), Some(Meta::empty())))
}

pub async fn get_store(state: &AppState, id: i64) -> AppResult<ApiResponse<Store>> {
    let store = Stores::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Store", Store::from(store), Some(Meta::empty())))
}

pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_seller(user)?;
    payload.validate()?;
    let name = payload.name.trim().to_string();

    let taken = Stores::find()
        .filter(Column::Name.eq(name.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("store name {name} is already taken")));
    }

    let store = stores::ActiveModel {
        id: NotSet,
        name: Set(name),
        description: Set(payload.description.trim().to_string()),
        whatsapp: Set(payload.whatsapp.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        user_id: Set(user.user_id),
        avatar: Set(String::new()),
        banner: Set(String::new()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        user.user_id,
        "store_create",
        "stores",
        json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success("Store created", Store::from(store), Some(Meta::empty())))
}

/// Validates and stores a replacement image, returning the new path.
async fn replace_image<S: FileStorage + ?Sized>(
    storage: &S,
    file: Option<&UploadFile>,
    directory: &str,
) -> AppResult<Option<String>> {
    let Some(file) = file else {
        return Ok(None);
    };
    storage.validate(file, MAX_IMAGE_BYTES)?;
    Ok(Some(storage.store(file, directory).await?))
}

/// Updates text fields and optionally avatar and banner. Old images are
/// removed only after the row is saved.
pub async fn update_store(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    form: UpdateStoreForm,
) -> AppResult<ApiResponse<Store>> {
    let existing = Stores::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, existing.user_id)?;

    let storage = state.storage.as_ref();
    let avatar = replace_image(storage, form.avatar.as_ref(), STORE_AVATAR_DIR).await?;
    let banner = match replace_image(storage, form.banner.as_ref(), STORE_BANNER_DIR).await {
        Ok(banner) => banner,
        Err(err) => {
            discard_files(storage, avatar.as_slice()).await;
            return Err(err);
        }
    };

    let old_avatar = existing.avatar.clone();
    let old_banner = existing.banner.clone();
    let mut active: stores::ActiveModel = existing.into();
    if let Some(name) = form.name {
        active.name = Set(name);
    }
    if let Some(description) = form.description {
        active.description = Set(description);
    }
    if let Some(whatsapp) = form.whatsapp {
        active.whatsapp = Set(whatsapp);
    }
    if let Some(address) = form.address {
        active.address = Set(address);
    }
    if let Some(path) = &avatar {
        active.avatar = Set(path.clone());
    }
    if let Some(path) = &banner {
        active.banner = Set(path.clone());
    }
    active.updated_at = Set(chrono::Utc::now().fixed_offset());

    let store = match active.update(&state.orm).await {
        Ok(store) => store,
        Err(err) => {
            let fresh: Vec<String> = avatar.into_iter().chain(banner).collect();
            discard_files(storage, &fresh).await;
            return Err(err.into());
        }
    };

    let mut stale = Vec::new();
    if avatar.is_some() && !old_avatar.is_empty() {
        stale.push(old_avatar);
    }
    if banner.is_some() && !old_banner.is_empty() {
        stale.push(old_banner);
    }
    discard_files(storage, &stale).await;

    audit::record(
        state,
        user.user_id,
        "store_update",
        "stores",
        json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success("Store updated", Store::from(store), Some(Meta::empty())))
}
