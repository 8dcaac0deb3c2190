use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

use crate::{
    audit,
    catalog::{CatalogStore, ImageReconciler, NewProductImage, ReconcileRequest, SeaOrmCatalog},
    dto::products::{
        AddProductImageForm, CreateProductForm, PublicProductList, StoreCatalog, StoreProducts,
        UpdateProductForm,
    },
    entity::{
        product_categories::{self, Entity as ProductCategories},
        product_images,
        products::{self, Column, Entity as Products},
        stores::{self, Entity as Stores},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner},
    models::{
        Product, ProductCard, ProductCategory, ProductDetail, ProductImage, PublicProductCard,
        PublicStore, Store,
    },
    pagination::Pagination,
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    slug::{ensure_unique_slug, ensure_unique_slug_except, generate_slug},
    state::AppState,
    storage::{FileStorage, MAX_IMAGE_BYTES, PRODUCT_IMAGE_DIR, discard_files},
};

pub const PUBLIC_PAGE_LIMIT: i64 = 40;
pub const STORE_PAGE_LIMIT: i64 = 12;
pub const STORE_PAGE_MAX: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const LATEST_PRODUCTS: u64 = 8;

const SLUG_PREFIX: &str = "product";

fn search_condition(query: &PageQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(pattern) = query.search_pattern() {
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    condition
}

/// Loads a product by slug together with its store and checks the caller
/// owns that store.
async fn find_owned_product(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
) -> AppResult<(products::Model, stores::Model)> {
    let product = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let store = Stores::find_by_id(product.store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, store.user_id)?;
    Ok((product, store))
}

async fn ensure_category_exists(state: &AppState, category_id: i64) -> AppResult<()> {
    ProductCategories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::validation(format!("category {category_id} does not exist")))
}

async fn load_images(state: &AppState, product_id: i64) -> AppResult<Vec<product_images::Model>> {
    SeaOrmCatalog::new(&state.orm)
        .find_images_by_product(product_id)
        .await
}

/// Attaches store and category names to a page of products.
async fn public_cards(
    state: &AppState,
    models: Vec<products::Model>,
) -> AppResult<Vec<PublicProductCard>> {
    let store_ids: HashSet<i64> = models.iter().map(|p| p.store_id).collect();
    let category_ids: HashSet<i64> = models.iter().map(|p| p.category_id).collect();

    let store_names: HashMap<i64, String> = if store_ids.is_empty() {
        HashMap::new()
    } else {
        Stores::find()
            .filter(stores::Column::Id.is_in(store_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect()
    };
    let categories: HashMap<i64, product_categories::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        ProductCategories::find()
            .filter(product_categories::Column::Id.is_in(category_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|p| {
            let category = categories.get(&p.category_id);
            PublicProductCard {
                id: p.id,
                store_name: store_names.get(&p.store_id).cloned(),
                category_name: category.map(|c| c.category_name.clone()),
                category_slug: category.map(|c| c.slug.clone()),
                slug: p.slug,
                name: p.name,
                price: p.price,
                store_id: p.store_id,
                category_id: p.category_id,
                thumbnail: p.thumbnail,
                created_at: p.created_at.with_timezone(&Utc),
            }
        })
        .collect())
}

/// Public listing. Rows are paged newest first, then the page itself is
/// shuffled so the storefront does not always lead with the same items.
pub async fn list_public_products(
    state: &AppState,
    query: PageQuery,
) -> AppResult<ApiResponse<PublicProductList>> {
    let (page, limit) = query.resolve(PUBLIC_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let finder = Products::find()
        .filter(search_condition(&query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::with_default_limit(page, limit, total, PUBLIC_PAGE_LIMIT);

    let models = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;
    let mut items = public_cards(state, models).await?;
    items.shuffle(&mut rand::rng());

    Ok(ApiResponse::paginated(
        "Products",
        PublicProductList { items },
        pagination,
    ))
}

pub async fn latest_products(state: &AppState) -> AppResult<ApiResponse<PublicProductList>> {
    let models = Products::find()
        .order_by_desc(Column::CreatedAt)
        .limit(LATEST_PRODUCTS)
        .all(&state.orm)
        .await?;
    let items = public_cards(state, models).await?;
    Ok(ApiResponse::success(
        "Latest products",
        PublicProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_products_by_category(
    state: &AppState,
    category_slug: &str,
    query: PageQuery,
) -> AppResult<ApiResponse<PublicProductList>> {
    let category = ProductCategories::find()
        .filter(product_categories::Column::Slug.eq(category_slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let (page, limit) = query.resolve(PUBLIC_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let finder = Products::find()
        .filter(Column::CategoryId.eq(category.id))
        .filter(search_condition(&query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::with_default_limit(page, limit, total, PUBLIC_PAGE_LIMIT);
    let models = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;
    let items = public_cards(state, models).await?;

    Ok(ApiResponse::paginated(
        format!("Products in {}", category.category_name),
        PublicProductList { items },
        pagination,
    ))
}

pub async fn get_public_product(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let store = product.find_related(Stores).one(&state.orm).await?;
    let category = product.find_related(ProductCategories).one(&state.orm).await?;
    let images = load_images(state, product.id).await?;

    let detail = ProductDetail {
        product: Product::from_parts(product, images),
        store: store.map(PublicStore::from),
        category: category.map(ProductCategory::from),
    };
    Ok(ApiResponse::success("Product", detail, Some(Meta::empty())))
}

/// Dashboard view of a product. Any signed-in user may read it.
pub async fn get_product(
    state: &AppState,
    _user: &AuthUser,
    slug: &str,
) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let images = load_images(state, product.id).await?;
    Ok(ApiResponse::success(
        "Product",
        Product::from_parts(product, images),
        Some(Meta::empty()),
    ))
}

pub async fn list_store_products(
    state: &AppState,
    user: &AuthUser,
    store_id: i64,
    query: PageQuery,
) -> AppResult<ApiResponse<StoreProducts>> {
    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, store.user_id)?;

    let (products, pagination) = store_page(state, store_id, &query).await?;
    let data = StoreProducts {
        store: Store::from(store),
        products: products
            .into_iter()
            .map(|p| ProductCard::from_model(p, true))
            .collect(),
        pagination,
    };
    Ok(ApiResponse::paginated("Store products", data, pagination))
}

pub async fn store_catalog(
    state: &AppState,
    store_id: i64,
    query: PageQuery,
) -> AppResult<ApiResponse<StoreCatalog>> {
    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let (products, pagination) = store_page(state, store_id, &query).await?;
    let data = StoreCatalog {
        store: PublicStore::from(store),
        products: products
            .into_iter()
            .map(|p| ProductCard::from_model(p, false))
            .collect(),
        pagination,
    };
    Ok(ApiResponse::paginated("Store catalog", data, pagination))
}

async fn store_page(
    state: &AppState,
    store_id: i64,
    query: &PageQuery,
) -> AppResult<(Vec<products::Model>, Pagination)> {
    let (page, limit) = query.resolve(STORE_PAGE_LIMIT, STORE_PAGE_MAX);
    let finder = Products::find()
        .filter(Column::StoreId.eq(store_id))
        .filter(search_condition(query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::with_default_limit(page, limit, total, STORE_PAGE_LIMIT);
    let products = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;
    Ok((products, pagination))
}

/// Creates a product with its images. The first image becomes the
/// thumbnail and must be valid; later invalid images are skipped.
pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    form: CreateProductForm,
) -> AppResult<ApiResponse<Product>> {
    let store = Stores::find_by_id(form.store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, store.user_id)?;
    ensure_category_exists(state, form.category_id).await?;

    let storage = state.storage.as_ref();
    let mut files = form.images.into_iter();
    let first = files
        .next()
        .ok_or_else(|| AppError::validation("at least one product image is required"))?;
    storage.validate(&first, MAX_IMAGE_BYTES)?;
    let thumbnail = storage.store(&first, PRODUCT_IMAGE_DIR).await?;

    let mut uploaded = vec![thumbnail.clone()];
    for file in files {
        if let Err(err) = storage.validate(&file, MAX_IMAGE_BYTES) {
            tracing::warn!(file = %file.file_name, error = %err, "skipping invalid image");
            continue;
        }
        match storage.store(&file, PRODUCT_IMAGE_DIR).await {
            Ok(path) => uploaded.push(path),
            Err(err) => {
                tracing::warn!(file = %file.file_name, error = %err, "skipping image that failed to upload")
            }
        }
    }

    let base = generate_slug(&form.name, SLUG_PREFIX);
    let result: AppResult<products::Model> = async {
        let txn = state.orm.begin().await?;
        let product = {
            let catalog = SeaOrmCatalog::new(&txn);
            let repo = &catalog;
            let slug = ensure_unique_slug(&base, |candidate| async move {
                repo.product_slug_exists(&candidate).await
            })
            .await?;

            let product = products::ActiveModel {
                id: NotSet,
                slug: Set(slug),
                name: Set(form.name),
                description: Set(form.description),
                price: Set(form.price),
                store_id: Set(store.id),
                category_id: Set(form.category_id),
                thumbnail: Set(thumbnail.clone()),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;

            let rows = uploaded
                .iter()
                .map(|path| NewProductImage {
                    product_id: product.id,
                    image: path.clone(),
                })
                .collect();
            catalog.insert_images_batch(rows).await?;
            product
        };
        txn.commit().await?;
        Ok(product)
    }
    .await;

    let product = match result {
        Ok(product) => product,
        Err(err) => {
            tracing::error!(error = %err, "product create failed, removing uploaded images");
            discard_files(storage, &uploaded).await;
            return Err(err);
        }
    };

    audit::record(
        state,
        user.user_id,
        "product_create",
        "products",
        json!({ "product_id": product.id, "images": uploaded.len() }),
    )
    .await;

    let images = load_images(state, product.id).await?;
    Ok(ApiResponse::success(
        "Product created",
        Product::from_parts(product, images),
        Some(Meta::empty()),
    ))
}

/// Updates product fields and reconciles its images in one transaction.
/// Files of removed images are deleted only after commit.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    form: UpdateProductForm,
) -> AppResult<ApiResponse<Product>> {
    let (mut product, _store) = find_owned_product(state, user, slug).await?;

    let mut fields_changed = false;
    let rename = form.name != product.name;
    if rename {
        product.name = form.name;
        fields_changed = true;
    }
    if let Some(description) = form.description.filter(|d| *d != product.description) {
        product.description = description;
        fields_changed = true;
    }
    if let Some(price) = form.price.filter(|p| *p != product.price) {
        product.price = price;
        fields_changed = true;
    }
    if let Some(category_id) = form.category_id.filter(|id| *id != product.category_id) {
        ensure_category_exists(state, category_id).await?;
        product.category_id = category_id;
        fields_changed = true;
    }

    let requested = form.images_to_delete.clone();
    let request = ReconcileRequest {
        images_to_delete: form.images_to_delete,
        new_files: form.images,
    };
    let storage = state.storage.as_ref();

    let txn = state.orm.begin().await?;
    let mut outcome = {
        let catalog = SeaOrmCatalog::new(&txn);
        if rename {
            let repo = &catalog;
            let base = generate_slug(&product.name, SLUG_PREFIX);
            product.slug = ensure_unique_slug_except(&base, slug, |candidate| async move {
                repo.product_slug_exists(&candidate).await
            })
            .await?;
        }
        ImageReconciler::new(&catalog, storage)
            .reconcile(product, fields_changed, request)
            .await?
    };
    if let Err(err) = txn.commit().await {
        tracing::error!(error = %err, "product update commit failed, removing uploaded images");
        discard_files(storage, &outcome.added_paths).await;
        return Err(err.into());
    }

    let catalog = SeaOrmCatalog::new(&state.orm);
    let reconciler = ImageReconciler::new(&catalog, storage);
    reconciler.purge_deleted_files(&outcome).await;
    let report = reconciler.verify(&outcome.product, &requested).await;
    if !report.is_clean() {
        tracing::warn!(
            product_id = outcome.product.id,
            repaired = report.repaired.len(),
            failed = report.failed.len(),
            "image verification found stray rows"
        );
    }
    if let Some(thumbnail) = report.thumbnail {
        outcome.product.thumbnail = thumbnail;
    }

    audit::record(
        state,
        user.user_id,
        "product_update",
        "products",
        json!({
            "product_id": outcome.product.id,
            "deleted_images": outcome.deleted_paths.len(),
            "added_images": outcome.added_paths.len(),
            "skipped_files": outcome.skipped_files,
        }),
    )
    .await;

    let images = load_images(state, outcome.product.id).await?;
    Ok(ApiResponse::success(
        "Product updated",
        Product::from_parts(outcome.product, images),
        Some(Meta::empty()),
    ))
}

/// Deletes the row first, then the files of its images and thumbnail.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let (product, _store) = find_owned_product(state, user, slug).await?;
    let images = load_images(state, product.id).await?;

    let mut paths: Vec<String> = images.into_iter().map(|img| img.image).collect();
    if !product.thumbnail.is_empty() && !paths.contains(&product.thumbnail) {
        paths.push(product.thumbnail.clone());
    }

    let result = Products::delete_by_id(product.id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    discard_files(state.storage.as_ref(), &paths).await;

    audit::record(
        state,
        user.user_id,
        "product_delete",
        "products",
        json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted",
        json!({ "slug": product.slug }),
        Some(Meta::empty()),
    ))
}

/// Adds one image. A product without a thumbnail adopts it.
pub async fn add_product_image(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    form: AddProductImageForm,
) -> AppResult<ApiResponse<ProductImage>> {
    let (product, _store) = find_owned_product(state, user, slug).await?;
    let storage = state.storage.as_ref();
    storage.validate(&form.image, MAX_IMAGE_BYTES)?;
    let path = storage.store(&form.image, PRODUCT_IMAGE_DIR).await?;

    let result: AppResult<product_images::Model> = async {
        let txn = state.orm.begin().await?;
        let image = product_images::ActiveModel {
            id: NotSet,
            image: Set(path.clone()),
            product_id: Set(product.id),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;
        if product.thumbnail.is_empty() {
            let mut product = product.clone();
            product.thumbnail = path.clone();
            SeaOrmCatalog::new(&txn).update_product(product).await?;
        }
        txn.commit().await?;
        Ok(image)
    }
    .await;

    let image = match result {
        Ok(image) => image,
        Err(err) => {
            discard_files(storage, std::slice::from_ref(&path)).await;
            return Err(err);
        }
    };

    audit::record(
        state,
        user.user_id,
        "product_image_add",
        "product_images",
        json!({ "product_id": product.id, "image_id": image.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image added",
        ProductImage::from(image),
        Some(Meta::empty()),
    ))
}

/// Removes one image. The thumbnail moves to another image; the last
/// image of a product cannot be removed while it is the thumbnail.
pub async fn delete_product_image(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    image_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let (product, _store) = find_owned_product(state, user, slug).await?;
    let images = load_images(state, product.id).await?;
    let target = images
        .iter()
        .find(|img| img.id == image_id)
        .cloned()
        .ok_or(AppError::NotFound)?;

    let replacement = if target.image == product.thumbnail {
        let next = images
            .iter()
            .find(|img| img.id != image_id)
            .map(|img| img.image.clone());
        match next {
            Some(next) => Some(next),
            None => {
                return Err(AppError::validation(
                    "cannot delete the only image of a product",
                ));
            }
        }
    } else {
        None
    };

    let txn = state.orm.begin().await?;
    {
        let catalog = SeaOrmCatalog::new(&txn);
        let deleted = catalog.delete_images_batch(&[image_id]).await?;
        if deleted != 1 {
            return Err(AppError::NotFound);
        }
        if let Some(thumbnail) = replacement {
            let mut product = product.clone();
            product.thumbnail = thumbnail;
            catalog.update_product(product).await?;
        }
    }
    txn.commit().await?;

    discard_files(state.storage.as_ref(), std::slice::from_ref(&target.image)).await;

    audit::record(
        state,
        user.user_id,
        "product_image_delete",
        "product_images",
        json!({ "product_id": product.id, "image_id": image_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image deleted",
        json!({ "id": image_id }),
        Some(Meta::empty()),
    ))
}
