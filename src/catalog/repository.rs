use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Unchanged}, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    entity::{
        product_images::{self, Entity as ProductImages},
        products::{self, Entity as Products},
    },
    error::AppResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductImage {
    pub product_id: i64,
    pub image: String,
}

/// Persistence operations the image reconciler depends on.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Images of a product ordered by id.
    async fn find_images_by_product(&self, product_id: i64) -> AppResult<Vec<product_images::Model>>;

    /// Deletes the given image rows and reports how many were removed.
    async fn delete_images_batch(&self, ids: &[i64]) -> AppResult<u64>;

    async fn insert_images_batch(&self, images: Vec<NewProductImage>) -> AppResult<()>;

    async fn delete_images_by_path(&self, product_id: i64, path: &str) -> AppResult<u64>;

    async fn update_product(&self, product: products::Model) -> AppResult<products::Model>;

    async fn product_slug_exists(&self, slug: &str) -> AppResult<bool>;
}

/// [`CatalogStore`] over any sea-orm connection, including a transaction.
pub struct SeaOrmCatalog<'c, C> {
    conn: &'c C,
}

impl<'c, C> SeaOrmCatalog<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> CatalogStore for SeaOrmCatalog<'_, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_images_by_product(&self, product_id: i64) -> AppResult<Vec<product_images::Model>> {
        let images = ProductImages::find()
            .filter(product_images::Column::ProductId.eq(product_id))
            .order_by_asc(product_images::Column::Id)
            .all(self.conn)
            .await?;
        Ok(images)
    }

    async fn delete_images_batch(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = ProductImages::delete_many()
            .filter(product_images::Column::Id.is_in(ids.iter().copied()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn insert_images_batch(&self, images: Vec<NewProductImage>) -> AppResult<()> {
        if images.is_empty() {
            return Ok(());
        }
        let models = images.into_iter().map(|img| product_images::ActiveModel {
            id: NotSet,
            image: Set(img.image),
            product_id: Set(img.product_id),
            created_at: NotSet,
            updated_at: NotSet,
        });
        ProductImages::insert_many(models).exec(self.conn).await?;
        Ok(())
    }

    async fn delete_images_by_path(&self, product_id: i64, path: &str) -> AppResult<u64> {
        let result = ProductImages::delete_many()
            .filter(product_images::Column::ProductId.eq(product_id))
            .filter(product_images::Column::Image.eq(path))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_product(&self, product: products::Model) -> AppResult<products::Model> {
        let active = products::ActiveModel {
            id: Unchanged(product.id),
            slug: Set(product.slug),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            store_id: Set(product.store_id),
            category_id: Set(product.category_id),
            thumbnail: Set(product.thumbnail),
            created_at: NotSet,
            updated_at: Set(Utc::now().fixed_offset()),
        };
        Ok(active.update(self.conn).await?)
    }

    async fn product_slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}
