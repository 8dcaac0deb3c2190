use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{articles, product_categories, product_images, products, stores, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }

    /// Unknown values read back from the database are treated as buyers.
    pub fn from_db(value: &str) -> Self {
        match value {
            "seller" => Role::Seller,
            _ => Role::Buyer,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: Role::from_db(&model.role),
            email: model.email,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub whatsapp: String,
    pub address: String,
    pub user_id: i64,
    pub avatar: String,
    pub banner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stores::Model> for Store {
    fn from(model: stores::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            whatsapp: model.whatsapp,
            address: model.address,
            user_id: model.user_id,
            avatar: model.avatar,
            banner: model.banner,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Store fields safe to show to anonymous visitors.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicStore {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub banner: String,
}

impl From<stores::Model> for PublicStore {
    fn from(model: stores::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            avatar: model.avatar,
            banner: model.banner,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductCategory {
    pub id: i64,
    pub category_name: String,
    pub slug: String,
}

impl From<product_categories::Model> for ProductCategory {
    fn from(model: product_categories::Model) -> Self {
        Self {
            id: model.id,
            category_name: model.category_name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductImage {
    pub id: i64,
    pub image: String,
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            image: model.image,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "150000.00")]
    pub price: Decimal,
    pub store_id: i64,
    pub category_id: i64,
    pub thumbnail: String,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn from_parts(model: products::Model, images: Vec<product_images::Model>) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            name: model.name,
            description: model.description,
            price: model.price,
            store_id: model.store_id,
            category_id: model.category_id,
            thumbnail: model.thumbnail,
            images: images.into_iter().map(ProductImage::from).collect(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Compact product used by store listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCard {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(value_type = String, example = "150000.00")]
    pub price: Decimal,
    pub store_id: i64,
    pub thumbnail: String,
    pub created_at: DateTime<Utc>,
}

impl ProductCard {
    pub fn from_model(model: products::Model, with_description: bool) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            name: model.name,
            description: with_description.then_some(model.description),
            price: model.price,
            store_id: model.store_id,
            thumbnail: model.thumbnail,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Product card for anonymous listings, with store and category names.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicProductCard {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[schema(value_type = String, example = "150000.00")]
    pub price: Decimal,
    pub store_id: i64,
    pub store_name: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub thumbnail: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the public product page shows.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub store: Option<PublicStore>,
    pub category: Option<ProductCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub excerpt: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<articles::Model> for Article {
    fn from(model: articles::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            excerpt: model.excerpt,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
