use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::form::MultipartForm,
    error::AppError,
    models::{ProductCard, ProductCategory, PublicProductCard, PublicStore, Store},
    pagination::Pagination,
    storage::{UploadFile, is_public_upload_path},
};

pub const MAX_PRODUCT_NAME_LEN: usize = 255;

/// `multipart/form-data` body of `POST /api/products`.
#[derive(Debug, ToSchema)]
pub struct CreateProductForm {
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "150000.00")]
    pub price: Decimal,
    pub store_id: i64,
    pub category_id: i64,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<UploadFile>,
}

impl TryFrom<MultipartForm> for CreateProductForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> Result<Self, Self::Error> {
        let name = form.required_text("name")?;
        validate_name(&name)?;
        let description = form.required_text("description")?;
        let price = form
            .parse::<Decimal>("price")?
            .ok_or_else(|| AppError::validation("price is required"))?;
        validate_price(price)?;
        let store_id = form
            .parse::<i64>("store_id")?
            .ok_or_else(|| AppError::validation("store_id is required"))?;
        let category_id = form
            .parse::<i64>("category_id")?
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::validation("category_id is required"))?;
        let images = form.take_files("images");
        if images.is_empty() {
            return Err(AppError::validation("at least one product image is required"));
        }

        Ok(Self {
            name,
            description,
            price,
            store_id,
            category_id,
            images,
        })
    }
}

/// `multipart/form-data` body of `PUT /api/products/{slug}`.
///
/// Blank text fields leave the stored value untouched. `imagesToDelete` is a
/// JSON array of image paths previously returned by the API.
#[derive(Debug, ToSchema)]
pub struct UpdateProductForm {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "150000.00")]
    pub price: Option<Decimal>,
    pub category_id: Option<i64>,
    #[schema(rename = "imagesToDelete")]
    pub images_to_delete: Vec<String>,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<UploadFile>,
}

impl TryFrom<MultipartForm> for UpdateProductForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> Result<Self, Self::Error> {
        let name = form.required_text("name")?;
        validate_name(&name)?;
        let description = form.text("description");
        let price = form.parse::<Decimal>("price")?;
        if let Some(price) = price {
            validate_price(price)?;
        }
        let category_id = form.parse::<i64>("category_id")?;
        if category_id.is_some_and(|id| id <= 0) {
            return Err(AppError::validation("category_id is not valid"));
        }
        let images_to_delete = match form.text("imagesToDelete") {
            Some(raw) => parse_images_to_delete(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            name,
            description,
            price,
            category_id,
            images_to_delete,
            images: form.take_files("images"),
        })
    }
}

/// Parses and checks the deletion list. Any entry outside the upload
/// namespace rejects the whole request; blank entries are dropped.
pub fn parse_images_to_delete(raw: &str) -> Result<Vec<String>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "[]" || raw == "null" {
        return Ok(Vec::new());
    }

    let entries: Vec<String> = serde_json::from_str(raw)
        .map_err(|_| AppError::validation("imagesToDelete must be a JSON array of image paths"))?;

    let mut paths = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.trim();
        if path.is_empty() {
            continue;
        }
        if !is_public_upload_path(path) {
            return Err(AppError::validation(format!("invalid image path {path}")));
        }
        paths.push(path.to_string());
    }
    Ok(paths)
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(AppError::validation(format!(
            "name must be at most {MAX_PRODUCT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("price must be greater than 0"));
    }
    Ok(())
}

/// `multipart/form-data` body of `POST /api/products/{slug}/images`.
#[derive(Debug, ToSchema)]
pub struct AddProductImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: UploadFile,
}

impl TryFrom<MultipartForm> for AddProductImageForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> Result<Self, Self::Error> {
        let image = form
            .take_file("image")
            .ok_or_else(|| AppError::validation("image file is required"))?;
        Ok(Self { image })
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PublicProductList {
    #[schema(value_type = Vec<PublicProductCard>)]
    pub items: Vec<PublicProductCard>,
}

/// Owner dashboard: the store plus one page of its products.
#[derive(Serialize, ToSchema)]
pub struct StoreProducts {
    pub store: Store,
    pub products: Vec<ProductCard>,
    pub pagination: Pagination,
}

/// Public catalog of a single store.
#[derive(Serialize, ToSchema)]
pub struct StoreCatalog {
    pub store: PublicStore,
    pub products: Vec<ProductCard>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<ProductCategory>)]
    pub items: Vec<ProductCategory>,
}
