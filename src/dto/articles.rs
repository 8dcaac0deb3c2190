use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::form::MultipartForm, error::AppError, models::Article, storage::UploadFile};

pub const EXCERPT_MAX_CHARS: usize = 150;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ArticleRequest {
    pub title: String,
    pub description: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
}

impl ArticleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::validation("description is required"));
        }
        Ok(())
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ArticleList {
    #[schema(value_type = Vec<Article>)]
    pub items: Vec<Article>,
}

/// `multipart/form-data` body of `POST /api/upload`.
#[derive(Debug, ToSchema)]
pub struct UploadImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: UploadFile,
}

impl TryFrom<MultipartForm> for UploadImageForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> Result<Self, Self::Error> {
        let image = form
            .take_file("image")
            .ok_or_else(|| AppError::validation("No image provided"))?;
        Ok(Self { image })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub image_url: String,
    pub filename: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}
