use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::form::MultipartForm, error::AppError, models::Store, storage::UploadFile};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    pub name: String,
    pub description: String,
    pub whatsapp: String,
    pub address: String,
}

impl CreateStoreRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("name", &self.name, 3, 50)?;
        check_len("description", &self.description, 10, 500)?;
        check_whatsapp(&self.whatsapp)?;
        check_len("address", &self.address, 10, 200)?;
        Ok(())
    }
}

/// `multipart/form-data` body of `PUT /api/stores/{id}`. Every field is
/// optional; blank fields keep the stored value.
#[derive(Debug, Default, ToSchema)]
pub struct UpdateStoreForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub avatar: Option<UploadFile>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub banner: Option<UploadFile>,
}

impl TryFrom<MultipartForm> for UpdateStoreForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> Result<Self, Self::Error> {
        let update = Self {
            name: form.text("name"),
            description: form.text("description"),
            whatsapp: form.text("whatsapp"),
            address: form.text("address"),
            avatar: form.take_file("avatar"),
            banner: form.take_file("banner"),
        };
        if let Some(name) = &update.name {
            check_len("name", name, 3, 50)?;
        }
        if let Some(description) = &update.description {
            check_len("description", description, 10, 500)?;
        }
        if let Some(whatsapp) = &update.whatsapp {
            check_whatsapp(whatsapp)?;
        }
        if let Some(address) = &update.address {
            check_len("address", address, 10, 200)?;
        }
        Ok(update)
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// E.164: optional leading `+`, then 8 to 15 digits.
fn check_whatsapp(value: &str) -> Result<(), AppError> {
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    if (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::validation("whatsapp must be a phone number in E.164 format"))
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct StoreList {
    #[schema(value_type = Vec<Store>)]
    pub items: Vec<Store>,
}
