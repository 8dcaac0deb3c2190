use serde::Serialize;
use utoipa::ToSchema;

use crate::pagination::Pagination;

#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub total_items: Option<u64>,
    pub total_pages: Option<u64>,
}

impl Meta {
    pub fn empty() -> Self {
        Self {
            page: None,
            limit: None,
            total_items: None,
            total_pages: None,
        }
    }
}

impl From<Pagination> for Meta {
    fn from(p: Pagination) -> Self {
        Self {
            page: Some(p.page),
            limit: Some(p.limit),
            total_items: Some(p.total_items),
            total_pages: Some(p.total_pages),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self::success(message, data, Some(pagination.into()))
    }
}
