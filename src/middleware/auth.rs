use axum::{extract::FromRequestParts, http::header};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    entity::users::{Column as UserColumn, Entity as Users},
    error::AppError,
    models::Role,
    state::AppState,
};

/// The caller behind a validated bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

/// Ownership check: the actor may mutate a resource only if it owns it.
pub fn authorize(actor_id: i64, owner_id: i64) -> Access {
    if actor_id == owner_id {
        Access::Allowed
    } else {
        Access::Denied
    }
}

pub fn ensure_owner(user: &AuthUser, owner_id: i64) -> Result<(), AppError> {
    match authorize(user.user_id, owner_id) {
        Access::Allowed => Ok(()),
        Access::Denied => {
            tracing::warn!(actor = user.user_id, owner = owner_id, "ownership check denied");
            Err(AppError::Forbidden)
        }
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Seller)
}

/// Accepts both `Bearer <token>` and a bare token.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = bearer_token(auth_str)
            .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

        let claims = state.jwt.validate(token)?;

        let user = Users::find()
            .filter(UserColumn::Email.eq(claims.email.as_str()))
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        Ok(AuthUser {
            user_id: user.id,
            role: Role::from_db(&user.role),
            email: user.email,
        })
    }
}
