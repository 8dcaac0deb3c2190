use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::auth::UserList,
    entity::users::{Column, Entity as Users},
    error::AppResult,
    models::User,
    pagination::{DEFAULT_LIMIT, Pagination},
    response::ApiResponse,
    routes::params::PageQuery,
    state::AppState,
};

pub const MAX_PAGE_LIMIT: i64 = 100;

pub async fn list_users(state: &AppState, query: PageQuery) -> AppResult<ApiResponse<UserList>> {
    let (page, limit) = query.resolve(DEFAULT_LIMIT, MAX_PAGE_LIMIT);
    let mut condition = Condition::all();
    if let Some(pattern) = query.search_pattern() {
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Email).ilike(pattern)),
        );
    }

    let finder = Users::find().filter(condition).order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let pagination = Pagination::new(page, limit, total);

    let items = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::paginated("Users", UserList { items }, pagination))
}
