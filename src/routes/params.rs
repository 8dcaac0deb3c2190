use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1.
    pub page: Option<i64>,
    /// Items per page; out-of-range values fall back to the endpoint default.
    pub limit: Option<i64>,
    /// Case-insensitive substring filter.
    pub search: Option<String>,
}

impl PageQuery {
    /// Normalized `(page, limit)`.
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = match self.limit {
            Some(limit) if (1..=max_limit).contains(&limit) => limit,
            _ => default_limit,
        };
        (page, limit)
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArticleSearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<ArticleSearchQuery> for PageQuery {
    fn from(query: ArticleSearchQuery) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            search: query.q,
        }
    }
}
