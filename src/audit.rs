use serde_json::Value;

use crate::{error::AppResult, state::AppState};

/// Records a mutation in `audit_logs`. Callers treat failures as non-fatal.
pub async fn log_audit(
    state: &AppState,
    user_id: Option<i64>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(state.orm.get_postgres_connection_pool())
    .await?;

    Ok(())
}

/// Fire-and-log wrapper used by the services.
pub async fn record(
    state: &AppState,
    user_id: i64,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = log_audit(state, Some(user_id), action, Some(resource), Some(metadata)).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
