use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    services::token_service::JwtKeys,
    storage::LocalFileStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub jwt: Arc<JwtKeys>,
    pub storage: Arc<LocalFileStorage>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: &AppConfig) -> Self {
        Self {
            orm,
            jwt: Arc::new(JwtKeys::new(
                &config.jwt_secret,
                config.jwt_issuer.clone(),
                config.jwt_ttl_minutes,
            )),
            storage: Arc::new(LocalFileStorage::new(config.upload_dir.clone())),
        }
    }
}
