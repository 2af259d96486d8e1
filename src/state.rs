use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::readings::ReadingStore;
use crate::database::users::UserStore;
use crate::services::ReadingQueries;

/// Shared application state: configuration plus the components built from
/// it at startup. Cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub users: UserStore,
    pub readings: ReadingStore,
    pub queries: ReadingQueries,
    pub pool: PgPool,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, pool: PgPool) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config.security)?;
        let users = UserStore::new(pool.clone());
        let readings = ReadingStore::new(pool.clone());
        let queries = ReadingQueries::new(readings.clone());

        Ok(Self {
            config,
            tokens,
            users,
            readings,
            queries,
            pool,
        })
    }
}
