use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::external::Sources;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sources: Arc<Sources>,
    pub config: Arc<AppConfig>,
}
