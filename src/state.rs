use std::sync::Arc;

use crate::cart::CartStore;
use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    /// Process-wide cart state, injected rather than global so tests can
    /// construct an isolated instance.
    pub cart: Arc<CartStore>,
    pub config: AppConfig,
}
