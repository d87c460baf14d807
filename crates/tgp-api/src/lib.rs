pub mod applications;
pub mod auth;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod storage;
pub mod token;
pub mod tree;

use std::sync::Arc;

use storage::DocumentStore;
use tgp_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub docs: DocumentStore,
}
