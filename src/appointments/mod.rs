pub mod dto;
pub mod handlers;
pub mod query;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(enable_global_listing: bool) -> Router<AppState> {
    let router = Router::new().merge(handlers::owned_routes());
    if enable_global_listing {
        router.merge(handlers::global_routes())
    } else {
        router
    }
}
