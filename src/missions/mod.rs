use crate::state::AppState;
use axum::Router;

mod dto;
pub mod engine;
pub mod handlers;
pub mod repo;
pub mod rules;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::mission_routes())
        .merge(handlers::point_routes())
}
