//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/schemas/{table}", get(handlers::get_schema))
        .route("/api/models/{table}", get(handlers::list_models))
        .route("/api/models/{table}/find", post(handlers::find_records))
}
