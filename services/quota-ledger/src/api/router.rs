use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/plans", get(handlers::list_plans))
        .route("/api/ledger", get(handlers::load_ledger))
        .route("/api/ledger/check", post(handlers::check_usage))
        .route("/api/ledger/usage", post(handlers::record_usage))
        .route("/api/ledger/consume", post(handlers::consume))
        .route("/api/ledger/plan", post(handlers::change_plan))
        .route("/api/ledger/remaining/:feature", get(handlers::remaining))
        .route(
            "/api/history",
            get(handlers::list_history)
                .post(handlers::add_history)
                .delete(handlers::clear_history),
        )
        .route("/api/history/delete", post(handlers::remove_history_items))
        .route(
            "/api/history/:id",
            get(handlers::get_history_item).delete(handlers::remove_history_item),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
