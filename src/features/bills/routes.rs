use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::bills::handlers;
use crate::features::bills::services::BillService;

/// Create routes for the bills feature
pub fn routes(service: Arc<BillService>, max_body_size: usize) -> Router {
    Router::new()
        .route("/api/bills", get(handlers::list_bills))
        .route("/api/bills/", get(handlers::list_bills))
        .route(
            "/api/bills/add",
            post(handlers::create_bill).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/bills/describe", get(handlers::describe_bills))
        .route("/api/bills/{id}", delete(handlers::delete_bill))
        .with_state(service)
}
