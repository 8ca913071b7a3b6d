pub mod recovery;
pub mod sessions;

use axum::routing::post;
use axum::Router;

use crate::middleware::controller::method_not_allowed;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Recovery
        .route(
            "/api/v1/recovery",
            post(recovery::create)
                .patch(recovery::update)
                .fallback(method_not_allowed),
        )
        // Sessions
        .route(
            "/api/v1/sessions",
            post(sessions::create).fallback(method_not_allowed),
        )
}
