use axum::Router;
use axum::routing::get;

pub mod error_recorder;
pub mod readings;

use readings::{recent, record};

pub fn get_routes(state: crate::AppState) -> Router {
    Router::new()
        .route(
            "/weight",
            get(record::handler::handler)
                .post(record::handler::handler)
                // Otherwise HEAD would run the GET handler and store a reading
                .head(record::handler::method_not_allowed)
                .fallback(record::handler::method_not_allowed),
        )
        .route(
            "/data",
            get(recent::handler::handler)
                .fallback(recent::handler::method_not_allowed),
        )
        .with_state(state)
}
