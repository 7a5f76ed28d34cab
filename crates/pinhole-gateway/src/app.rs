use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_url_handler, get_url_handler, health_handler, list_urls_handler,
    redirect_handler, rename_url_handler, update_url_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/v1/health", get(health_handler))
            .route("/v1/urls", post(create_url_handler).get(list_urls_handler))
            .route(
                "/v1/urls/{code}",
                get(get_url_handler)
                    .patch(update_url_handler)
                    .delete(delete_url_handler),
            )
            .route("/v1/urls/{code}/rename", post(rename_url_handler))
            .route("/{code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
