//! HTTP surface of the alumni hub: axum routers, extractors, error
//! mapping, request metrics and middleware.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use app::{app, HttpOptions};
#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use state::AppState;

#[cfg(feature = "web-axum")]
mod app {
    use std::path::PathBuf;

    use axum::extract::DefaultBodyLimit;
    use axum::routing::get;
    use axum::Router;
    use tower_http::limit::RequestBodyLimitLayer;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    use crate::middleware::{cors_policy, track_requests};
    use crate::routes;
    use crate::state::AppState;

    pub struct HttpOptions {
        /// Served under `/uploads`.
        pub uploads_dir: PathBuf,
        pub max_body_bytes: usize,
    }

    pub fn app(state: AppState, options: HttpOptions) -> Router {
        let api = Router::new()
            .nest("/schools", routes::schools::router())
            .nest("/events", routes::events::router())
            .nest("/forums", routes::forums::router())
            .nest("/topics", routes::topics::router())
            .nest("/posts", routes::posts::router());

        Router::new()
            .nest("/api", api)
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .nest_service("/uploads", ServeDir::new(options.uploads_dir))
            .layer(axum::middleware::from_fn_with_state(
                state.metrics.clone(),
                track_requests,
            ))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(options.max_body_bytes))
            .layer(cors_policy())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
