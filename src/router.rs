use crate::handlers::{
    auth::{login, login_page, logout, register, register_page},
    feed::{create_post, following, index},
    health::health_check,
    posts::{edit_post, like_post},
    profile::{get_profile, toggle_follow},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Feeds and posting
        .route("/", get(index).post(create_post))
        .route("/following", get(following))
        // Accounts
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/register", get(register_page).post(register))
        // Profiles
        .route("/profile/:username", get(get_profile).post(toggle_follow))
        // Post API
        .route("/posts/:post_id/edit", put(edit_post))
        .route("/posts/:post_id/like", put(like_post))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
