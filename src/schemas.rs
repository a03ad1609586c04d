use common::{
    CreatePostForm, EditPostRequest, EditPostResponse, FeedPageDto, FeedPageResponse, FollowForm,
    LikeRequest, LikeResponse, LoginForm, PostDto, PostResponse, ProfileDto, ProfileResponse,
    RegisterForm, SessionDto, SessionResponse, UserDto, UserResponse,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use social::Policy;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Domain policy (self-follow, session lifetime)
    pub policy: Policy,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::feed::index,
        crate::handlers::feed::following,
        crate::handlers::feed::create_post,
        crate::handlers::posts::edit_post,
        crate::handlers::posts::like_post,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::toggle_follow,
        crate::handlers::auth::login_page,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::register_page,
        crate::handlers::auth::register,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            FeedPageResponse,
            PostResponse,
            ProfileResponse,
            UserResponse,
            SessionResponse,
            FeedPageDto,
            PostDto,
            ProfileDto,
            UserDto,
            SessionDto,
            CreatePostForm,
            EditPostRequest,
            EditPostResponse,
            LikeRequest,
            LikeResponse,
            FollowForm,
            LoginForm,
            RegisterForm,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "posts", description = "Feeds, posting, editing and likes"),
        (name = "profiles", description = "Profiles and follow relations"),
        (name = "accounts", description = "Registration and session login"),
    ),
    info(
        title = "socialnet API",
        description = "A small social network: post short updates, follow people, like posts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
