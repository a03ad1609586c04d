//! Transport-layer types shared between the server and API clients.
//! These structs are the request/response payloads of the HTTP handlers,
//! so a client can deserialize responses without duplicating shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the page endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    FeedPageResponse = ApiResponse<FeedPageDto>,
    PostResponse = ApiResponse<PostDto>,
    ProfileResponse = ApiResponse<ProfileDto>,
    UserResponse = ApiResponse<UserDto>,
    SessionResponse = ApiResponse<SessionDto>
)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

// ===================== Posts =====================

/// Form body for publishing a post on `POST /`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct CreatePostForm {
    #[serde(default)]
    pub content: String,
}

/// JSON body of `PUT /posts/{id}/edit`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct EditPostRequest {
    #[serde(default)]
    pub content: String,
}

/// Successful reply of `PUT /posts/{id}/edit`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EditPostResponse {
    /// Human readable confirmation, e.g. "Post updated"
    pub success: String,
    /// The stored (trimmed) content
    pub content: String,
}

/// JSON body of `PUT /posts/{id}/like`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LikeRequest {
    /// Either "like" or "unlike"
    pub action: String,
}

/// Successful reply of `PUT /posts/{id}/like`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LikeResponse {
    /// Human readable confirmation, e.g. "Post liked"
    pub success: String,
    /// Like count after the action
    pub likes: u64,
}

/// A post as rendered in a feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PostDto {
    pub id: i32,
    pub author_id: i32,
    pub author_username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
    /// Whether the current viewer liked this post
    pub liked: bool,
}

// ===================== Feeds =====================

/// Query string of the feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct FeedQuery {
    /// Requested page; missing, non-numeric or out-of-range values are clamped
    pub page: Option<String>,
}

/// One page of posts, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FeedPageDto {
    pub posts: Vec<PostDto>,
    /// Current page (1-based)
    pub page: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
    /// Ids of the posts on this page the viewer has liked
    pub liked_post_ids: Vec<i32>,
}

// ===================== Profiles =====================

/// Form body of `POST /profile/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct FollowForm {
    /// Either "follow" or "unfollow"
    #[serde(default)]
    pub action: String,
}

/// A user's profile with their posts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProfileDto {
    pub id: i32,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this user
    pub is_following: bool,
    /// Whether the viewer is looking at their own profile
    pub is_self: bool,
    pub posts: FeedPageDto,
}

// ===================== Accounts =====================

/// Form body of `POST /login`.
#[derive(Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Form body of `POST /register`.
#[derive(Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

// Passwords stay out of logs.
impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
}

/// Who, if anyone, the current session belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionDto {
    pub authenticated: bool,
    pub username: Option<String>,
}
