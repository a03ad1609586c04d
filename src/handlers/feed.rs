use crate::error::ApiError;
use crate::extractors::{CurrentUser, MaybeCurrentUser};
use crate::helpers::converters::{feed_page_to_dto, new_post_to_dto};
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{Query, State, rejection::FormRejection},
    http::StatusCode,
    response::Json,
    Form,
};
use common::{ApiResponse, CreatePostForm, FeedPageResponse, FeedQuery, PostResponse};
use social::feed::{self, FeedScope};
use social::pagination::PageRequest;
use social::posts;
use tracing::{debug, info, instrument, trace};

/// List all posts, newest first
#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(
        ("page" = Option<String>, Query, description = "Page number; clamped to the valid range"),
    ),
    responses(
        (status = 200, description = "Posts retrieved successfully", body = FeedPageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    MaybeCurrentUser(viewer): MaybeCurrentUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, ApiError> {
    trace!("Entering index function");

    let page = feed::fetch_feed(
        &state.db,
        viewer.as_ref(),
        FeedScope::All,
        PageRequest::parse(query.page.as_deref()),
    )
    .await?;

    debug!("Returning page {} of {}", page.number, page.num_pages);
    Ok(Json(ApiResponse::ok(
        feed_page_to_dto(page),
        "Posts retrieved successfully",
    )))
}

/// Publish a new post
#[utoipa::path(
    post,
    path = "/",
    tag = "posts",
    request_body(content = CreatePostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Post created successfully", body = PostResponse),
        (status = 400, description = "Empty or too long content", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, form))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(author): CurrentUser,
    form: Result<Form<CreatePostForm>, FormRejection>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    trace!("Entering create_post function");
    let Form(form) = form?;

    let post = posts::create_post(&state.db, &author, &form.content).await?;

    info!("Post {} created by '{}'", post.id, author.username);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            new_post_to_dto(post, &author),
            "Post created successfully",
        )),
    ))
}

/// List posts from followed users
#[utoipa::path(
    get,
    path = "/following",
    tag = "posts",
    params(
        ("page" = Option<String>, Query, description = "Page number; clamped to the valid range"),
    ),
    responses(
        (status = 200, description = "Posts retrieved successfully", body = FeedPageResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn following(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, ApiError> {
    trace!("Entering following function");

    let page = feed::fetch_feed(
        &state.db,
        Some(&viewer),
        FeedScope::Following,
        PageRequest::parse(query.page.as_deref()),
    )
    .await?;

    debug!(
        "Returning {} followed posts for '{}'",
        page.posts.len(),
        viewer.username
    );
    Ok(Json(ApiResponse::ok(
        feed_page_to_dto(page),
        "Posts retrieved successfully",
    )))
}
