use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Json,
};
use common::{EditPostRequest, EditPostResponse, LikeRequest, LikeResponse};
use social::likes::{self, LikeAction};
use social::posts;
use tracing::{debug, info, instrument, trace};

/// Edit one of your own posts
#[utoipa::path(
    put,
    path = "/posts/{post_id}/edit",
    tag = "posts",
    params(
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    request_body = EditPostRequest,
    responses(
        (status = 200, description = "Post updated", body = EditPostResponse),
        (status = 400, description = "Malformed body or empty content", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 403, description = "Not the author of the post", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(editor): CurrentUser,
    post_id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<EditPostRequest>, JsonRejection>,
) -> Result<Json<EditPostResponse>, ApiError> {
    trace!("Entering edit_post function");
    let Path(post_id) = post_id?;
    debug!("User '{}' editing post {}", editor.username, post_id);

    let existing = posts::find_editable_post(&state.db, &editor, post_id).await?;
    let Json(request) = payload?;
    let post = posts::replace_content(&state.db, existing, &request.content).await?;

    info!("Post {} updated", post.id);
    Ok(Json(EditPostResponse {
        success: "Post updated".to_string(),
        content: post.content,
    }))
}

/// Like or unlike a post
#[utoipa::path(
    put,
    path = "/posts/{post_id}/like",
    tag = "posts",
    params(
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    request_body = LikeRequest,
    responses(
        (status = 200, description = "Like state applied", body = LikeResponse),
        (status = 400, description = "Malformed body or invalid action", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    post_id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    trace!("Entering like_post function");
    let Path(post_id) = post_id?;
    let post = posts::find_post(&state.db, post_id).await?;
    let Json(request) = payload?;
    let action: LikeAction = request.action.parse()?;

    let likes = likes::apply_like_to(&state.db, &actor, &post, action).await?;

    let success = match action {
        LikeAction::Like => "Post liked",
        LikeAction::Unlike => "Post unliked",
    };
    Ok(Json(LikeResponse {
        success: success.to_string(),
        likes,
    }))
}
