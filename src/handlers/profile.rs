use crate::error::ApiError;
use crate::extractors::{CurrentUser, MaybeCurrentUser};
use crate::helpers::converters::profile_to_dto;
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State, rejection::FormRejection},
    response::Json,
    Form,
};
use common::{ApiResponse, FeedQuery, FollowForm, ProfileResponse};
use social::feed::{self, FeedScope};
use social::follows::{self, FollowAction};
use social::pagination::PageRequest;
use tracing::{debug, info, instrument, trace};

/// Get a user's profile and their posts
#[utoipa::path(
    get,
    path = "/profile/{username}",
    tag = "profiles",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<String>, Query, description = "Page number; clamped to the valid range"),
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    MaybeCurrentUser(viewer): MaybeCurrentUser,
    Path(username): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    trace!("Entering get_profile function");

    let summary = follows::profile_summary(&state.db, viewer.as_ref(), &username).await?;
    let posts = feed::fetch_feed(
        &state.db,
        viewer.as_ref(),
        FeedScope::Author(summary.user_id),
        PageRequest::parse(query.page.as_deref()),
    )
    .await?;

    debug!(
        "Profile '{}' has {} posts, {} followers",
        summary.username, posts.total, summary.followers_count
    );
    Ok(Json(ApiResponse::ok(
        profile_to_dto(summary, posts, viewer.as_ref()),
        "Profile retrieved successfully",
    )))
}

/// Follow or unfollow a user
#[utoipa::path(
    post,
    path = "/profile/{username}",
    tag = "profiles",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body(content = FollowForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Follow state applied", body = ProfileResponse),
        (status = 400, description = "Invalid action or self-follow", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, form))]
pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(username): Path<String>,
    form: Result<Form<FollowForm>, FormRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    trace!("Entering toggle_follow function");
    let Form(form) = form?;
    let action: FollowAction = form.action.parse()?;

    let summary = follows::apply_follow(&state.db, &state.policy, &actor, &username, action).await?;
    info!(
        "'{}' applied {:?} to '{}'",
        actor.username, action, summary.username
    );

    let posts = feed::fetch_feed(
        &state.db,
        Some(&actor),
        FeedScope::Author(summary.user_id),
        PageRequest::first(),
    )
    .await?;

    let message = match action {
        FollowAction::Follow => "Followed",
        FollowAction::Unfollow => "Unfollowed",
    };
    Ok(Json(ApiResponse::ok(
        profile_to_dto(summary, posts, Some(&actor)),
        message,
    )))
}
