use chrono::Utc;
use model::entities::post::{self, MAX_CONTENT_CHARS};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{debug, info, instrument, warn};

use crate::Identity;
use crate::error::{Result, SocialError};

/// Trims post content and checks it is non-empty and within the character
/// limit. Length is counted in Unicode scalar values.
pub fn normalize_content(raw: &str) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(SocialError::bad_request("Content cannot be empty"));
    }

    let length = content.chars().count();
    if length > MAX_CONTENT_CHARS {
        return Err(SocialError::BadRequest(format!(
            "Content cannot exceed {MAX_CONTENT_CHARS} characters (got {length})"
        )));
    }

    Ok(content.to_string())
}

/// Fetches a post or fails with `NotFound`.
pub async fn find_post(db: &DatabaseConnection, post_id: i32) -> Result<post::Model> {
    post::Entity::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| SocialError::NotFound(format!("Post {post_id} not found")))
}

/// Publishes a new post authored by `author`.
#[instrument(skip(db, content), fields(author = %author.username))]
pub async fn create_post(
    db: &DatabaseConnection,
    author: &Identity,
    content: &str,
) -> Result<post::Model> {
    let content = normalize_content(content)?;

    let post = post::ActiveModel {
        user_id: Set(author.user_id),
        content: Set(content),
        timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("User '{}' created post {}", author.username, post.id);
    Ok(post)
}

/// Fetches a post `editor` is allowed to edit.
///
/// Fails with `NotFound` for a missing post and `Forbidden` when the editor
/// does not own it.
#[instrument(skip(db), fields(editor = %editor.username))]
pub async fn find_editable_post(
    db: &DatabaseConnection,
    editor: &Identity,
    post_id: i32,
) -> Result<post::Model> {
    let existing = find_post(db, post_id).await?;

    if existing.user_id != editor.user_id {
        warn!(
            "User '{}' attempted to edit post {} owned by user {}",
            editor.username, post_id, existing.user_id
        );
        return Err(SocialError::Forbidden(
            "You cannot edit this post".to_string(),
        ));
    }

    Ok(existing)
}

/// Replaces the content of a post returned by [`find_editable_post`]. The
/// timestamp is left untouched.
#[instrument(skip(db, existing, content), fields(post_id = existing.id))]
pub async fn replace_content(
    db: &DatabaseConnection,
    existing: post::Model,
    content: &str,
) -> Result<post::Model> {
    let content = normalize_content(content)?;
    debug!("Updating content of post {}", existing.id);

    let mut active: post::ActiveModel = existing.into();
    active.content = Set(content);
    let updated = active.update(db).await?;

    info!("Post {} edited", updated.id);
    Ok(updated)
}

/// Replaces the content of one of the editor's own posts.
///
/// Fails with `NotFound` for a missing post, `Forbidden` when the editor
/// does not own it and `BadRequest` for invalid content, in that order.
pub async fn edit_post(
    db: &DatabaseConnection,
    editor: &Identity,
    post_id: i32,
    content: &str,
) -> Result<post::Model> {
    let existing = find_editable_post(db, editor, post_id).await?;
    replace_content(db, existing, content).await
}
