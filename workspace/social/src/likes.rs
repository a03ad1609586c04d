use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use model::entities::{like, post};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
};
use tracing::{debug, info, instrument};

use crate::Identity;
use crate::error::{Result, SocialError};
use crate::posts::find_post;

/// What a like request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

impl LikeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeAction::Like => "like",
            LikeAction::Unlike => "unlike",
        }
    }
}

impl fmt::Display for LikeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LikeAction {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(LikeAction::Like),
            "unlike" => Ok(LikeAction::Unlike),
            _ => Err(SocialError::bad_request("Invalid action")),
        }
    }
}

/// Likes or unlikes a post and returns its like count afterwards.
///
/// Fails with `NotFound` for a missing post. See [`apply_like_to`].
pub async fn apply_like(
    db: &DatabaseConnection,
    actor: &Identity,
    post_id: i32,
    action: LikeAction,
) -> Result<u64> {
    let post = find_post(db, post_id).await?;
    apply_like_to(db, actor, &post, action).await
}

/// Likes or unlikes an already loaded post and returns its like count.
///
/// Both directions are idempotent. A like is inserted with
/// `ON CONFLICT DO NOTHING` on the `(user_id, post_id)` unique index, so
/// two concurrent likes from one user still leave a single row.
#[instrument(skip(db, post), fields(actor = %actor.username, post_id = post.id))]
pub async fn apply_like_to(
    db: &DatabaseConnection,
    actor: &Identity,
    post: &post::Model,
    action: LikeAction,
) -> Result<u64> {
    match action {
        LikeAction::Like => {
            let new_like = like::ActiveModel {
                user_id: Set(actor.user_id),
                post_id: Set(post.id),
                timestamp: Set(Utc::now()),
                ..Default::default()
            };
            let inserted = like::Entity::insert(new_like)
                .on_conflict(
                    OnConflict::columns([like::Column::UserId, like::Column::PostId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            debug!("Like insert affected {} rows", inserted);
        }
        LikeAction::Unlike => {
            let deleted = like::Entity::delete_many()
                .filter(like::Column::UserId.eq(actor.user_id))
                .filter(like::Column::PostId.eq(post.id))
                .exec(db)
                .await?;
            debug!("Unlike removed {} rows", deleted.rows_affected);
        }
    }

    let likes = like_count(db, post.id).await?;
    info!("User '{}' {}d post {}, now {} likes", actor.username, action, post.id, likes);
    Ok(likes)
}

/// Number of likes on a single post.
pub async fn like_count(db: &DatabaseConnection, post_id: i32) -> Result<u64> {
    Ok(like::Entity::find()
        .filter(like::Column::PostId.eq(post_id))
        .count(db)
        .await?)
}

/// Like counts for a set of posts in one grouped query. Posts without
/// likes are absent from the map.
pub(crate) async fn counts_for_posts(
    db: &DatabaseConnection,
    post_ids: &[i32],
) -> Result<HashMap<i32, u64>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = like::Entity::find()
        .select_only()
        .column(like::Column::PostId)
        .column_as(Expr::col(like::Column::Id).count(), "likes")
        .filter(like::Column::PostId.is_in(post_ids.iter().copied()))
        .group_by(like::Column::PostId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(post_id, count)| (post_id, count.max(0) as u64))
        .collect())
}

/// The subset of `post_ids` that `user_id` has liked.
pub(crate) async fn liked_among(
    db: &DatabaseConnection,
    user_id: i32,
    post_ids: &[i32],
) -> Result<Vec<i32>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(like::Entity::find()
        .select_only()
        .column(like::Column::PostId)
        .filter(like::Column::UserId.eq(user_id))
        .filter(like::Column::PostId.is_in(post_ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
