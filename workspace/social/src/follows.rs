use std::str::FromStr;

use chrono::{DateTime, Utc};
use model::entities::{follow, user};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SocialError};
use crate::{Identity, Policy};

/// What a follow request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Follow,
    Unfollow,
}

impl FromStr for FollowAction {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "follow" => Ok(FollowAction::Follow),
            "unfollow" => Ok(FollowAction::Unfollow),
            _ => Err(SocialError::bad_request("Invalid action")),
        }
    }
}

/// Public view of a user together with the viewer's relation to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub user_id: i32,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this user; always false for anonymous viewers.
    pub is_following: bool,
}

pub async fn find_user_by_username(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| SocialError::NotFound(format!("User '{username}' not found")))
}

pub async fn is_following(db: &DatabaseConnection, follower_id: i32, followee_id: i32) -> Result<bool> {
    Ok(follow::Entity::find_by_id((follower_id, followee_id))
        .one(db)
        .await?
        .is_some())
}

/// Ids of everyone `user_id` follows.
pub async fn followee_ids(db: &DatabaseConnection, user_id: i32) -> Result<Vec<i32>> {
    Ok(follow::Entity::find()
        .select_only()
        .column(follow::Column::FolloweeId)
        .filter(follow::Column::FollowerId.eq(user_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

async fn summarize(
    db: &DatabaseConnection,
    viewer: Option<&Identity>,
    user: user::Model,
) -> Result<ProfileSummary> {
    let followers_count = follow::Entity::find()
        .filter(follow::Column::FolloweeId.eq(user.id))
        .count(db)
        .await?;
    let following_count = follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user.id))
        .count(db)
        .await?;
    let is_following = match viewer {
        Some(viewer) => is_following(db, viewer.user_id, user.id).await?,
        None => false,
    };

    Ok(ProfileSummary {
        user_id: user.id,
        username: user.username,
        date_joined: user.date_joined,
        followers_count,
        following_count,
        is_following,
    })
}

/// Looks up a profile by username as seen by `viewer`.
#[instrument(skip(db))]
pub async fn profile_summary(
    db: &DatabaseConnection,
    viewer: Option<&Identity>,
    username: &str,
) -> Result<ProfileSummary> {
    let user = find_user_by_username(db, username).await?;
    summarize(db, viewer, user).await
}

/// Follows or unfollows `target_username` and returns the target's updated
/// profile as seen by `actor`.
///
/// Both directions are idempotent: the follow edge is inserted with
/// `ON CONFLICT DO NOTHING` against the composite primary key.
#[instrument(skip(db, policy), fields(actor = %actor.username))]
pub async fn apply_follow(
    db: &DatabaseConnection,
    policy: &Policy,
    actor: &Identity,
    target_username: &str,
    action: FollowAction,
) -> Result<ProfileSummary> {
    let target = find_user_by_username(db, target_username).await?;

    match action {
        FollowAction::Follow => {
            if target.id == actor.user_id && !policy.allow_self_follow {
                warn!("User '{}' attempted to follow themselves", actor.username);
                return Err(SocialError::bad_request("You cannot follow yourself"));
            }

            let edge = follow::ActiveModel {
                follower_id: Set(actor.user_id),
                followee_id: Set(target.id),
            };
            let inserted = follow::Entity::insert(edge)
                .on_conflict(
                    OnConflict::columns([follow::Column::FollowerId, follow::Column::FolloweeId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            debug!("Follow insert affected {} rows", inserted);
            info!("User '{}' follows '{}'", actor.username, target.username);
        }
        FollowAction::Unfollow => {
            let deleted = follow::Entity::delete_many()
                .filter(follow::Column::FollowerId.eq(actor.user_id))
                .filter(follow::Column::FolloweeId.eq(target.id))
                .exec(db)
                .await?;
            debug!("Unfollow removed {} rows", deleted.rows_affected);
            info!("User '{}' unfollowed '{}'", actor.username, target.username);
        }
    }

    summarize(db, Some(actor), target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_identity, setup_db};

    #[test]
    fn test_parse_action() {
        assert_eq!("follow".parse::<FollowAction>().unwrap(), FollowAction::Follow);
        assert_eq!("unfollow".parse::<FollowAction>().unwrap(), FollowAction::Unfollow);
        assert!(matches!(
            "block".parse::<FollowAction>(),
            Err(SocialError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        let bob = create_identity(&db, "bob").await;
        let policy = Policy::default();

        let first = apply_follow(&db, &policy, &bob, "alice", FollowAction::Follow)
            .await
            .unwrap();
        let second = apply_follow(&db, &policy, &bob, "alice", FollowAction::Follow)
            .await
            .unwrap();

        assert!(first.is_following);
        assert_eq!(first.followers_count, 1);
        assert_eq!(second.followers_count, 1);
        assert!(is_following(&db, bob.user_id, alice.user_id).await.unwrap());
        // Not symmetric
        assert!(!is_following(&db, alice.user_id, bob.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_unfollow_round_trip() {
        let db = setup_db().await;
        let bob = create_identity(&db, "bob").await;
        create_identity(&db, "alice").await;
        let carol = create_identity(&db, "carol").await;
        let policy = Policy::default();

        apply_follow(&db, &policy, &bob, "carol", FollowAction::Follow)
            .await
            .unwrap();
        let before = followee_ids(&db, bob.user_id).await.unwrap();
        assert_eq!(before, vec![carol.user_id]);

        apply_follow(&db, &policy, &bob, "alice", FollowAction::Follow)
            .await
            .unwrap();
        let summary = apply_follow(&db, &policy, &bob, "alice", FollowAction::Unfollow)
            .await
            .unwrap();
        assert!(!summary.is_following);
        assert_eq!(summary.followers_count, 0);

        // Unfollowing again changes nothing
        apply_follow(&db, &policy, &bob, "alice", FollowAction::Unfollow)
            .await
            .unwrap();

        assert_eq!(followee_ids(&db, bob.user_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let db = setup_db().await;
        let bob = create_identity(&db, "bob").await;

        let result =
            apply_follow(&db, &Policy::default(), &bob, "ghost", FollowAction::Follow).await;

        assert!(matches!(result, Err(SocialError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_self_follow_depends_on_policy() {
        let db = setup_db().await;
        let bob = create_identity(&db, "bob").await;

        let denied =
            apply_follow(&db, &Policy::default(), &bob, "bob", FollowAction::Follow).await;
        assert!(matches!(denied, Err(SocialError::BadRequest(_))));
        assert!(!is_following(&db, bob.user_id, bob.user_id).await.unwrap());

        let permissive = Policy {
            allow_self_follow: true,
            ..Policy::default()
        };
        let summary = apply_follow(&db, &permissive, &bob, "bob", FollowAction::Follow)
            .await
            .unwrap();
        assert!(summary.is_following);
        assert_eq!(summary.followers_count, 1);
        assert_eq!(summary.following_count, 1);
    }

    #[tokio::test]
    async fn test_profile_summary_for_anonymous_viewer() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        let bob = create_identity(&db, "bob").await;
        apply_follow(&db, &Policy::default(), &bob, "alice", FollowAction::Follow)
            .await
            .unwrap();

        let anonymous = profile_summary(&db, None, "alice").await.unwrap();
        assert_eq!(anonymous.user_id, alice.user_id);
        assert_eq!(anonymous.followers_count, 1);
        assert_eq!(anonymous.following_count, 0);
        assert!(!anonymous.is_following);

        let as_bob = profile_summary(&db, Some(&bob), "alice").await.unwrap();
        assert!(as_bob.is_following);

        let bobs = profile_summary(&db, Some(&alice), "bob").await.unwrap();
        assert_eq!(bobs.following_count, 1);
        assert!(!bobs.is_following);
    }
}
