use std::collections::HashMap;

use chrono::{DateTime, Utc};
use model::entities::{post, user};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info, instrument};

use crate::Identity;
use crate::error::{Result, SocialError};
use crate::follows::followee_ids;
use crate::likes::{counts_for_posts, liked_among};
use crate::pagination::{self, PAGE_SIZE, PageRequest};

/// Which authors a feed draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post.
    All,
    /// Posts by users the viewer follows. Requires a viewer.
    Following,
    /// Posts by a single author.
    Author(i32),
}

/// A post joined with its author and like count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: i32,
    pub author_id: i32,
    pub author_username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
}

/// One page of a feed, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    /// 1-based number of this page after clamping.
    pub number: u64,
    pub num_pages: u64,
    /// Posts across all pages.
    pub total: u64,
    /// Ids of posts on this page the viewer has liked.
    pub liked_post_ids: Vec<i32>,
}

impl FeedPage {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Reads one page of posts for `viewer`.
///
/// The requested page is clamped into the valid range rather than rejected.
/// `FeedScope::Following` without a viewer fails with `Unauthorized`.
#[instrument(skip(db))]
pub async fn fetch_feed(
    db: &DatabaseConnection,
    viewer: Option<&Identity>,
    scope: FeedScope,
    page: PageRequest,
) -> Result<FeedPage> {
    let mut query = post::Entity::find();

    match scope {
        FeedScope::All => {}
        FeedScope::Following => {
            let viewer = viewer.ok_or_else(|| {
                SocialError::Unauthorized("Log in to see posts from people you follow".to_string())
            })?;
            let followees = followee_ids(db, viewer.user_id).await?;
            debug!("User '{}' follows {} users", viewer.username, followees.len());
            query = query.filter(post::Column::UserId.is_in(followees));
        }
        FeedScope::Author(author_id) => {
            query = query.filter(post::Column::UserId.eq(author_id));
        }
    }

    let paginator = query
        .order_by_desc(post::Column::Timestamp)
        .order_by_desc(post::Column::Id)
        .paginate(db, PAGE_SIZE);

    let total = paginator.num_items().await?;
    let num_pages = pagination::num_pages(total, PAGE_SIZE);
    let number = page.resolve(num_pages);
    debug!("Resolved {:?} to page {} of {}", page, number, num_pages);

    let posts = paginator.fetch_page(number - 1).await?;
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();

    let posts = hydrate(db, posts).await?;
    let liked_post_ids = match viewer {
        Some(viewer) => liked_among(db, viewer.user_id, &post_ids).await?,
        None => Vec::new(),
    };

    info!(
        "Fetched {} posts for {:?} (page {}/{})",
        posts.len(),
        scope,
        number,
        num_pages
    );

    Ok(FeedPage {
        posts,
        number,
        num_pages,
        total,
        liked_post_ids,
    })
}

/// Attaches author usernames and like counts to a page of posts.
async fn hydrate(db: &DatabaseConnection, posts: Vec<post::Model>) -> Result<Vec<PostView>> {
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut author_ids: Vec<i32> = posts.iter().map(|p| p.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i32, String> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };
    let likes = counts_for_posts(db, &post_ids).await?;

    Ok(posts
        .into_iter()
        .map(|p| PostView {
            id: p.id,
            author_id: p.user_id,
            author_username: authors.get(&p.user_id).cloned().unwrap_or_default(),
            content: p.content,
            timestamp: p.timestamp,
            likes: likes.get(&p.id).copied().unwrap_or(0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Policy;
    use crate::follows::{FollowAction, apply_follow};
    use crate::likes::{LikeAction, apply_like};
    use crate::posts::create_post;
    use crate::testing::{create_identity, setup_db};
    use chrono::Duration;
    use sea_orm::{ActiveModelTrait, Set};

    /// Inserts `count` posts by `author`, one minute apart, oldest first.
    async fn seed_posts(db: &DatabaseConnection, author: &Identity, count: usize) -> Vec<post::Model> {
        let start = Utc::now() - Duration::hours(1);
        let mut posts = Vec::with_capacity(count);
        for i in 0..count {
            let post = post::ActiveModel {
                user_id: Set(author.user_id),
                content: Set(format!("post {i}")),
                timestamp: Set(start + Duration::minutes(i as i64)),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
            posts.push(post);
        }
        posts
    }

    #[tokio::test]
    async fn test_scenario_post_and_likes() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        let bob = create_identity(&db, "bob").await;
        let before = Utc::now();

        let post = create_post(&db, &alice, "hello").await.unwrap();

        let page = fetch_feed(&db, None, FeedScope::All, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].content, "hello");
        assert_eq!(page.posts[0].author_username, "alice");
        assert_eq!(page.posts[0].likes, 0);
        assert!(page.posts[0].timestamp >= before);

        apply_like(&db, &bob, post.id, LikeAction::Like).await.unwrap();
        let page = fetch_feed(&db, Some(&bob), FeedScope::All, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.posts[0].likes, 1);
        assert_eq!(page.liked_post_ids, vec![post.id]);

        apply_like(&db, &bob, post.id, LikeAction::Like).await.unwrap();
        let page = fetch_feed(&db, Some(&bob), FeedScope::All, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.posts[0].likes, 1);

        apply_like(&db, &bob, post.id, LikeAction::Unlike).await.unwrap();
        let page = fetch_feed(&db, Some(&bob), FeedScope::All, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.posts[0].likes, 0);
        assert!(page.liked_post_ids.is_empty());
    }

    #[tokio::test]
    async fn test_pages_are_newest_first_and_clamped() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        seed_posts(&db, &alice, 25).await;

        let first = fetch_feed(&db, None, FeedScope::All, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.num_pages, 3);
        assert_eq!(first.posts.len(), PAGE_SIZE as usize);
        assert_eq!(first.posts[0].content, "post 24");
        assert!(first.posts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = fetch_feed(&db, None, FeedScope::All, PageRequest::number(3))
            .await
            .unwrap();
        assert_eq!(last.posts.len(), 5);
        assert_eq!(last.posts[4].content, "post 0");
        assert!(!last.has_next());

        let beyond = fetch_feed(&db, None, FeedScope::All, PageRequest::number(99))
            .await
            .unwrap();
        assert_eq!(beyond.number, 3);
        assert_eq!(beyond.posts, last.posts);

        let below = fetch_feed(&db, None, FeedScope::All, PageRequest::number(0))
            .await
            .unwrap();
        assert_eq!(below.number, 1);

        let garbage = fetch_feed(&db, None, FeedScope::All, PageRequest::parse(Some("two")))
            .await
            .unwrap();
        assert_eq!(garbage.number, 1);
    }

    #[tokio::test]
    async fn test_empty_feed_has_one_page() {
        let db = setup_db().await;

        let page = fetch_feed(&db, None, FeedScope::All, PageRequest::number(5))
            .await
            .unwrap();

        assert!(page.posts.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_following_feed_only_shows_followed_authors() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        let bob = create_identity(&db, "bob").await;
        let carol = create_identity(&db, "carol").await;

        create_post(&db, &alice, "from alice").await.unwrap();
        create_post(&db, &carol, "from carol").await.unwrap();
        create_post(&db, &bob, "from bob").await.unwrap();

        let empty = fetch_feed(&db, Some(&bob), FeedScope::Following, PageRequest::first())
            .await
            .unwrap();
        assert!(empty.posts.is_empty());

        apply_follow(&db, &Policy::default(), &bob, "alice", FollowAction::Follow)
            .await
            .unwrap();

        let page = fetch_feed(&db, Some(&bob), FeedScope::Following, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].content, "from alice");
        assert_eq!(page.posts[0].author_id, alice.user_id);
    }

    #[tokio::test]
    async fn test_following_feed_requires_viewer() {
        let db = setup_db().await;

        let result = fetch_feed(&db, None, FeedScope::Following, PageRequest::first()).await;

        assert!(matches!(result, Err(SocialError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_author_feed_and_liked_ids_limited_to_page() {
        let db = setup_db().await;
        let alice = create_identity(&db, "alice").await;
        let bob = create_identity(&db, "bob").await;
        let posts = seed_posts(&db, &alice, 12).await;
        create_post(&db, &bob, "not alice").await.unwrap();

        // Oldest post lands on page 2, newest on page 1
        apply_like(&db, &bob, posts[0].id, LikeAction::Like).await.unwrap();
        apply_like(&db, &bob, posts[11].id, LikeAction::Like).await.unwrap();

        let page_one = fetch_feed(
            &db,
            Some(&bob),
            FeedScope::Author(alice.user_id),
            PageRequest::first(),
        )
        .await
        .unwrap();
        assert_eq!(page_one.total, 12);
        assert!(page_one.posts.iter().all(|p| p.author_id == alice.user_id));
        assert_eq!(page_one.liked_post_ids, vec![posts[11].id]);

        let page_two = fetch_feed(
            &db,
            Some(&bob),
            FeedScope::Author(alice.user_id),
            PageRequest::number(2),
        )
        .await
        .unwrap();
        assert_eq!(page_two.posts.len(), 2);
        assert_eq!(page_two.liked_post_ids, vec![posts[0].id]);
    }
}
