use common::{FeedPageDto, PostDto, ProfileDto, UserDto};
use model::entities::{post, user};
use social::Identity;
use social::feed::{FeedPage, PostView};
use social::follows::ProfileSummary;

/// Converts a domain feed page into its transport form, marking each post
/// the viewer liked.
pub fn feed_page_to_dto(page: FeedPage) -> FeedPageDto {
    let has_previous = page.has_previous();
    let has_next = page.has_next();
    let liked = &page.liked_post_ids;

    let posts = page
        .posts
        .into_iter()
        .map(|view| {
            let is_liked = liked.contains(&view.id);
            post_view_to_dto(view, is_liked)
        })
        .collect();

    FeedPageDto {
        posts,
        page: page.number,
        num_pages: page.num_pages,
        total: page.total,
        has_previous,
        has_next,
        liked_post_ids: page.liked_post_ids,
    }
}

pub fn post_view_to_dto(view: PostView, liked: bool) -> PostDto {
    PostDto {
        id: view.id,
        author_id: view.author_id,
        author_username: view.author_username,
        content: view.content,
        timestamp: view.timestamp,
        likes: view.likes,
        liked,
    }
}

/// A post that was just created has no likes yet.
pub fn new_post_to_dto(post: post::Model, author: &Identity) -> PostDto {
    PostDto {
        id: post.id,
        author_id: post.user_id,
        author_username: author.username.clone(),
        content: post.content,
        timestamp: post.timestamp,
        likes: 0,
        liked: false,
    }
}

pub fn profile_to_dto(
    summary: ProfileSummary,
    posts: FeedPage,
    viewer: Option<&Identity>,
) -> ProfileDto {
    let is_self = viewer.is_some_and(|v| v.user_id == summary.user_id);
    ProfileDto {
        id: summary.user_id,
        username: summary.username,
        date_joined: summary.date_joined,
        followers_count: summary.followers_count,
        following_count: summary.following_count,
        is_following: summary.is_following,
        is_self,
        posts: feed_page_to_dto(posts),
    }
}

pub fn user_to_dto(user: &user::Model) -> UserDto {
    UserDto {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        date_joined: user.date_joined,
    }
}
