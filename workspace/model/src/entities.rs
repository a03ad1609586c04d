//! Root for all SeaORM entity modules of the social network.
//! Cascades and uniqueness are declared here and mirrored by the
//! migrations, so the store itself enforces ownership and one-like-per-user.

pub mod follow;
pub mod like;
pub mod post;
pub mod session;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::follow::Entity as Follow;
    pub use super::like::Entity as Like;
    pub use super::post::Entity as Post;
    pub use super::session::Entity as Session;
    pub use super::user::Entity as User;
}
