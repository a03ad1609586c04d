//! Domain and query layer of the social network.
//!
//! Every operation takes the database connection and, where it acts on
//! behalf of someone, an explicit [`Identity`]. Nothing here reads ambient
//! request or session state.

pub mod accounts;
pub mod error;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod pagination;
pub mod posts;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;

use chrono::Duration;
use model::entities::user;

pub use error::{Result, SocialError};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
}

impl From<&user::Model> for Identity {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Deployment choices that change domain behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Whether a user may follow themselves.
    pub allow_self_follow: bool,
    /// How long a login session stays valid.
    pub session_ttl: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_self_follow: false,
            session_ttl: Duration::hours(24 * 14),
        }
    }
}
