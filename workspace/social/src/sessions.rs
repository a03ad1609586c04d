use chrono::{Duration, Utc};
use model::entities::{session, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::Identity;
use crate::error::Result;

/// Starts a login session for `user` and returns it. The token is what the
/// HTTP layer stores in the session cookie.
#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn open_session(
    db: &DatabaseConnection,
    user: &user::Model,
    ttl: Duration,
) -> Result<session::Model> {
    let now = Utc::now();
    let session = session::ActiveModel {
        token: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(user.id),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(db)
    .await?;

    info!("Opened session for user '{}'", user.username);
    Ok(session)
}

/// Looks up the identity behind a session token.
///
/// Unknown tokens resolve to `None`. Expired sessions are deleted and also
/// resolve to `None`.
#[instrument(skip_all)]
pub async fn resolve_session(db: &DatabaseConnection, token: &str) -> Result<Option<Identity>> {
    let Some((session, user)) = session::Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?
    else {
        debug!("Unknown session token");
        return Ok(None);
    };

    if session.is_expired(Utc::now()) {
        debug!("Session for user {} expired at {}", session.user_id, session.expires_at);
        session::Entity::delete_by_id(session.token).exec(db).await?;
        return Ok(None);
    }

    Ok(user.as_ref().map(Identity::from))
}

/// Ends a session. Closing an unknown token is not an error.
#[instrument(skip_all)]
pub async fn close_session(db: &DatabaseConnection, token: &str) -> Result<()> {
    let result = session::Entity::delete_by_id(token.to_string())
        .exec(db)
        .await?;
    debug!("Closed session, rows affected: {}", result.rows_affected);
    Ok(())
}

/// Deletes every session that has already expired.
#[instrument(skip(db))]
pub async fn purge_expired_sessions(db: &DatabaseConnection) -> Result<u64> {
    let result = session::Entity::delete_many()
        .filter(session::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        info!("Purged {} expired sessions", result.rows_affected);
    }
    Ok(result.rows_affected)
}
