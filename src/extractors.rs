//! Request extractors that turn the session cookie into an explicit
//! [`Identity`] for the handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use social::{Identity, sessions};
use tracing::trace;

use crate::error::ApiError;
use crate::schemas::AppState;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Authenticated user extractor. Rejects with 401 when there is no live
/// session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeCurrentUser::from_request_parts(parts, state).await? {
            MaybeCurrentUser(Some(identity)) => Ok(Self(identity)),
            MaybeCurrentUser(None) => Err(ApiError::unauthorized("Login required")),
        }
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeCurrentUser(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeCurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            trace!("No session cookie on request");
            return Ok(Self(None));
        };

        let identity = sessions::resolve_session(&state.db, cookie.value()).await?;
        Ok(Self(identity))
    }
}

/// Builds the cookie that carries a freshly issued session token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie used to remove the session cookie from the client.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
