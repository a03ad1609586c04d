use crate::error::ApiError;
use crate::extractors::{MaybeCurrentUser, SESSION_COOKIE, removal_cookie, session_cookie};
use crate::helpers::converters::user_to_dto;
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::Json,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use common::{ApiResponse, LoginForm, RegisterForm, SessionDto, SessionResponse, UserResponse};
use social::accounts::{self, Registration};
use social::{Identity, sessions};
use tracing::{debug, info, instrument, trace};

fn session_dto(identity: Option<Identity>) -> SessionDto {
    SessionDto {
        authenticated: identity.is_some(),
        username: identity.map(|identity| identity.username),
    }
}

/// Current session state, shown before logging in
#[utoipa::path(
    get,
    path = "/login",
    tag = "accounts",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    )
)]
#[instrument]
pub async fn login_page(MaybeCurrentUser(viewer): MaybeCurrentUser) -> Json<SessionResponse> {
    Json(ApiResponse::ok(session_dto(viewer), "Log in with username and password"))
}

/// Log in and receive a session cookie
#[utoipa::path(
    post,
    path = "/login",
    tag = "accounts",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in; `sessionid` cookie set", body = UserResponse),
        (status = 400, description = "Malformed form", body = ErrorResponse),
        (status = 401, description = "Invalid username and/or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    trace!("Entering login function");
    let Form(form) = form?;

    let user = accounts::authenticate(&state.db, &form.username, &form.password).await?;
    let session = sessions::open_session(&state.db, &user, state.policy.session_ttl).await?;

    info!("User '{}' logged in", user.username);
    Ok((
        jar.add(session_cookie(session.token, state.secure_cookies)),
        Json(ApiResponse::ok(user_to_dto(&user), "Logged in")),
    ))
}

/// Log out; always succeeds
#[utoipa::path(
    post,
    path = "/logout",
    tag = "accounts",
    responses(
        (status = 200, description = "Logged out; `sessionid` cookie removed", body = SessionResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    trace!("Entering logout function");

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        sessions::close_session(&state.db, cookie.value()).await?;
    } else {
        debug!("Logout without a session cookie");
    }

    Ok((
        jar.remove(removal_cookie()),
        Json(ApiResponse::ok(session_dto(None), "Logged out")),
    ))
}

/// Current session state, shown before registering
#[utoipa::path(
    get,
    path = "/register",
    tag = "accounts",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    )
)]
#[instrument]
pub async fn register_page(MaybeCurrentUser(viewer): MaybeCurrentUser) -> Json<SessionResponse> {
    Json(ApiResponse::ok(session_dto(viewer), "Create an account"))
}

/// Create an account and log in
#[utoipa::path(
    post,
    path = "/register",
    tag = "accounts",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Account created; `sessionid` cookie set", body = UserResponse),
        (status = 400, description = "Passwords differ or a field is invalid", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, form))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    trace!("Entering register function");
    let Form(form) = form?;

    let email = Some(form.email.trim().to_string()).filter(|email| !email.is_empty());
    let registration = Registration {
        username: form.username,
        email,
        password: form.password,
        confirmation: form.confirmation,
    };

    let user = accounts::register(&state.db, registration).await?;
    let session = sessions::open_session(&state.db, &user, state.policy.session_ttl).await?;

    info!("Registered user '{}'", user.username);
    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(session.token, state.secure_cookies)),
        Json(ApiResponse::ok(user_to_dto(&user), "Account created")),
    ))
}
