use crate::router::create_router;
use crate::schemas::AppState;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::RegisterForm;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use social::Policy;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    AppState {
        db: setup_test_db().await,
        policy: Policy::default(),
        secure_cookies: false,
    }
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level comes from `RUST_LOG`, defaulting to WARN. The returned
/// guard removes the subscriber when dropped.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing
pub async fn setup_test_app() -> Router {
    create_router(setup_test_app_state().await)
}

/// Create a test server around a fresh app
pub async fn setup_test_server() -> TestServer {
    TestServer::new(setup_test_app().await).expect("Failed to create test server")
}

/// Register `username` (password `"{username}-password"`) and return the
/// session token from the `sessionid` cookie.
pub async fn register_user(server: &TestServer, username: &str) -> String {
    let password = format!("{username}-password");
    let form = RegisterForm {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: password.clone(),
        confirmation: password,
    };

    let response = server.post("/register").form(&form).await;
    response.assert_status(StatusCode::CREATED);
    response.cookie("sessionid").value().to_string()
}

/// `Cookie` header carrying a session token.
pub fn session_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("cookie"),
        HeaderValue::from_str(&format!("sessionid={token}")).expect("valid cookie header"),
    )
}
