use migration::{Migrator, MigratorTrait};
use model::entities::user;
use sea_orm::{Database, DatabaseConnection};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::Identity;
use crate::accounts::{Registration, register};

/// Send test logs to STDERR at the level named by `RUST_LOG` (WARN by
/// default). The subscriber is removed when the guard drops.
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

/// Create a migrated in-memory SQLite database.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Register a user whose password is `"{username}-password"`.
pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    let password = format!("{username}-password");
    register(
        db,
        Registration {
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            password: password.clone(),
            confirmation: password,
        },
    )
    .await
    .expect("Failed to register test user")
}

pub async fn create_identity(db: &DatabaseConnection, username: &str) -> Identity {
    Identity::from(&create_user(db, username).await)
}
