use std::fmt;
use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument, warn};
use validator::{Validate, ValidationError};

use crate::error::{Result, SocialError, is_unique_violation};

const INVALID_CREDENTIALS: &str = "Invalid username and/or password.";
const USERNAME_TAKEN: &str = "Username already taken.";

/// Input of the registration form.
#[derive(Clone, Validate)]
pub struct Registration {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
    pub confirmation: String,
}

// Passwords stay out of logs and spans.
impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Letters, digits and `@ . + - _` only.
fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_characters");
        error.message =
            Some("Username may only contain letters, digits and @/./+/-/_ characters.".into());
        Err(error)
    }
}

/// Creates a new account.
///
/// Fails with `BadRequest` when the password and confirmation differ or a
/// field is invalid, and with `Conflict` when the username is taken. The
/// unique index on `users.username` backs the up-front check for the case
/// where two registrations race.
#[instrument(skip(db))]
pub async fn register(db: &DatabaseConnection, registration: Registration) -> Result<user::Model> {
    if registration.password != registration.confirmation {
        debug!("Password confirmation mismatch for '{}'", registration.username);
        return Err(SocialError::bad_request("Passwords must match."));
    }

    registration
        .validate()
        .map_err(|e| SocialError::BadRequest(first_validation_message(&e)))?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(registration.username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        warn!("Username '{}' already taken", registration.username);
        return Err(SocialError::Conflict(USERNAME_TAKEN.to_string()));
    }

    let password_hash = hash_password(&registration.password)?;

    let new_user = user::ActiveModel {
        username: Set(registration.username.clone()),
        email: Set(registration.email.clone()),
        password_hash: Set(password_hash),
        date_joined: Set(Utc::now()),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(user) => {
            info!("Registered user '{}' with ID {}", user.username, user.id);
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => {
            warn!("Username '{}' taken concurrently", registration.username);
            Err(SocialError::Conflict(USERNAME_TAKEN.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Checks a username/password pair.
///
/// Both an unknown username and a wrong password produce the same
/// `Unauthorized` message.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let Some(user) = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
    else {
        debug!("Login attempt for unknown username '{}'", username);
        // Unknown usernames cost one argon2 verification, like known ones.
        verify_password(password, unknown_user_hash()?)?;
        return Err(SocialError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, &user.password_hash)? {
        debug!("Wrong password for '{}'", username);
        return Err(SocialError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    info!("User '{}' authenticated", user.username);
    Ok(user)
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

// Minimum cost parameters keep the test suite fast.
#[cfg(test)]
fn hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};
    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
        .expect("minimum argon2 params are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(hasher().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Hash checked against on the unknown-username path of [`authenticate`].
fn unknown_user_hash() -> Result<&'static str> {
    static HASH: OnceLock<String> = OnceLock::new();
    if let Some(hash) = HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("unknown-user-placeholder")?;
    Ok(HASH.get_or_init(|| hash))
}

/// Verify a password against a stored PHC hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)?;
    Ok(hasher()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
