//! Authentication operations: registration, credential checks, and session
//! resolution.
//!
//! All functions take a `&mut PgConnection` so callers decide pooling and
//! transaction scope. Handlers acquire from the pool; tests pass the
//! connection `sqlx::test` hands them.

use sqlx::PgConnection;
use tracing::{debug, instrument, warn};

use crate::{
    api::models::users::{Principal, Role},
    auth::{password, session},
    config::Config,
    db::{errors::DbError, handlers::users::Users, models::users::UserCreateDBRequest},
    errors::Error,
};

fn require_fields(fields: &[(&str, &str)]) -> Result<(), Error> {
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(Error::Validation {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Register a new account with the default `user` role.
///
/// Duplicates are caught twice: an existence pre-check for the common case,
/// and the unique index on `users.username` for the race where two
/// registrations pass the pre-check together - the losing insert surfaces as
/// [`Error::DuplicateUsername`], so both can never succeed.
#[instrument(skip_all, fields(username = %username))]
pub async fn register(
    conn: &mut PgConnection,
    name: &str,
    username: &str,
    plaintext: &str,
    config: &Config,
) -> Result<Principal, Error> {
    create_user_with_role(conn, name, username, plaintext, Role::User, config).await
}

/// Create an account with an explicit role. Registration uses this with
/// [`Role::User`]; the admin user form is the only caller that picks the role.
#[instrument(skip_all, fields(username = %username, role = role.as_str()))]
pub async fn create_user_with_role(
    conn: &mut PgConnection,
    name: &str,
    username: &str,
    plaintext: &str,
    role: Role,
    config: &Config,
) -> Result<Principal, Error> {
    require_fields(&[("name", name), ("username", username), ("password", plaintext)])?;

    // Friendly pre-check; the unique index below is what actually settles races
    if Users::new(&mut *conn).get_by_username(username).await?.is_some() {
        return Err(Error::DuplicateUsername);
    }

    // Argon2 is CPU-bound, keep it off the async workers
    let password_hash = tokio::task::spawn_blocking({
        let plaintext = plaintext.to_string();
        let params = config.auth.password.params();
        move || password::hash_string_with_params(&plaintext, Some(params))
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let request = UserCreateDBRequest {
        name: name.trim().to_string(),
        username: username.to_string(),
        password_hash,
        role,
    };

    let created = Users::new(conn).create(&request).await.map_err(|e| match &e {
        DbError::UniqueViolation { .. } if e.is_username_conflict() => Error::DuplicateUsername,
        _ => Error::from(e),
    })?;

    debug!(user_id = %created.id, "user created");
    Ok(Principal::from(created))
}

/// Check a username/password pair.
///
/// An unknown username and a wrong password both come back as
/// [`Error::InvalidCredentials`] - the response never says which half failed.
#[instrument(skip_all, fields(username = %username))]
pub async fn authenticate(conn: &mut PgConnection, username: &str, plaintext: &str) -> Result<Principal, Error> {
    require_fields(&[("username", username), ("password", plaintext)])?;

    let Some(user) = Users::new(conn).get_by_username(username).await? else {
        warn!("login attempt for unknown username");
        return Err(Error::InvalidCredentials);
    };

    let valid = tokio::task::spawn_blocking({
        let plaintext = plaintext.to_string();
        let hash = user.password_hash.clone();
        move || password::verify_string(&plaintext, &hash)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password verification task: {e}"),
    })?;

    if !valid {
        warn!(user_id = %user.id, "login attempt with wrong password");
        return Err(Error::InvalidCredentials);
    }

    Ok(Principal::from(user))
}

/// Resolve a session token to its current principal.
///
/// Returns `None` for anything that should degrade to anonymous: a missing,
/// expired, or tampered token, or a token whose user no longer exists. Role
/// and profile fields come from the database row, not the token, so changes
/// take effect on the next request.
pub async fn resolve_session(conn: &mut PgConnection, token: &str, config: &Config) -> Result<Option<Principal>, Error> {
    let user_id = match session::verify_session_token(token, config) {
        Ok(user_id) => user_id,
        Err(Error::Unauthenticated) => return Ok(None),
        Err(e) => return Err(e),
    };

    let user = Users::new(conn).get_by_id(user_id).await?;
    Ok(user.map(Principal::from))
}
