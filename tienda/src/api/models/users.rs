//! API-facing models for users and the session principal.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Coarse permission level. Ordering matters: `User < Admin`, so a role
/// requirement is satisfied by any role that compares greater-or-equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated identity attached to a request.
///
/// A read-only projection of a user row, rebuilt from the session cookie on
/// every request by [`crate::auth::service::resolve_session`]. Never persisted;
/// it lives for the request and is dropped with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub role: Role,
}

impl From<UserDBResponse> for Principal {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            username: db.username,
            role: db.role,
        }
    }
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Login form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Self-registration form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Admin "add user" form payload - the only place a caller picks the role.
#[derive(Debug, Clone, Deserialize)]
pub struct AddUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// Row data handed to the user-listing template.
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub name: String,
    pub username: String,
    pub role: &'static str,
}

impl From<UserDBResponse> for UserRow {
    fn from(db: UserDBResponse) -> Self {
        Self {
            name: db.name,
            username: db.username,
            role: db.role.as_str(),
        }
    }
}
