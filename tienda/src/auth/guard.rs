//! Role-based access checks.

use crate::api::models::users::{Principal, Role};
use crate::errors::Error;

/// Check that a request carries a principal with at least `min_role`,
/// returning the vetted principal.
///
/// Anonymous callers fail with [`Error::Unauthenticated`] before any role
/// comparison happens, so "who are you" and "are you allowed" stay distinct
/// in logs and in what the user sees.
pub fn require<'a>(principal: Option<&'a Principal>, min_role: Role) -> Result<&'a Principal, Error> {
    let principal = principal.ok_or(Error::Unauthenticated)?;

    if principal.role >= min_role {
        Ok(principal)
    } else {
        Err(Error::Forbidden {
            resource: format!("requires {} role", min_role.as_str()),
        })
    }
}
