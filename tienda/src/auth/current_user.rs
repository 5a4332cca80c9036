//! Request extractors that resolve the session cookie to a principal.
//!
//! Three levels, matching what pages need:
//! - [`OptionalUser`]: anonymous is fine (home, login, register)
//! - [`CurrentUser`]: any signed-in user (profile)
//! - [`RequireAdmin`]: admin role (user management, catalog writes)
//!
//! Rejections are page responses, not API statuses: anonymous callers get
//! redirected to the login form, signed-in users lacking the role get sent
//! home.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument};

use crate::{
    api::{
        flash::{self, Flash},
        models::users::{Principal, Role},
    },
    auth::{guard, service},
    config::Config,
    db::errors::DbError,
    errors::Error,
    AppState,
};

/// Pull the session token out of the cookie header, if present.
fn session_token_from_parts(parts: &Parts, config: &Config) -> Option<String> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Resolve the request's principal, treating any token problem as anonymous.
async fn resolve_principal(parts: &Parts, state: &AppState) -> Result<Option<Principal>, Error> {
    let Some(token) = session_token_from_parts(parts, &state.config) else {
        return Ok(None);
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    service::resolve_session(&mut conn, &token, &state.config).await
}

/// The request's principal if a valid session is present, `None` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state).await?;
        Ok(OptionalUser(principal))
    }
}

/// A signed-in principal. Anonymous requests are redirected to the login form.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state).await.map_err(IntoResponse::into_response)?;

        match guard::require(principal.as_ref(), Role::User) {
            Ok(vetted) => Ok(CurrentUser(vetted.clone())),
            Err(e) => {
                debug!("redirecting anonymous request to login");
                Err(flash::redirect_with_flash("/login", Flash::error(e.user_message())))
            }
        }
    }
}

/// An admin principal. Anonymous requests go to the login form; signed-in
/// non-admins go back to the home page.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Response;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state).await.map_err(IntoResponse::into_response)?;

        match guard::require(principal.as_ref(), Role::Admin) {
            Ok(vetted) => Ok(RequireAdmin(vetted.clone())),
            Err(Error::Unauthenticated) => {
                debug!("redirecting anonymous request to login");
                Err(flash::redirect_with_flash(
                    "/login",
                    Flash::error(Error::Unauthenticated.user_message()),
                ))
            }
            Err(e) => {
                debug!(username = ?principal.as_ref().map(|p| &p.username), "blocking non-admin request: {e}");
                Err(Redirect::to("/").into_response())
            }
        }
    }
}
