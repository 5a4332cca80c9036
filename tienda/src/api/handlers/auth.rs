//! Login, registration, and logout.
//!
//! All three speak browser: recoverable failures become a flash plus a
//! redirect back to the form, successes redirect onward with the session
//! cookie set or cleared.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use tracing::{info, instrument};

use crate::{
    api::{
        flash::{self, Flash},
        handlers::render_page,
        models::users::{LoginForm, RegisterForm},
    },
    auth::{
        current_user::{CurrentUser, OptionalUser},
        service, session,
    },
    config::Config,
    db::errors::DbError,
    errors::Error,
    AppState,
};

/// Session cookie for a freshly signed token.
///
/// `Secure` is a bare attribute under RFC 6265; writing `Secure=false` would
/// still flag the cookie and browsers on plain HTTP would drop it. So the
/// attribute is only emitted when the config enables it.
fn create_session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.auth.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, secure, session_config.cookie_same_site, session_config.timeout.as_secs()
    )
}

/// Session cookie that expires immediately, signing the browser out.
fn clear_session_cookie(config: &Config) -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", config.auth.session.cookie_name)
}

/// GET `/login` - login form. Signed-in users are sent home.
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap, OptionalUser(user): OptionalUser) -> Result<Response, Error> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render_page(&state, &headers, "login.html", context! {})
}

/// POST `/login` - check credentials and start a session.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Form(form): Form<LoginForm>,
) -> Result<Response, Error> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    match service::authenticate(&mut conn, &form.username, &form.password).await {
        Ok(principal) => {
            info!(username = %principal.username, "user logged in");
            let token = session::create_session_token(principal.id, &state.config)?;
            let cookie = create_session_cookie(&token, &state.config);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Err(e @ (Error::Validation { .. } | Error::InvalidCredentials)) => {
            Ok(flash::redirect_with_flash("/login", Flash::error(e.user_message())))
        }
        Err(e) => Err(e),
    }
}

/// GET `/register` - registration form. Signed-in users are sent home.
pub async fn register_page(State(state): State<AppState>, headers: HeaderMap, OptionalUser(user): OptionalUser) -> Result<Response, Error> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render_page(&state, &headers, "register.html", context! {})
}

/// POST `/register` - create an account with the default role, then send the
/// new user to the login form.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, Error> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    match service::register(&mut conn, &form.name, &form.username, &form.password, &state.config).await {
        Ok(principal) => {
            info!(username = %principal.username, "user registered");
            Ok(flash::redirect_with_flash(
                "/login",
                Flash::success("Account created, please log in"),
            ))
        }
        Err(e @ (Error::Validation { .. } | Error::DuplicateUsername)) => {
            Ok(flash::redirect_with_flash("/register", Flash::error(e.user_message())))
        }
        Err(e) => Err(e),
    }
}

/// GET `/logout` - expire the session cookie and return to the login form.
pub async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Response {
    info!(username = %user.username, "user logged out");
    let cookie = clear_session_cookie(&state.config);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/login")).into_response()
}
