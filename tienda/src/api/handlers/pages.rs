//! Plain pages: home, profile, and the admin landing page.

use axum::{extract::State, http::HeaderMap, response::Response};
use minijinja::context;

use crate::{
    api::handlers::render_page,
    auth::current_user::{CurrentUser, OptionalUser, RequireAdmin},
    errors::Error,
    AppState,
};

/// GET `/` - public landing page, aware of who is signed in.
pub async fn home(State(state): State<AppState>, headers: HeaderMap, OptionalUser(user): OptionalUser) -> Result<Response, Error> {
    render_page(&state, &headers, "home.html", context! { user })
}

/// GET `/profile` - the signed-in user's own details.
pub async fn profile(State(state): State<AppState>, headers: HeaderMap, CurrentUser(user): CurrentUser) -> Result<Response, Error> {
    render_page(&state, &headers, "profile.html", context! { user })
}

/// GET `/admin` - admin landing page linking to user and catalog management.
pub async fn admin(State(state): State<AppState>, headers: HeaderMap, RequireAdmin(user): RequireAdmin) -> Result<Response, Error> {
    render_page(&state, &headers, "admin.html", context! { user })
}
