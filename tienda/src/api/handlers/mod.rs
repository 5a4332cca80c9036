//! Page handlers.

pub mod auth;
pub mod pages;
pub mod products;
pub mod users;

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::{api::flash, errors::Error, AppState};

/// All application routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/profile", get(pages::profile))
        .route("/logout", get(auth::logout))
        .route("/admin", get(pages::admin))
        .route("/usuarios", get(users::list_users))
        .route("/add_user", get(users::add_user_page).post(users::add_user))
        .route("/productos", get(products::list_products))
        .route("/add_product", get(products::add_product_page).post(products::add_product))
        .route("/edit_product/{id}", get(products::edit_product_page).post(products::edit_product))
        .route("/delete_product/{id}", post(products::delete_product))
}

/// Render a template with any queued flash message folded into its context.
///
/// Consuming the flash clears its cookie in the same response, so the message
/// shows exactly once.
pub(crate) fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    name: &str,
    ctx: minijinja::value::Value,
) -> Result<Response, Error> {
    let flash = flash::from_headers(headers);

    let template = state.templates.get_template(name).map_err(|e| Error::Internal {
        operation: format!("load template {name}: {e}"),
    })?;

    let html = template
        .render(minijinja::context! { flash, ..ctx })
        .map_err(|e| Error::Internal {
            operation: format!("render template {name}: {e}"),
        })?;

    let mut response = Html(html).into_response();
    if flash.is_some() {
        let clear = HeaderValue::from_str(&flash::clear_cookie()).map_err(|e| Error::Internal {
            operation: format!("build flash clear header: {e}"),
        })?;
        response.headers_mut().insert(header::SET_COOKIE, clear);
    }

    Ok(response)
}
