//! Admin product catalog: listing, create, edit, and delete.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    Form,
};
use minijinja::context;
use tracing::{info, instrument};

use crate::{
    api::{
        flash::{self, Flash},
        handlers::render_page,
        models::products::{ProductForm, ProductRow},
    },
    auth::current_user::RequireAdmin,
    db::{
        errors::DbError,
        handlers::{products::ProductFilter, Products, Repository},
    },
    errors::Error,
    types::ProductId,
    AppState,
};

/// Hard cap on the catalog listing. The admin panel has no pager, so this is
/// the page size.
const LIST_LIMIT: i64 = 500;

/// A catalog path id. Malformed ids get the same NotFound as absent ones so
/// the URL shape leaks nothing.
fn parse_product_id(raw: &str) -> Result<ProductId, Error> {
    raw.parse().map_err(|_| Error::NotFound {
        resource: "Product".to_string(),
        id: raw.to_string(),
    })
}

/// GET `/productos` - the product catalog, oldest first.
pub async fn list_products(State(state): State<AppState>, headers: HeaderMap, RequireAdmin(user): RequireAdmin) -> Result<Response, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let products: Vec<ProductRow> = Products::new(&mut conn)
        .list(&ProductFilter::new(0, LIST_LIMIT))
        .await?
        .into_iter()
        .map(ProductRow::from)
        .collect();

    render_page(&state, &headers, "productos.html", context! { user, products })
}

/// GET `/add_product` - empty product form.
pub async fn add_product_page(State(state): State<AppState>, headers: HeaderMap, RequireAdmin(user): RequireAdmin) -> Result<Response, Error> {
    render_page(&state, &headers, "add_product.html", context! { user })
}

/// POST `/add_product` - create a product from the form.
#[instrument(skip_all)]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Result<Response, Error> {
    let request = match form.into_create_request() {
        Ok(request) => request,
        Err(e @ Error::Validation { .. }) => {
            return Ok(flash::redirect_with_flash("/add_product", Flash::error(e.user_message())));
        }
        Err(e) => return Err(e),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let created = Products::new(&mut conn).create(&request).await?;

    info!(admin = %admin.username, product_id = %created.id, "product created");
    Ok(flash::redirect_with_flash("/productos", Flash::success("Product added")))
}

/// GET `/edit_product/{id}` - form pre-filled with the current record.
pub async fn edit_product_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let result = async {
        let id = parse_product_id(&id)?;
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Products::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
            resource: "Product".to_string(),
            id: id.to_string(),
        })
    }
    .await;

    match result {
        Ok(product) => render_page(
            &state,
            &headers,
            "edit_product.html",
            context! { user, product => ProductRow::from(product) },
        ),
        Err(e @ Error::NotFound { .. }) => Ok(flash::redirect_with_flash("/productos", Flash::error(e.user_message()))),
        Err(e) => Err(e),
    }
}

/// POST `/edit_product/{id}` - overwrite the record with the form contents.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response, Error> {
    let result = async {
        let product_id = parse_product_id(&id)?;
        let request = form.into_update_request()?;

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Products::new(&mut conn)
            .update(product_id, &request)
            .await
            .map_err(|e| match e {
                DbError::NotFound => Error::NotFound {
                    resource: "Product".to_string(),
                    id: product_id.to_string(),
                },
                other => Error::from(other),
            })
    }
    .await;

    match result {
        Ok(updated) => {
            info!(admin = %admin.username, product_id = %updated.id, "product updated");
            Ok(flash::redirect_with_flash("/productos", Flash::success("Product updated")))
        }
        Err(e @ Error::NotFound { .. }) => Ok(flash::redirect_with_flash("/productos", Flash::error(e.user_message()))),
        Err(e @ Error::Validation { .. }) => Ok(flash::redirect_with_flash(
            &format!("/edit_product/{id}"),
            Flash::error(e.user_message()),
        )),
        Err(e) => Err(e),
    }
}

/// POST `/delete_product/{id}` - remove the record. An absent or malformed id
/// surfaces as a NotFound flash rather than a silent no-op.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let result = async {
        let product_id = parse_product_id(&id)?;
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;

        if Products::new(&mut conn).delete(product_id).await? {
            Ok(product_id)
        } else {
            Err(Error::NotFound {
                resource: "Product".to_string(),
                id: product_id.to_string(),
            })
        }
    }
    .await;

    match result {
        Ok(product_id) => {
            info!(admin = %admin.username, product_id = %product_id, "product deleted");
            Ok(flash::redirect_with_flash("/productos", Flash::success("Product deleted")))
        }
        Err(e @ Error::NotFound { .. }) => Ok(flash::redirect_with_flash("/productos", Flash::error(e.user_message()))),
        Err(e) => Err(e),
    }
}
