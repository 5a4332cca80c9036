//! Admin user management: the account listing and the add-user form.

use axum::{extract::State, http::HeaderMap, response::Response, Form};
use minijinja::context;
use tracing::{info, instrument};

use crate::{
    api::{
        flash::{self, Flash},
        handlers::render_page,
        models::users::{AddUserForm, Role, UserRow},
    },
    auth::{current_user::RequireAdmin, service},
    db::{errors::DbError, handlers::users::Users},
    errors::Error,
    AppState,
};

/// GET `/usuarios` - all regular accounts, oldest first.
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap, RequireAdmin(user): RequireAdmin) -> Result<Response, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let users: Vec<UserRow> = Users::new(&mut conn)
        .list_by_role(Role::User)
        .await?
        .into_iter()
        .map(UserRow::from)
        .collect();

    render_page(&state, &headers, "usuarios.html", context! { user, users })
}

/// GET `/add_user` - form for creating an account with an explicit role.
pub async fn add_user_page(State(state): State<AppState>, headers: HeaderMap, RequireAdmin(user): RequireAdmin) -> Result<Response, Error> {
    render_page(&state, &headers, "add_user.html", context! { user })
}

/// POST `/add_user` - create an account with the role the admin picked.
#[instrument(skip_all)]
pub async fn add_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<AddUserForm>,
) -> Result<Response, Error> {
    let result = async {
        let role: Role = form.role.parse().map_err(|_| Error::Validation {
            field: "role".to_string(),
        })?;

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        service::create_user_with_role(&mut conn, &form.name, &form.username, &form.password, role, &state.config).await
    }
    .await;

    match result {
        Ok(created) => {
            info!(admin = %admin.username, username = %created.username, role = created.role.as_str(), "admin created user");
            Ok(flash::redirect_with_flash("/usuarios", Flash::success("User created")))
        }
        Err(e @ (Error::Validation { .. } | Error::DuplicateUsername)) => {
            Ok(flash::redirect_with_flash("/add_user", Flash::error(e.user_message())))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::tests::{cookie_pair, login_as, seed_user, test_server};
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_usuarios_requires_login(pool: PgPool) {
        let server = test_server(pool);

        let response = server.get("/usuarios").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/login");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_usuarios_blocks_non_admin(pool: PgPool) {
        seed_user(&pool, "ana", "pw", Role::User).await;
        let server = test_server(pool);
        let cookie = login_as(&server, "ana", "pw").await;

        let response = server.get("/usuarios").add_header("cookie", cookie.as_str()).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_usuarios_lists_regular_accounts(pool: PgPool) {
        seed_user(&pool, "boss", "pw", Role::Admin).await;
        seed_user(&pool, "ana", "pw", Role::User).await;
        seed_user(&pool, "bob", "pw", Role::User).await;
        let server = test_server(pool);
        let cookie = login_as(&server, "boss", "pw").await;

        let response = server.get("/usuarios").add_header("cookie", cookie.as_str()).await;
        response.assert_status_ok();

        let body = response.text();
        assert!(body.contains("ana"));
        assert!(body.contains("bob"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_user_with_admin_role(pool: PgPool) {
        seed_user(&pool, "boss", "pw", Role::Admin).await;
        let server = test_server(pool.clone());
        let cookie = login_as(&server, "boss", "pw").await;

        let response = server
            .post("/add_user")
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "Second Boss"), ("username", "boss2"), ("password", "pw2"), ("role", "admin")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/usuarios");

        let mut conn = pool.acquire().await.unwrap();
        let created = Users::new(&mut conn).get_by_username("boss2").await.unwrap().unwrap();
        assert_eq!(created.role, Role::Admin);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_user_duplicate_flashes_back_to_form(pool: PgPool) {
        seed_user(&pool, "boss", "pw", Role::Admin).await;
        seed_user(&pool, "ana", "pw", Role::User).await;
        let server = test_server(pool);
        let cookie = login_as(&server, "boss", "pw").await;

        let response = server
            .post("/add_user")
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "Other"), ("username", "ana"), ("password", "pw"), ("role", "user")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/add_user");
        assert!(cookie_pair(&response, "flash").is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_user_unknown_role_flashes(pool: PgPool) {
        seed_user(&pool, "boss", "pw", Role::Admin).await;
        let server = test_server(pool);
        let cookie = login_as(&server, "boss", "pw").await;

        let response = server
            .post("/add_user")
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "X"), ("username", "x"), ("password", "pw"), ("role", "superadmin")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/add_user");
        assert!(cookie_pair(&response, "flash").is_some());
    }
}
