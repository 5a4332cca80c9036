//! Session-authenticated admin panel for a small store.
//!
//! The application serves HTML pages over axum: public login/registration,
//! a profile page for signed-in users, and admin-only user management and
//! product catalog CRUD backed by PostgreSQL.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use axum::{routing::get, Router};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument};

use crate::api::models::users::Role;
use crate::auth::password;
pub use crate::config::Config;
use crate::db::{handlers::users::Users, models::users::UserCreateDBRequest};
use crate::types::UserId;

/// Shared state available to all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    #[builder(default = Arc::new(build_templates()))]
    pub templates: Arc<minijinja::Environment<'static>>,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Template environment with all pages compiled in.
pub fn build_templates() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();

    let templates = [
        ("base.html", include_str!("../templates/base.html")),
        ("home.html", include_str!("../templates/home.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("register.html", include_str!("../templates/register.html")),
        ("profile.html", include_str!("../templates/profile.html")),
        ("admin.html", include_str!("../templates/admin.html")),
        ("usuarios.html", include_str!("../templates/usuarios.html")),
        ("add_user.html", include_str!("../templates/add_user.html")),
        ("productos.html", include_str!("../templates/productos.html")),
        ("add_product.html", include_str!("../templates/add_product.html")),
        ("edit_product.html", include_str!("../templates/edit_product.html")),
    ];

    for (name, source) in templates {
        env.add_template(name, source).expect("built-in template must parse");
    }

    env
}

/// Create the initial admin account if it doesn't exist.
///
/// Idempotent: creates the account on first startup, or resets its password
/// on later startups when a password is configured. Called before the server
/// starts accepting requests so there is always a way in.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(username: &str, name: &str, password: &str, db: &PgPool) -> Result<UserId, anyhow::Error> {
    let password_hash = password::hash_string(password).map_err(|e| anyhow::anyhow!("hash admin password: {e}"))?;

    // Transaction so a concurrent startup cannot create the account twice
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_by_username(username).await? {
        user_repo.set_password_hash(existing_user.id, &password_hash).await?;
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created = user_repo
        .create(&UserCreateDBRequest {
            name: name.to_string(),
            username: username.to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

    tx.commit().await?;
    Ok(created.id)
}

/// Connect to the database, run migrations, and bootstrap the admin account.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("database_url is not configured (set DATABASE_URL)"))?;

    let pool = db::create_pool(database_url, config.max_db_connections).await?;
    migrator().run(&pool).await?;

    if let Some(admin_password) = config.admin_password.as_deref() {
        create_initial_admin_user(&config.admin_username, &config.admin_name, admin_password, &pool).await?;
    } else {
        info!("admin_password not set, skipping initial admin user");
    }

    Ok(pool)
}

async fn healthz() -> &'static str {
    "OK"
}

/// Build the application router with all pages and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::handlers::router())
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A fully initialized application, ready to serve or hand to a test server.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("starting with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Build an application directly from an existing pool, skipping database
    /// setup. Used by tests that get a migrated pool from `sqlx::test`.
    pub fn from_pool(pool: PgPool, config: Config) -> Self {
        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state);
        Self { router, config, pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn test_config() -> Config {
        let mut config = Config {
            secret_key: Some("test-secret".to_string()),
            ..Default::default()
        };
        config.auth.password.memory_kib = 1024;
        config.auth.password.iterations = 1;
        config
    }

    #[test]
    fn test_templates_parse() {
        // Panics at startup otherwise, but keep the failure in the suite too
        let env = build_templates();
        assert!(env.get_template("home.html").is_ok());
        assert!(env.get_template("edit_product.html").is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_initial_admin_user_new(pool: PgPool) {
        let user_id = create_initial_admin_user("admin", "Administrator", "hunter2", &pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, Role::Admin);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_initial_admin_user_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin", "Administrator", "old-pw", &pool).await.unwrap();
        let second = create_initial_admin_user("admin", "Administrator", "new-pw", &pool).await.unwrap();
        assert_eq!(first, second);

        // Password was rotated to the newly configured one
        let mut conn = pool.acquire().await.unwrap();
        let authed = crate::auth::service::authenticate(&mut conn, "admin", "new-pw").await.unwrap();
        assert_eq!(authed.id, first);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_healthz(pool: PgPool) {
        let server = Application::from_pool(pool, test_config()).into_test_server();
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }
}
