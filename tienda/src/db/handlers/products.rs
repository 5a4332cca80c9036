//! Database repository for catalog products.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
};
use crate::types::{abbrev_uuid, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing products
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ProductFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDBResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            image_reference: p.image_reference,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

pub struct Products<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;
    type Filter = ProductFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, description, price, image_reference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_reference)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(product.into())
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(product.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at ASC OFFSET $1 LIMIT $2")
            .bind(filter.skip)
            .bind(filter.limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(products.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3, image_reference = $4, updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_reference)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(product.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::PgPool;

    fn request(name: &str, price: &str) -> ProductCreateDBRequest {
        ProductCreateDBRequest {
            name: name.to_string(),
            description: "A fine product".to_string(),
            price: price.parse().unwrap(),
            image_reference: "img/placeholder.png".to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_product_crud_roundtrip(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let created = repo.create(&request("Vertical mouse", "39.99")).await.unwrap();
        assert_eq!(created.name, "Vertical mouse");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, "39.99".parse::<Decimal>().unwrap());

        let updated = repo
            .update(
                created.id,
                &ProductUpdateDBRequest {
                    name: "Vertical mouse v2".to_string(),
                    description: fetched.description.clone(),
                    price: "44.99".parse().unwrap(),
                    image_reference: fetched.image_reference.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Vertical mouse v2");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_missing_product_returns_false(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        // Delete on an absent id is a no-op at the SQL level; the handler
        // layer turns the false into a NotFound for the user.
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());

        repo.create(&request("Survivor", "10.00")).await.unwrap();
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(repo.list(&ProductFilter::new(0, 100)).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_missing_product_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let err = repo
            .update(
                Uuid::new_v4(),
                &ProductUpdateDBRequest {
                    name: "Ghost".to_string(),
                    description: "".to_string(),
                    price: Decimal::ZERO,
                    image_reference: "".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_respects_pagination(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        for i in 0..5 {
            repo.create(&request(&format!("Product {i}"), "1.00")).await.unwrap();
        }

        let page = repo.list(&ProductFilter::new(2, 2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Product 2");
    }
}
