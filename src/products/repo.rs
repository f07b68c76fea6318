use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub description: String,
}

/// Field values written by create and update. The id always comes from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Product>>;
    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Product>>;
    async fn create(&self, product: &NewProduct) -> anyhow::Result<Product>;
    async fn update(&self, id: i32, product: &NewProduct) -> anyhow::Result<Option<Product>>;
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
    async fn exists(&self, id: i32) -> anyhow::Result<bool>;
    async fn ensure_schema(&self) -> anyhow::Result<()>;
}

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        price NUMERIC(10,2) NOT NULL CHECK (price > 0),
        description TEXT DEFAULT ''
    )
"#;

const CREATE_NAME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products(name)";

#[derive(Clone)]
pub struct PgProductRepository {
    db: PgPool,
}

impl PgProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductRepository {
    async fn list(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, COALESCE(description, '') AS description
              FROM products
             ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list products")?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, COALESCE(description, '') AS description
              FROM products
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get product {}", id))?;
        Ok(row)
    }

    async fn create(&self, product: &NewProduct) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, COALESCE(description, '') AS description
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .fetch_one(&self.db)
        .await
        .context("insert product")?;
        Ok(row)
    }

    async fn update(&self, id: i32, product: &NewProduct) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = $2, price = $3, description = $4
             WHERE id = $1
            RETURNING id, name, price, COALESCE(description, '') AS description
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("update product {}", id))?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete product {}", id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: i32) -> anyhow::Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await
                .with_context(|| format!("check product {} exists", id))?;
        Ok(exists)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.db)
            .await
            .context("create products table")?;
        sqlx::query(CREATE_NAME_INDEX)
            .execute(&self.db)
            .await
            .context("create products name index")?;
        Ok(())
    }
}


#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::db;
    use crate::products::dto::PRICE_MAX;

    fn seed() -> Vec<NewProduct> {
        vec![
            NewProduct {
                name: "Test Laptop".into(),
                price: Decimal::new(129999, 2),
                description: "High-performance test laptop".into(),
            },
            NewProduct {
                name: "Test Book".into(),
                price: Decimal::new(4999, 2),
                description: "Comprehensive test guide".into(),
            },
            NewProduct {
                name: "Test Plant Monitor".into(),
                price: Decimal::new(7999, 2),
                description: "IoT test device for plants".into(),
            },
        ]
    }

    async fn repo() -> PgProductRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for postgres tests");
        let pool = db::connect(&url, 2).await.expect("connect");
        sqlx::query("DROP TABLE IF EXISTS products")
            .execute(&pool)
            .await
            .expect("drop table");
        let repo = PgProductRepository::new(pool);
        repo.ensure_schema().await.expect("ensure schema");
        repo
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable postgres"]
    async fn crud_against_postgres() {
        let repo = repo().await;
        // idempotent
        repo.ensure_schema().await.unwrap();

        for p in seed() {
            repo.create(&p).await.unwrap();
        }
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(all[0].name, "Test Laptop");
        assert_eq!(all[0].price, Decimal::new(129999, 2));

        let book = &all[1];
        assert!(repo.exists(book.id).await.unwrap());

        let changed = NewProduct {
            name: "Test Book 2nd ed.".into(),
            price: Decimal::new(5499, 2),
            description: String::new(),
        };
        let updated = repo.update(book.id, &changed).await.unwrap().unwrap();
        assert_eq!(updated.id, book.id);
        assert_eq!(updated.name, "Test Book 2nd ed.");

        assert!(repo.delete(book.id).await.unwrap());
        assert!(!repo.delete(book.id).await.unwrap());
        assert!(repo.get_by_id(book.id).await.unwrap().is_none());
        assert!(repo.update(book.id, &changed).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable postgres"]
    async fn price_check_is_enforced_by_postgres() {
        let repo = repo().await;
        let bad = NewProduct {
            name: "Free".into(),
            price: Decimal::ZERO,
            description: String::new(),
        };
        assert!(repo.create(&bad).await.is_err());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable postgres"]
    async fn max_price_round_trips_unchanged() {
        let repo = repo().await;
        let max = NewProduct {
            name: "Test Server Rack".into(),
            price: PRICE_MAX,
            description: String::new(),
        };
        let created = repo.create(&max).await.unwrap();
        assert_eq!(created.price, PRICE_MAX);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::new(9_999_999_999, 2));
        assert_eq!(fetched.price.to_string(), "99999999.99");

        let over = NewProduct {
            price: PRICE_MAX + Decimal::new(1, 2),
            ..max
        };
        assert!(repo.create(&over).await.is_err());
    }
}
