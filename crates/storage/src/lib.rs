use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::ProductId;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a product and returns the stored row. AUTOINCREMENT keeps
    /// ids strictly increasing, even across deletions.
    pub async fn insert_product(
        &self,
        name: &str,
        price: f64,
        image: &str,
    ) -> Result<StoredProduct> {
        let created_at = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO products (name, price, image, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(name)
        .bind(price)
        .bind(image)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(StoredProduct {
            product_id: ProductId(rec.get::<i64, _>(0)),
            name: name.to_string(),
            price,
            image: image.to_string(),
            created_at,
        })
    }

    /// Full collection in id order; the order the client renders.
    pub async fn list_products(&self) -> Result<Vec<StoredProduct>> {
        let rows = sqlx::query(
            "SELECT id, name, price, image, created_at
             FROM products
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(product_from_row).collect())
    }

    pub async fn load_product(&self, product_id: ProductId) -> Result<Option<StoredProduct>> {
        let row = sqlx::query(
            "SELECT id, name, price, image, created_at
             FROM products
             WHERE id = ?",
        )
        .bind(product_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(product_from_row))
    }

    /// Returns false when no row with that id exists.
    pub async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(product_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn product_from_row(row: sqlx::sqlite::SqliteRow) -> StoredProduct {
    StoredProduct {
        product_id: ProductId(row.get::<i64, _>(0)),
        name: row.get::<String, _>(1),
        price: row.get::<f64, _>(2),
        image: row.get::<String, _>(3),
        created_at: row.get::<DateTime<Utc>, _>(4),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_file_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;
    Ok(())
}

fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
mod tests;
