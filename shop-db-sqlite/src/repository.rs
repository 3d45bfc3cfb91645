use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shop_core::{
    CartLine, CartRepository, Coupon, CouponRepository, NewCoupon, RepositoryError,
    WishlistItem, WishlistRepository,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_quantity};

const MEMORY: &str = ":memory:";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `connection_string`, which is either `:memory:`, a bare file
    /// path, or a `sqlite:` URL. Files are created when missing.
    ///
    /// An in-memory database lives only as long as its connection, so it is
    /// served from a single connection that is never recycled.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let connection_string = connection_string.trim();

        let pool = if connection_string == MEMORY || connection_string == "sqlite::memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await
                .context("Failed to open in-memory database")?
        } else {
            let options = if connection_string.starts_with("sqlite:") {
                SqliteConnectOptions::from_str(connection_string)
                    .with_context(|| format!("Invalid database URL: {}", connection_string))?
            } else {
                SqliteConnectOptions::new().filename(connection_string)
            };

            SqlitePoolOptions::new()
                .connect_with(options.create_if_missing(true).foreign_keys(true))
                .await
                .with_context(|| format!("Failed to connect to database: {}", connection_string))?
        };

        debug!(database = %connection_string, "opened sqlite database");
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute the SQL seed files in `seeds_dir` that this
    /// database has not seen yet. Files run in alphabetical order by
    /// filename; each is recorded in `applied_seeds` in the same transaction,
    /// so a file is applied at most once. Requires migrations.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy().into_owned();

            let applied = sqlx::query("SELECT 1 FROM applied_seeds WHERE filename = ?")
                .bind(&filename)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read seed history")?
                .is_some();
            if applied {
                debug!(file = %path.display(), "seed file already applied");
                continue;
            }

            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            let mut tx = self.pool.begin().await.context("Failed to start seed transaction")?;
            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(&sql))
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            sqlx::query("INSERT INTO applied_seeds (filename, applied_at) VALUES (?, ?)")
                .bind(&filename)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await
                .context("Failed to record seed file")?;
            tx.commit().await.context("Failed to commit seed file")?;

            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn get_coupon(
        &self,
        id: i64,
    ) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, code, discount_percentage, active, expiry_date
             FROM coupons WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_coupon(&row)
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Unique-constraint violations become [`RepositoryError::Conflict`].
fn write_error(
    e: sqlx::Error,
    conflict: impl FnOnce() -> String,
) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(conflict())
        }
        _ => db_error(e),
    }
}

fn row_to_cart_line(row: &sqlx::sqlite::SqliteRow) -> Result<CartLine, RepositoryError> {
    Ok(CartLine {
        id: row.try_get("product_id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        unit_price: get_decimal(row, "unit_price")?,
        quantity: get_quantity(row, "quantity")?,
    })
}

fn row_to_wishlist_item(row: &sqlx::sqlite::SqliteRow) -> Result<WishlistItem, RepositoryError> {
    Ok(WishlistItem {
        id: row.try_get("product_id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        unit_price: get_decimal(row, "unit_price")?,
    })
}

fn row_to_coupon(row: &sqlx::sqlite::SqliteRow) -> Result<Coupon, RepositoryError> {
    Ok(Coupon {
        id: row.try_get("id").map_err(db_error)?,
        code: row.try_get("code").map_err(db_error)?,
        discount_percentage: get_decimal(row, "discount_percentage")?,
        active: row.try_get("active").map_err(db_error)?,
        expiry_date: row
            .try_get::<Option<DateTime<Utc>>, _>("expiry_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get expiry_date: {}", e)))?,
    })
}

#[async_trait]
impl CartRepository for SqliteRepository {
    async fn get_cart(&self) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, name, unit_price, quantity
             FROM cart_lines ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_cart_line).collect()
    }

    async fn set_cart(
        &self,
        lines: &[CartLine],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM cart_lines")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for (position, line) in (0_i64..).zip(lines) {
            sqlx::query(
                "INSERT INTO cart_lines (position, product_id, name, unit_price, quantity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(position)
            .bind(line.id)
            .bind(&line.name)
            .bind(decimal_to_text(line.unit_price))
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                write_error(e, || format!("product {} appears twice in the cart", line.id))
            })?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn get_buy_now(&self) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query(
            "SELECT product_id, name, unit_price, quantity FROM buy_now WHERE slot = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(row_to_cart_line).transpose()
    }

    async fn set_buy_now(
        &self,
        line: &CartLine,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO buy_now (slot, product_id, name, unit_price, quantity)
             VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET
                product_id = excluded.product_id,
                name = excluded.name,
                unit_price = excluded.unit_price,
                quantity = excluded.quantity",
        )
        .bind(line.id)
        .bind(&line.name)
        .bind(decimal_to_text(line.unit_price))
        .bind(i64::from(line.quantity))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn clear_buy_now(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM buy_now")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl WishlistRepository for SqliteRepository {
    async fn get_wishlist(&self) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, name, unit_price FROM wishlist_items ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_wishlist_item).collect()
    }

    async fn set_wishlist(
        &self,
        items: &[WishlistItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM wishlist_items")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for (position, item) in (0_i64..).zip(items) {
            sqlx::query(
                "INSERT INTO wishlist_items (position, product_id, name, unit_price)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(position)
            .bind(item.id)
            .bind(&item.name)
            .bind(decimal_to_text(item.unit_price))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                write_error(e, || format!("product {} appears twice in the wishlist", item.id))
            })?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl CouponRepository for SqliteRepository {
    async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, code, discount_percentage, active, expiry_date
             FROM coupons ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_coupon).collect()
    }

    async fn get_coupon_by_code(
        &self,
        code: &str,
    ) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, code, discount_percentage, active, expiry_date
             FROM coupons WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_coupon(&row)
    }

    async fn create_coupon(
        &self,
        coupon: NewCoupon,
    ) -> Result<Coupon, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO coupons (code, discount_percentage, active, expiry_date)
             VALUES (?, ?, 1, ?)",
        )
        .bind(&coupon.code)
        .bind(decimal_to_text(coupon.discount_percentage))
        .bind(coupon.expiry_date)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("coupon '{}' already exists", coupon.code)))?;

        self.get_coupon(result.last_insert_rowid()).await
    }

    async fn set_coupon_active(
        &self,
        id: i64,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE coupons SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_coupon(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
