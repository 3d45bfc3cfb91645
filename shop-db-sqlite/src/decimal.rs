use std::str::FromStr;

use rust_decimal::Decimal;
use shop_core::RepositoryError;
use sqlx::{Row, TypeInfo, ValueRef};

/// Reads a money column.
///
/// Amounts are written as TEXT so they round-trip exactly, but hand-edited
/// rows and seed files may hold INTEGER or REAL values; those are accepted
/// too.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(val.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to parse '{}' in '{}' as Decimal: {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Reads a quantity column, rejecting values that do not fit a `u32`.
pub fn get_quantity(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<u32, RepositoryError> {
    let val: i64 = row
        .try_get(column)
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    u32::try_from(val).map_err(|_| {
        RepositoryError::Database(format!("Quantity {} in '{}' is out of range", val, column))
    })
}

/// Convert a Decimal to its exact TEXT form for storage.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                text_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch(pool: &sqlx::sqlite::SqlitePool, insert: &str) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query("SELECT * FROM test_decimals WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn test_get_decimal_from_text_is_exact() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id, text_value) VALUES (1, '1234.56')").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(1234.56)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id, int_value) VALUES (1, 5000)").await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(5000)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id, real_value) VALUES (1, 0.25)").await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(0.25)));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_garbage_text() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id, text_value) VALUES (1, 'lots')").await;

        assert!(matches!(
            get_decimal(&row, "text_value"),
            Err(RepositoryError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_null() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id) VALUES (1)").await;

        assert!(get_decimal(&row, "text_value").is_err());
    }

    #[tokio::test]
    async fn test_get_decimal_missing_column() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id) VALUES (1)").await;

        assert!(get_decimal(&row, "nope").is_err());
    }

    #[tokio::test]
    async fn test_get_quantity_rejects_negative() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id, int_value) VALUES (1, -3)").await;

        assert!(get_quantity(&row, "int_value").is_err());
    }

    #[test]
    fn test_decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(1000.00)), "1000");
        assert_eq!(decimal_to_text(dec!(12.50)), "12.5");
    }
}
