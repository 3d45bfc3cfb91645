//! Integration tests for coupon loading using the SQLite backend.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use shop_core::{CouponError, CouponRepository, NewCoupon};
use shop_data::{CouponLoader, CouponLoaderError};
use shop_db_sqlite::SqliteRepository;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_CSV: &str = include_str!("../test-data/coupons.csv");

/// Migrated database without the bundled seed coupons.
async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool);
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

#[tokio::test]
async fn test_load_all_coupons() {
    let repo = setup_test_db().await;

    let records = CouponLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    let loaded = CouponLoader::load(&repo, &records)
        .await
        .expect("Failed to load coupons");

    assert_eq!(loaded, 4);
    assert_eq!(repo.list_coupons().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_loaded_codes_are_normalised() {
    let repo = setup_test_db().await;

    let records = CouponLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    CouponLoader::load(&repo, &records)
        .await
        .expect("Failed to load coupons");

    let coupon = repo
        .get_coupon_by_code("SAVE10")
        .await
        .expect("lower-case code should be stored upper-case");
    assert_eq!(coupon.discount_percentage, dec!(10));
    assert!(coupon.active);
    assert_eq!(coupon.expiry_date, None);
}

#[tokio::test]
async fn test_inactive_flag_and_date_only_expiry() {
    let repo = setup_test_db().await;

    let records = CouponLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    CouponLoader::load(&repo, &records)
        .await
        .expect("Failed to load coupons");

    let festive = repo.get_coupon_by_code("FESTIVE15").await.unwrap();
    assert!(!festive.active);
    assert_eq!(
        festive.expiry_date,
        Some(Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap())
    );

    let vip = repo.get_coupon_by_code("VIP25").await.unwrap();
    assert!(vip.active, "an empty active column means active");
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let repo = setup_test_db().await;
    let records = CouponLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

    CouponLoader::load(&repo, &records).await.unwrap();
    CouponLoader::load(&repo, &records).await.unwrap();

    assert_eq!(repo.list_coupons().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_load_replaces_existing_coupon() {
    let repo = setup_test_db().await;
    repo.create_coupon(NewCoupon::new("SAVE10", dec!(5), None).unwrap())
        .await
        .unwrap();

    let records = CouponLoader::parse("code,discount_percentage\nsave10,10".as_bytes()).unwrap();
    CouponLoader::load(&repo, &records).await.unwrap();

    let coupons = repo.list_coupons().await.unwrap();
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].discount_percentage, dec!(10));
}

#[tokio::test]
async fn test_invalid_record_aborts_before_writing() {
    let repo = setup_test_db().await;
    let csv = "code,discount_percentage\nGOOD,10\nGREEDY,150";

    let records = CouponLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    let result = CouponLoader::load(&repo, &records).await;

    match result {
        Err(CouponLoaderError::InvalidCoupon { line, source }) => {
            assert_eq!(line, 3);
            assert_eq!(source, CouponError::InvalidDiscountPercentage(dec!(150)));
        }
        other => panic!("expected InvalidCoupon, got {other:?}"),
    }
    assert!(repo.list_coupons().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_code_is_reported() {
    let repo = setup_test_db().await;

    let records = CouponLoader::parse("code,discount_percentage\nsave 10,10".as_bytes()).unwrap();
    let result = CouponLoader::load(&repo, &records).await;

    assert!(matches!(
        result,
        Err(CouponLoaderError::InvalidCoupon {
            line: 2,
            source: CouponError::InvalidCode(_)
        })
    ));
}
