use std::io::Read;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shop_core::{CouponError, CouponRepository, NewCoupon, RepositoryError, parse_expiry};
use thiserror::Error;

/// Errors that can occur when loading coupon data.
#[derive(Debug, Error)]
pub enum CouponLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid coupon on line {line}: {source}")]
    InvalidCoupon {
        line: usize,
        #[source]
        source: CouponError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for CouponLoaderError {
    fn from(err: csv::Error) -> Self {
        CouponLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the coupons CSV file.
///
/// - `code`: promo code; trimmed and upper-cased on load
/// - `discount_percentage`: 0 to 100
/// - `active`: `true`/`false`, `1`/`0` or `yes`/`no`; empty means active
/// - `expiry_date`: RFC 3339 timestamp or `YYYY-MM-DD` (midnight UTC);
///   empty means the coupon never expires
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CouponRecord {
    pub code: String,
    pub discount_percentage: Decimal,
    #[serde(default = "default_active", deserialize_with = "deserialize_active")]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub expiry_date: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

fn deserialize_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(true),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "invalid active flag '{}'",
                v
            ))),
        },
    }
}

fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_expiry(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for coupon data from CSV files.
///
/// Works against any [`CouponRepository`], so the same CSV can seed every
/// storage backend.
pub struct CouponLoader;

impl CouponLoader {
    /// Parse coupon records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CouponRecord>, CouponLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CouponRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load coupon records into the database.
    ///
    /// Every record is validated before anything is written, so a bad file
    /// leaves the store untouched. A coupon whose code already exists is
    /// deleted and re-created, which makes loading idempotent.
    ///
    /// Returns the number of coupons written.
    pub async fn load<R>(
        repo: &R,
        records: &[CouponRecord],
    ) -> Result<usize, CouponLoaderError>
    where
        R: CouponRepository + ?Sized,
    {
        let coupons = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                NewCoupon::new(&record.code, record.discount_percentage, record.expiry_date)
                    .map(|coupon| (coupon, record.active))
                    // line 1 is the header
                    .map_err(|source| CouponLoaderError::InvalidCoupon {
                        line: index + 2,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut loaded = 0;
        for (coupon, active) in coupons {
            match repo.get_coupon_by_code(&coupon.code).await {
                Ok(existing) => repo.delete_coupon(existing.id).await?,
                Err(RepositoryError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }

            let created = repo.create_coupon(coupon).await?;
            if !active {
                repo.set_coupon_active(created.id, false).await?;
            }
            loaded += 1;
        }

        Ok(loaded)
    }
}
