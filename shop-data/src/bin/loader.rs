use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shop_data::CouponLoader;
use shop_db_sqlite::SqliteRepository;

/// Load promo coupons from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - code: The promo code (normalised to upper case)
/// - discount_percentage: Percentage off the subtotal, 0 to 100
/// - active: true/false (optional, defaults to true)
/// - expiry_date: RFC 3339 timestamp or YYYY-MM-DD (optional)
#[derive(Parser, Debug)]
#[command(name = "shop-coupon-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing coupon data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "watchshop.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading coupons from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = CouponLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = CouponLoader::load(&repo, &records)
        .await
        .context("Failed to load coupons into database")?;

    println!("Successfully loaded {} coupons into the database.", loaded);

    Ok(())
}
