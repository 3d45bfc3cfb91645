use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use shop_cli::config::{AppConfig, Overrides};
use shop_cli::utils::price_arg;
use shop_cli::{app, logging};
use shop_core::{CartLine, OrderTotalCalculator, StorefrontRepository, WishlistItem, parse_expiry};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Cart, wishlist and checkout for the watch storefront.
///
/// Settings come from `watchshop.toml` (or `--config`); flags override it.
#[derive(Debug, Parser)]
#[command(name = "watchshop", version, about)]
struct Cli {
    /// Configuration file (defaults to ./watchshop.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `watchshop.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Log filter, e.g. `info` or `shop_core=debug`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),

    /// Show or change the wishlist.
    #[command(subcommand)]
    Wishlist(WishlistCommand),

    /// Pick a single product to check out without touching the cart.
    #[command(subcommand)]
    BuyNow(BuyNowCommand),

    /// Manage promo coupons.
    #[command(subcommand)]
    Coupon(CouponCommand),

    /// Show the order total and, with --confirm, place the order.
    Checkout {
        /// Promo code to apply.
        #[arg(long)]
        promo: Option<String>,

        /// Place the order and clear the cart.
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

/// A product given on the command line.
#[derive(Debug, clap::Args)]
struct ProductArgs {
    /// Product id.
    id: i64,

    /// Product name.
    name: String,

    /// Unit price; `₹` and thousands separators are accepted.
    #[arg(value_parser = price_arg)]
    price: Decimal,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    /// List cart lines with the totals breakdown.
    Show,

    /// Add a product (merges with an existing line).
    Add {
        #[command(flatten)]
        product: ProductArgs,

        #[arg(long, short, default_value_t = 1)]
        quantity: u32,
    },

    /// Change a line's quantity by a signed amount; zero removes it.
    Update {
        id: i64,

        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Remove a line.
    Remove { id: i64 },

    /// Empty the cart.
    Clear,

    /// Move a line to the wishlist.
    MoveToWishlist { id: i64 },
}

#[derive(Debug, Subcommand)]
enum WishlistCommand {
    Show,
    Add {
        #[command(flatten)]
        product: ProductArgs,
    },
    Remove { id: i64 },
    /// Move an item into the cart as one unit.
    MoveToCart { id: i64 },
}

#[derive(Debug, Subcommand)]
enum BuyNowCommand {
    Set {
        #[command(flatten)]
        product: ProductArgs,

        #[arg(long, short, default_value_t = 1)]
        quantity: u32,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
enum CouponCommand {
    List,
    Add {
        code: String,

        /// Percentage off the subtotal, 0 to 100.
        discount_percentage: Decimal,

        /// Last valid moment, as YYYY-MM-DD or RFC 3339.
        #[arg(long, value_parser = parse_expiry)]
        expires: Option<DateTime<Utc>>,
    },
    Delete { code: String },
    Enable { code: String },
    Disable { code: String },
}

// ─── dispatch ────────────────────────────────────────────────────────────────

async fn run(
    command: Command,
    repo: &dyn StorefrontRepository,
    calculator: &OrderTotalCalculator,
) -> Result<String> {
    match command {
        Command::Cart(cmd) => match cmd {
            CartCommand::Show => app::show_cart(repo, calculator).await,
            CartCommand::Add { product, quantity } => {
                let line = CartLine::new(product.id, product.name, product.price, quantity);
                app::add_to_cart(repo, line).await
            }
            CartCommand::Update { id, delta } => app::update_cart_quantity(repo, id, delta).await,
            CartCommand::Remove { id } => app::remove_from_cart(repo, id).await,
            CartCommand::Clear => app::clear_cart(repo).await,
            CartCommand::MoveToWishlist { id } => app::move_cart_line_to_wishlist(repo, id).await,
        },
        Command::Wishlist(cmd) => match cmd {
            WishlistCommand::Show => app::show_wishlist(repo).await,
            WishlistCommand::Add { product } => {
                let item = WishlistItem::new(product.id, product.name, product.price);
                app::add_to_wishlist(repo, item).await
            }
            WishlistCommand::Remove { id } => app::remove_from_wishlist(repo, id).await,
            WishlistCommand::MoveToCart { id } => app::move_wishlist_item_to_cart(repo, id).await,
        },
        Command::BuyNow(cmd) => match cmd {
            BuyNowCommand::Set { product, quantity } => {
                let line = CartLine::new(product.id, product.name, product.price, quantity);
                app::set_buy_now(repo, line).await
            }
            BuyNowCommand::Clear => app::clear_buy_now(repo).await,
        },
        Command::Coupon(cmd) => match cmd {
            CouponCommand::List => app::list_coupons(repo, Utc::now()).await,
            CouponCommand::Add {
                code,
                discount_percentage,
                expires,
            } => app::add_coupon(repo, &code, discount_percentage, expires).await,
            CouponCommand::Delete { code } => app::delete_coupon(repo, &code).await,
            CouponCommand::Enable { code } => app::set_coupon_active(repo, &code, true).await,
            CouponCommand::Disable { code } => app::set_coupon_active(repo, &code, false).await,
        },
        Command::Checkout { promo, confirm } => {
            app::checkout(repo, calculator, promo.as_deref(), confirm).await
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    let explicit_level = cli.log_level.is_some();
    config.apply(Overrides {
        backend: cli.backend,
        connection_string: cli.db,
        log_level: cli.log_level,
    });

    // RUST_LOG wins over the config file, but not over --log-level.
    if explicit_level || std::env::var_os("RUST_LOG").is_none() {
        logging::set_log_level(config.log_level())?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    let calculator = OrderTotalCalculator::try_new(config.totals_config()?)
        .context("Invalid pricing configuration")?;
    let db_config = config.db_config();
    debug!(backend = %db_config.backend, db = %db_config.connection_string, "configuration resolved");

    let repo = app::open_repository(&db_config).await?;
    let output = run(cli.command, &*repo, &calculator).await?;
    print!("{}", output);

    Ok(())
}
