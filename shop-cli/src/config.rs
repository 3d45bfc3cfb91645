//! `watchshop.toml` handling.
//!
//! Every section and key is optional. Values given on the command line win
//! over the file, and the file wins over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use shop_core::TotalsConfig;
use shop_core::db::DbConfig;
use tracing::debug;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "watchshop.toml";

pub const DEFAULT_DATABASE: &str = "watchshop.db";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub pricing: PricingSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
}

/// Amounts may be written as TOML strings (`"0.18"`) or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingSection {
    pub free_shipping_threshold: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Settings that can also be given as command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    /// Reads `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_FILE`] when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            debug!(path = %fallback.display(), "loading config");
            return Self::from_file(fallback);
        }

        debug!("no config file; using defaults");
        Ok(Self::default())
    }

    pub fn apply(
        &mut self,
        overrides: Overrides,
    ) {
        if overrides.backend.is_some() {
            self.database.backend = overrides.backend;
        }
        if overrides.connection_string.is_some() {
            self.database.connection_string = overrides.connection_string;
        }
        if overrides.log_level.is_some() {
            self.logging.level = overrides.log_level;
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self
                .database
                .backend
                .clone()
                .unwrap_or_else(|| DbConfig::default().backend),
            connection_string: self
                .database
                .connection_string
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        }
    }

    /// Pricing rules with unset keys taken from [`TotalsConfig::default`].
    /// The result is validated.
    pub fn totals_config(&self) -> Result<TotalsConfig> {
        let defaults = TotalsConfig::default();
        let config = TotalsConfig {
            free_shipping_threshold: self
                .pricing
                .free_shipping_threshold
                .unwrap_or(defaults.free_shipping_threshold),
            shipping_fee: self.pricing.shipping_fee.unwrap_or(defaults.shipping_fee),
            tax_rate: self.pricing.tax_rate.unwrap_or(defaults.tax_rate),
        };
        config
            .validate()
            .context("Invalid [pricing] configuration")?;
        Ok(config)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.db_config().backend, "sqlite");
        assert_eq!(config.db_config().connection_string, DEFAULT_DATABASE);
        assert_eq!(config.totals_config().unwrap(), TotalsConfig::default());
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn pricing_accepts_strings_and_numbers() {
        let config = AppConfig::from_toml_str(
            r#"
            [pricing]
            free_shipping_threshold = "10000"
            shipping_fee = 150
            "#,
        )
        .unwrap();

        let totals = config.totals_config().unwrap();
        assert_eq!(totals.free_shipping_threshold, dec!(10000));
        assert_eq!(totals.shipping_fee, dec!(150));
        assert_eq!(totals.tax_rate, dec!(0.18));
    }

    #[test]
    fn invalid_pricing_is_rejected() {
        let config = AppConfig::from_toml_str(
            r#"
            [pricing]
            tax_rate = "1.5"
            "#,
        )
        .unwrap();

        assert!(config.totals_config().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml_str("[pricing]\ntax = \"0.1\"").is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [database]
            connection_string = "from-file.db"

            [logging]
            level = "info"
            "#,
        )
        .unwrap();

        config.apply(Overrides {
            connection_string: Some(":memory:".to_string()),
            log_level: Some("debug".to_string()),
            ..Overrides::default()
        });

        assert_eq!(config.db_config().connection_string, ":memory:");
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn missing_overrides_keep_file_values() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [database]
            backend = "sqlite"
            connection_string = "from-file.db"
            "#,
        )
        .unwrap();

        config.apply(Overrides::default());

        assert_eq!(config.db_config().connection_string, "from-file.db");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
