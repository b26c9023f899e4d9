//! Config repository for operator-tunable settings.
//!
//! Point rates and the daily cap live in the `app_config` table and are
//! read fresh for every calculation, so an admin edit applies to the
//! next approval without a redeploy.

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use dankpass_core::points::PointsConfig;

use crate::entities::app_config;

/// Config keys recognized by the points engine.
pub const KEY_POINTS_BASE: &str = "POINTS_BASE";
pub const KEY_POINTS_PREMIUM: &str = "POINTS_PREMIUM";
pub const KEY_POINTS_INNETWORK: &str = "POINTS_INNETWORK";
pub const KEY_DAILY_CAP: &str = "DAILY_CAP";

const KNOWN_KEYS: [&str; 4] = [
    KEY_POINTS_BASE,
    KEY_POINTS_PREMIUM,
    KEY_POINTS_INNETWORK,
    KEY_DAILY_CAP,
];

/// Error types for config operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Key is not one of the recognized settings.
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Stored or submitted value does not parse for its key.
    #[error("Invalid value for config key {key}: {value}")]
    InvalidValue {
        /// Config key.
        key: String,
        /// Rejected value.
        value: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Repository for the `app_config` key/value table.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    db: DatabaseConnection,
}

impl ConfigRepository {
    /// Creates a new config repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the current points configuration.
    ///
    /// Missing keys fall back to the compiled defaults; a row that fails
    /// to parse is an error rather than a silent fallback, so a bad
    /// admin edit surfaces immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is
    /// malformed.
    pub async fn points_config(&self) -> Result<PointsConfig, ConfigError> {
        let rows = app_config::Entity::find().all(&self.db).await?;
        let mut config = PointsConfig::default();

        for row in rows {
            match row.key.as_str() {
                KEY_POINTS_BASE => config.base_rate = parse_decimal(&row.key, &row.value)?,
                KEY_POINTS_PREMIUM => {
                    config.premium_multiplier = parse_decimal(&row.key, &row.value)?;
                }
                KEY_POINTS_INNETWORK => {
                    config.in_network_multiplier = parse_decimal(&row.key, &row.value)?;
                }
                KEY_DAILY_CAP => config.daily_cap = parse_i64(&row.key, &row.value)?,
                // Unrecognized rows are ignored on read.
                _ => {}
            }
        }

        Ok(config)
    }

    /// Upserts a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse
    /// for that key, or the write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<app_config::Model, ConfigError> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        // Validate before writing so a bad value never lands in the table.
        match key {
            KEY_DAILY_CAP => {
                parse_i64(key, value)?;
            }
            _ => {
                parse_decimal(key, value)?;
            }
        }

        let existing = app_config::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: app_config::ActiveModel = row.into();
                active.value = Set(value.to_string());
                active.updated_at = Set(Utc::now().into());
                active.update(&self.db).await?
            }
            None => {
                app_config::ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(value.to_string()),
                    updated_at: Set(Utc::now().into()),
                }
                .insert(&self.db)
                .await?
            }
        };

        Ok(model)
    }

    /// Lists all config rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<app_config::Model>, ConfigError> {
        Ok(app_config::Entity::find().all(&self.db).await?)
    }
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    let parsed = Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })?;
    if parsed < Decimal::ZERO {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    let parsed: i64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })?;
    if parsed < 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_accepts_plain_and_fractional() {
        assert_eq!(parse_decimal("POINTS_BASE", "1").unwrap(), Decimal::ONE);
        assert_eq!(
            parse_decimal("POINTS_PREMIUM", "1.5").unwrap(),
            Decimal::new(15, 1)
        );
    }

    #[test]
    fn parse_decimal_rejects_garbage_and_negatives() {
        assert!(parse_decimal("POINTS_BASE", "abc").is_err());
        assert!(parse_decimal("POINTS_BASE", "-1").is_err());
    }

    #[test]
    fn parse_i64_rejects_fractional_cap() {
        assert!(parse_i64("DAILY_CAP", "2000.5").is_err());
        assert_eq!(parse_i64("DAILY_CAP", " 2000 ").unwrap(), 2000);
    }
}
