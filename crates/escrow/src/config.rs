//! Ledger configuration.
//!
//! Values come from the environment, falling back to defaults when a variable is
//! not set. A variable that is set but malformed is an error.

use std::num::ParseIntError;

use thiserror::Error;

use supplychain_core::AccountId;

/// 1 finney, expressed in wei.
pub const DEFAULT_LISTING_FEE: u64 = 1_000_000_000_000_000;

pub const LISTING_FEE_VAR: &str = "SUPPLYCHAIN_LISTING_FEE";
pub const OPERATING_ACCOUNT_VAR: &str = "SUPPLYCHAIN_OPERATING_ACCOUNT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SUPPLYCHAIN_LISTING_FEE={value:?} is not a valid amount: {source}")]
    InvalidListingFee {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("SUPPLYCHAIN_OPERATING_ACCOUNT={value:?} is not a valid account id")]
    InvalidOperatingAccount { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Flat fee a seller pays to list an item.
    listing_fee: u64,
    /// Account that collects listing fees.
    operating_account: AccountId,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            listing_fee: DEFAULT_LISTING_FEE,
            operating_account: AccountId::new(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(LISTING_FEE_VAR) {
            config.listing_fee = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidListingFee { value, source })?;
        }

        if let Some(value) = lookup(OPERATING_ACCOUNT_VAR) {
            config.operating_account = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOperatingAccount { value })?;
        }

        Ok(config)
    }

    pub fn with_listing_fee(mut self, listing_fee: u64) -> Self {
        self.listing_fee = listing_fee;
        self
    }

    pub fn with_operating_account(mut self, operating_account: AccountId) -> Self {
        self.operating_account = operating_account;
        self
    }

    pub fn listing_fee(&self) -> u64 {
        self.listing_fee
    }

    pub fn operating_account(&self) -> AccountId {
        self.operating_account
    }
}
