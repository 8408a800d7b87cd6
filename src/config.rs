use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::amount::Percent;
use crate::currency::Address;
use crate::error::Error;

/// Highest slippage tolerance accepted anywhere, in basis points
pub const MAX_SLIPPAGE_BIPS: u32 = 5_000;

/// Contracts a trade may need to approve as spender
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// AMM router executing swap trades
    pub router: Option<Address>,
    /// Reactor settling limit orders
    pub limit_order_reactor: Option<Address>,
    /// Reactor settling filler intents
    pub intent_reactor: Option<Address>,
}

/// Lower bounds of each price impact severity band, in basis points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceImpactThresholds {
    pub low_bips: u32,
    pub medium_bips: u32,
    pub high_bips: u32,
    pub severe_bips: u32,
}

impl Default for PriceImpactThresholds {
    fn default() -> Self {
        Self {
            low_bips: 100,
            medium_bips: 300,
            high_bips: 500,
            severe_bips: 1_000,
        }
    }
}

impl PriceImpactThresholds {
    /// Band lower bounds in ascending order
    pub fn bounds(&self) -> [Percent; 4] {
        [
            Percent::from_bips(self.low_bips),
            Percent::from_bips(self.medium_bips),
            Percent::from_bips(self.high_bips),
            Percent::from_bips(self.severe_bips),
        ]
    }
}

/// Trading settings for a form session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chain the session trades on
    pub chain_id: u64,
    /// Slippage tolerance in basis points
    pub slippage_bips: u32,
    /// Seconds a submitted swap stays valid
    pub deadline_secs: u64,
    /// Raw native units kept back by "MAX" for network fees
    pub native_gas_reserve: u64,
    /// Seconds between quote refreshes
    pub quote_poll_secs: u64,
    /// Seconds between allowance reads
    pub allowance_poll_secs: u64,
    /// Approve exactly the required amount instead of an unlimited allowance
    pub approve_exact: bool,
    /// Skip price impact acknowledgement and allow severe impact trades
    pub expert_mode: bool,
    pub price_impact: PriceImpactThresholds,
    pub contracts: ContractAddresses,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain_id: 1,
            slippage_bips: 50,
            deadline_secs: 1_200,
            native_gas_reserve: 10_000_000_000_000_000,
            quote_poll_secs: 15,
            allowance_poll_secs: 4,
            approve_exact: false,
            expert_mode: false,
            price_impact: PriceImpactThresholds::default(),
            contracts: ContractAddresses::default(),
        }
    }
}

impl Settings {
    /// Load settings from `<dir>/settings.{toml,json,...}` layered with
    /// `DEX__*` environment variables. The directory defaults to
    /// `DEX_CONFIG_DIR` or `config`.
    pub fn load(dir: Option<&Path>) -> Result<Self, Error> {
        let config_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from(
                env::var("DEX_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
            ),
        };

        let settings = ConfigLoader::builder()
            .add_source(
                File::with_name(&format!("{}/settings", config_dir.display())).required(false),
            )
            .add_source(
                Environment::with_prefix("DEX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(format!("Failed to load settings: {}", e)))?;

        let loaded: Settings = settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load settings from a single TOML file
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("dex-intent");
        path.push("settings.toml");
        path
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.slippage_bips > MAX_SLIPPAGE_BIPS {
            return Err(Error::Config(format!(
                "slippage_bips {} exceeds maximum {}",
                self.slippage_bips, MAX_SLIPPAGE_BIPS
            )));
        }
        let t = &self.price_impact;
        let ascending =
            t.low_bips < t.medium_bips && t.medium_bips < t.high_bips && t.high_bips < t.severe_bips;
        if !ascending {
            return Err(Error::Config(
                "price impact thresholds must be strictly ascending".to_string(),
            ));
        }
        if self.quote_poll_secs == 0 || self.allowance_poll_secs == 0 {
            return Err(Error::Config("poll intervals must be positive".to_string()));
        }
        Ok(())
    }

    pub fn slippage(&self) -> Percent {
        Percent::from_bips(self.slippage_bips)
    }

    pub fn deadline_ttl(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn quote_poll_interval(&self) -> Duration {
        Duration::from_secs(self.quote_poll_secs)
    }

    pub fn allowance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.allowance_poll_secs)
    }
}
