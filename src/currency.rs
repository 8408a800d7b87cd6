//! Currency identity
//!
//! A [`Currency`] is either the chain's native asset or an ERC-20 style
//! token contract. Equality only considers the chain and the identity, never
//! the display metadata.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// 20 byte contract or account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check whether `text` is a well formed address without building one
    pub fn is_valid(text: &str) -> bool {
        text.parse::<Address>().is_ok()
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| Error::Other(format!("Address must start with 0x: '{}'", s)))?;

        if hex_part.len() != 40 {
            return Err(Error::Other(format!(
                "Address must have 40 hex digits, got {}",
                hex_part.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|e| Error::Other(format!("Invalid address '{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// What a currency points at on its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "address")]
pub enum CurrencyId {
    Native,
    Token(Address),
}

/// Immutable currency descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub chain_id: u64,
    pub id: CurrencyId,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Currency {
    pub fn native(chain_id: u64, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            chain_id,
            id: CurrencyId::Native,
            decimals,
            symbol: symbol.into(),
            name: None,
        }
    }

    pub fn token(chain_id: u64, address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            chain_id,
            id: CurrencyId::Token(address),
            decimals,
            symbol: symbol.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_native(&self) -> bool {
        matches!(self.id, CurrencyId::Native)
    }

    /// Token contract address, `None` for the native asset
    pub fn address(&self) -> Option<Address> {
        match self.id {
            CurrencyId::Native => None,
            CurrencyId::Token(address) => Some(address),
        }
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.id == other.id
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}
