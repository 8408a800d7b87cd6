//! External collaborators
//!
//! Quoting, chain reads and signing live outside this crate. They are
//! reached through these traits so sessions can be driven by real
//! providers or by in-memory fakes.

use std::fmt;

use async_trait::async_trait;
use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::currency::{Address, Currency};
use crate::error::ProviderError;
use crate::trade::{QuoteOutcome, QuoteRequest, Trade};

/// Handle of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the signer needs to execute a confirmed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub trade: Trade,
    pub minimum_amount_out: Amount,
    pub maximum_amount_in: Amount,
    pub recipient: Address,
    /// Unix seconds after which the transaction must revert
    pub deadline: i64,
}

#[async_trait]
pub trait TradeQuoter: Send + Sync {
    /// Price `request`. Calls are independent and may be repeated freely.
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteOutcome, ProviderError>;
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn balance_of(&self, account: Address, currency: &Currency) -> Result<Amount, ProviderError>;

    async fn allowance(
        &self,
        owner: Address,
        token: &Currency,
        spender: Address,
    ) -> Result<Uint256, ProviderError>;
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn approve(
        &self,
        token: &Currency,
        spender: Address,
        amount: Uint256,
    ) -> Result<TxHash, ProviderError>;

    async fn execute(&self, request: &ExecutionRequest) -> Result<TxHash, ProviderError>;
}
