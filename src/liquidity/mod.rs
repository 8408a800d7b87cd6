//! Liquidity forms: removal (burn) and provision (mint)

pub mod burn;
pub mod mint;

use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::amount::{mul_div, Amount, Rounding};
use crate::currency::Currency;

pub use burn::{derive_burn_info, BurnAmounts, DerivedBurnInfo};
pub use mint::{derive_mint_info, DerivedMintInfo, MintFormState};

/// Point-in-time reserves of a two asset pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub token_a: Currency,
    pub token_b: Currency,
    pub liquidity_token: Currency,
    pub reserve_a: Uint256,
    pub reserve_b: Uint256,
    pub total_supply: Uint256,
}

impl PoolSnapshot {
    /// Pool with no liquidity yet
    pub fn empty(token_a: Currency, token_b: Currency, liquidity_token: Currency) -> Self {
        Self {
            token_a,
            token_b,
            liquidity_token,
            reserve_a: Uint256::zero(),
            reserve_b: Uint256::zero(),
            total_supply: Uint256::zero(),
        }
    }

    pub fn has_liquidity(&self) -> bool {
        !self.total_supply.is_zero() && !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }

    pub fn reserve_of(&self, currency: &Currency) -> Option<Uint256> {
        if *currency == self.token_a {
            Some(self.reserve_a)
        } else if *currency == self.token_b {
            Some(self.reserve_b)
        } else {
            None
        }
    }

    /// Part of `currency`'s reserve owned by `liquidity`, rounded down
    pub fn liquidity_value(&self, currency: &Currency, liquidity: &Amount) -> Option<Amount> {
        if liquidity.currency() != &self.liquidity_token {
            return None;
        }
        let reserve = self.reserve_of(currency)?;
        let raw = mul_div(liquidity.raw(), reserve, self.total_supply, Rounding::Down)?;
        Some(Amount::from_raw(currency.clone(), raw))
    }
}
