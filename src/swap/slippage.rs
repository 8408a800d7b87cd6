use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Percent};
use crate::config::MAX_SLIPPAGE_BIPS;
use crate::error::Error;

/// Below this the transaction is likely to revert (0.05%)
const RISKY_LOW_BIPS: u32 = 5;
/// Above this the trade is an easy sandwich target (1%)
const RISKY_HIGH_BIPS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlippageWarning {
    /// Transaction may fail
    RiskyLow,
    /// Transaction may be frontrun
    RiskyHigh,
}

/// Validated slippage tolerance, stored in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageTolerance {
    bips: u32,
}

impl SlippageTolerance {
    pub fn from_bips(bips: u32) -> Result<Self, Error> {
        if bips > MAX_SLIPPAGE_BIPS {
            return Err(Error::InvalidSlippage(format!(
                "{}% cannot be greater than {}%",
                Percent::from_bips(bips).to_fixed(2),
                MAX_SLIPPAGE_BIPS / 100
            )));
        }
        Ok(Self { bips })
    }

    /// Parse percent text as typed in a settings box: `"0.5"` is 0.5%.
    /// At most two decimals are accepted.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidSlippage(format!("Invalid slippage format: '{}'", text));

        let trimmed = text.trim();
        let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || frac_part.len() > 2 || !is_digits(int_part) || !is_digits(frac_part)
        {
            return Err(invalid());
        }

        let whole: u32 = int_part.parse().map_err(|_| invalid())?;
        let frac: u32 = format!("{:0<2}", frac_part).parse().map_err(|_| invalid())?;
        let bips = whole
            .checked_mul(100)
            .and_then(|b| b.checked_add(frac))
            .ok_or_else(invalid)?;
        Self::from_bips(bips)
    }

    pub fn bips(&self) -> u32 {
        self.bips
    }

    pub fn percent(&self) -> Percent {
        Percent::from_bips(self.bips)
    }

    pub fn warning(&self) -> Option<SlippageWarning> {
        if self.bips < RISKY_LOW_BIPS {
            Some(SlippageWarning::RiskyLow)
        } else if self.bips > RISKY_HIGH_BIPS {
            Some(SlippageWarning::RiskyHigh)
        } else {
            None
        }
    }
}

/// Largest amount the "MAX" button may fill in. Native balances keep
/// `gas_reserve` back for network fees, floored at zero.
pub fn max_amount_spend(balance: Option<&Amount>, gas_reserve: Uint256) -> Option<Amount> {
    let balance = balance?;
    if !balance.currency().is_native() {
        return Some(balance.clone());
    }
    Some(Amount::from_raw(
        balance.currency().clone(),
        balance.raw().saturating_sub(gas_reserve),
    ))
}
