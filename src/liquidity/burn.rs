//! Liquidity removal derivation
//!
//! The independent field picks one of three input modes: a percent of the
//! position, an absolute liquidity amount, or an amount of one of the two
//! pool assets. Each resolves to a single fraction of the position, and
//! every output is that fraction of what the user owns, rounded down.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amount::{Amount, Percent, Rounding};
use crate::codec::{self, Precision};
use crate::currency::{Address, Currency};
use crate::error::InputError;
use crate::field::{FieldResolver, RemoveField};
use crate::liquidity::PoolSnapshot;

/// Amounts for each field of the removal form. Currency and liquidity
/// amounts are `None` when nothing is being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnAmounts {
    pub liquidity_percent: Percent,
    pub liquidity: Option<Amount>,
    pub currency_a: Option<Amount>,
    pub currency_b: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedBurnInfo {
    pub independent_field: RemoveField,
    pub parsed_amounts: BurnAmounts,
    /// Everything the position is worth in each asset
    pub user_share_a: Option<Amount>,
    pub user_share_b: Option<Amount>,
    /// Position size relative to total supply
    pub pool_share: Option<Percent>,
    pub error: Option<InputError>,
}

impl DerivedBurnInfo {
    /// Pool share as shown in the form, e.g. `"10.00"`
    pub fn pool_share_display(&self) -> Option<String> {
        self.pool_share.as_ref().map(|share| share.to_fixed(2))
    }

    /// Least of each asset accepted back, `slippage` below the derived
    /// amounts
    pub fn minimum_amounts(&self, slippage: &Percent) -> Option<(Amount, Amount)> {
        let keep = slippage.complement();
        let a = self.parsed_amounts.currency_a.as_ref()?;
        let b = self.parsed_amounts.currency_b.as_ref()?;
        Some((
            a.multiply(&keep, Rounding::Down).ok()?,
            b.multiply(&keep, Rounding::Down).ok()?,
        ))
    }
}

/// Whole-number percent text, `0..=100`
fn parse_percent(text: &str) -> Percent {
    match text.trim().parse::<u32>() {
        Ok(p) if p <= 100 => Percent::from_bips(p * 100),
        _ => Percent::zero(),
    }
}

/// `typed` as a fraction of `owned`, provided it parses and does not
/// exceed it
fn fraction_of(typed: &str, currency: &Currency, owned: Option<&Amount>) -> Percent {
    let owned = match owned {
        Some(owned) if !owned.is_zero() => owned,
        _ => return Percent::zero(),
    };
    match codec::parse_with(typed, currency, Precision::Truncate) {
        Ok(Some(parsed)) if parsed.raw() <= owned.raw() => {
            Percent::new(parsed.raw(), owned.raw()).unwrap_or_else(|_| Percent::zero())
        }
        _ => Percent::zero(),
    }
}

pub fn derive_burn_info(
    form: &FieldResolver<RemoveField>,
    account: Option<Address>,
    pool: Option<&PoolSnapshot>,
    user_liquidity: Option<&Amount>,
) -> DerivedBurnInfo {
    let independent_field = form.independent_field();
    let typed = form.typed_value();

    let user_share_a = pool.zip(user_liquidity).and_then(|(p, l)| p.liquidity_value(&p.token_a, l));
    let user_share_b = pool.zip(user_liquidity).and_then(|(p, l)| p.liquidity_value(&p.token_b, l));
    let pool_share = pool
        .zip(user_liquidity)
        .and_then(|(p, l)| Percent::new(l.raw(), p.total_supply).ok());

    let percent_to_remove = match (independent_field, pool) {
        (RemoveField::LiquidityPercent, _) => parse_percent(typed),
        (RemoveField::Liquidity, Some(pool)) => {
            fraction_of(typed, &pool.liquidity_token, user_liquidity)
        }
        (RemoveField::CurrencyA, Some(pool)) => fraction_of(typed, &pool.token_a, user_share_a.as_ref()),
        (RemoveField::CurrencyB, Some(pool)) => fraction_of(typed, &pool.token_b, user_share_b.as_ref()),
        (_, None) => Percent::zero(),
    };
    debug!(field = ?independent_field, percent = %percent_to_remove, "Derived removal fraction");

    let portion = |owned: Option<&Amount>| {
        if percent_to_remove.is_zero() {
            return None;
        }
        owned.and_then(|o| o.multiply(&percent_to_remove, Rounding::Down).ok())
    };
    let parsed_amounts = BurnAmounts {
        liquidity_percent: percent_to_remove,
        liquidity: portion(user_liquidity),
        currency_a: portion(user_share_a.as_ref()),
        currency_b: portion(user_share_b.as_ref()),
    };

    let error = if account.is_none() {
        Some(InputError::NoAccount)
    } else if parsed_amounts.liquidity.is_none()
        && parsed_amounts.currency_a.is_none()
        && parsed_amounts.currency_b.is_none()
    {
        Some(InputError::NoAmount)
    } else {
        None
    };

    DerivedBurnInfo {
        independent_field,
        parsed_amounts,
        user_share_a,
        user_share_b,
        pool_share,
        error,
    }
}
