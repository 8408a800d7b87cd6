//! Liquidity provision derivation
//!
//! With an existing pool the dependent amount follows the reserve ratio.
//! A pool without liquidity has no ratio yet, so both amounts are typed
//! and the second typed value is remembered alongside the independent one.

use cosmwasm_std::{Uint256, Uint512};
use serde::{Deserialize, Serialize};

use crate::amount::{mul_div, Amount, Percent, Rounding};
use crate::codec;
use crate::currency::{Address, Currency};
use crate::error::InputError;
use crate::field::{FieldResolver, MintField};
use crate::liquidity::PoolSnapshot;

/// Liquidity locked forever by the first deposit into a pool
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MintFormState {
    pub fields: FieldResolver<MintField>,
    /// Text of the dependent field, only meaningful while the pool is empty
    pub other_typed_value: String,
}

impl MintFormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_user_input(&mut self, field: MintField, value: impl Into<String>, no_liquidity: bool) {
        let value = value.into();
        if !no_liquidity {
            self.other_typed_value.clear();
        } else if !self.fields.is_independent(field) {
            self.other_typed_value = self.fields.typed_value().to_string();
        }
        self.fields.on_user_input(field, value);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMintInfo {
    pub independent_field: MintField,
    pub dependent_field: MintField,
    pub no_liquidity: bool,
    pub amount_a: Option<Amount>,
    pub amount_b: Option<Amount>,
    pub liquidity_minted: Option<Amount>,
    /// Share of the pool held after the deposit
    pub pool_share: Option<Percent>,
    pub error: Option<InputError>,
}

fn currency_of(pool: &PoolSnapshot, field: MintField) -> &Currency {
    match field {
        MintField::CurrencyA => &pool.token_a,
        MintField::CurrencyB => &pool.token_b,
    }
}

/// Floor of the square root
fn isqrt(n: Uint512) -> Uint512 {
    if n.is_zero() {
        return n;
    }
    let two = Uint512::from(2u128);
    let mut x = n;
    let mut y = (x + Uint512::one()) / two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}

/// Liquidity tokens minted for depositing `a` and `b`
fn minted_liquidity(pool: &PoolSnapshot, a: &Amount, b: &Amount) -> Option<Amount> {
    let raw = if pool.total_supply.is_zero() {
        let root = isqrt(Uint512::from(a.raw()) * Uint512::from(b.raw()));
        let root = Uint256::try_from(root).ok()?;
        root.checked_sub(Uint256::from(MINIMUM_LIQUIDITY)).ok()?
    } else {
        let by_a = mul_div(a.raw(), pool.total_supply, pool.reserve_a, Rounding::Down)?;
        let by_b = mul_div(b.raw(), pool.total_supply, pool.reserve_b, Rounding::Down)?;
        by_a.min(by_b)
    };
    if raw.is_zero() {
        return None;
    }
    Some(Amount::from_raw(pool.liquidity_token.clone(), raw))
}

pub fn derive_mint_info(
    form: &MintFormState,
    account: Option<Address>,
    pool: &PoolSnapshot,
    balances: (Option<&Amount>, Option<&Amount>),
) -> DerivedMintInfo {
    let independent_field = form.fields.independent_field();
    let dependent_field = independent_field.dependent();
    let no_liquidity = !pool.has_liquidity();

    let independent_currency = currency_of(pool, independent_field);
    let dependent_currency = currency_of(pool, dependent_field);
    let independent_amount = codec::parse(form.fields.typed_value(), independent_currency)
        .ok()
        .flatten();

    let dependent_amount = if no_liquidity {
        codec::parse(&form.other_typed_value, dependent_currency).ok().flatten()
    } else {
        independent_amount.as_ref().and_then(|amount| {
            let reserve_in = pool.reserve_of(independent_currency)?;
            let reserve_out = pool.reserve_of(dependent_currency)?;
            let raw = mul_div(amount.raw(), reserve_out, reserve_in, Rounding::Down)?;
            Some(Amount::from_raw(dependent_currency.clone(), raw))
        })
    };

    let (amount_a, amount_b) = match independent_field {
        MintField::CurrencyA => (independent_amount, dependent_amount),
        MintField::CurrencyB => (dependent_amount, independent_amount),
    };

    let liquidity_minted = match (&amount_a, &amount_b) {
        (Some(a), Some(b)) => minted_liquidity(pool, a, b),
        _ => None,
    };
    let pool_share = liquidity_minted.as_ref().and_then(|minted| {
        let after = pool.total_supply.checked_add(minted.raw()).ok()?;
        Percent::new(minted.raw(), after).ok()
    });

    let error = mint_error(account, &amount_a, &amount_b, balances);

    DerivedMintInfo {
        independent_field,
        dependent_field,
        no_liquidity,
        amount_a,
        amount_b,
        liquidity_minted,
        pool_share,
        error,
    }
}

fn mint_error(
    account: Option<Address>,
    amount_a: &Option<Amount>,
    amount_b: &Option<Amount>,
    balances: (Option<&Amount>, Option<&Amount>),
) -> Option<InputError> {
    if account.is_none() {
        return Some(InputError::NoAccount);
    }
    let (a, b) = match (amount_a, amount_b) {
        (Some(a), Some(b)) if !a.is_zero() && !b.is_zero() => (a, b),
        _ => return Some(InputError::NoAmount),
    };
    for (amount, balance) in [(a, balances.0), (b, balances.1)] {
        if balance.is_some_and(|balance| balance < amount) {
            return Some(InputError::InsufficientBalance {
                symbol: amount.currency().symbol.clone(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::*;

    fn lp() -> Currency {
        Currency::token(1, POOL.parse().unwrap(), 0, "UNI-V2")
    }

    fn plain_token(symbol: &str, address: &str) -> Currency {
        Currency::token(1, address.parse().unwrap(), 0, symbol)
    }

    fn tka() -> Currency {
        plain_token("TKA", "0x1111111111111111111111111111111111111111")
    }

    fn tkb() -> Currency {
        plain_token("TKB", "0x2222222222222222222222222222222222222222")
    }

    fn funded_pool() -> PoolSnapshot {
        PoolSnapshot {
            token_a: tka(),
            token_b: tkb(),
            liquidity_token: lp(),
            reserve_a: Uint256::from(2_000u128),
            reserve_b: Uint256::from(4_000u128),
            total_supply: Uint256::from(10_000u128),
        }
    }

    fn account() -> Option<Address> {
        Some(ROUTER.parse().unwrap())
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(Uint512::zero()), Uint512::zero());
        assert_eq!(isqrt(Uint512::from(1u128)), Uint512::from(1u128));
        assert_eq!(isqrt(Uint512::from(15u128)), Uint512::from(3u128));
        assert_eq!(isqrt(Uint512::from(16u128)), Uint512::from(4u128));
        assert_eq!(isqrt(Uint512::from(1_000_000u128)), Uint512::from(1_000u128));
    }

    #[test]
    fn test_dependent_amount_follows_reserves() {
        let mut form = MintFormState::new();
        form.on_user_input(MintField::CurrencyB, "101", false);
        let info = derive_mint_info(&form, account(), &funded_pool(), (None, None));

        assert!(!info.no_liquidity);
        assert_eq!(info.dependent_field, MintField::CurrencyA);
        // 101 * 2000 / 4000 = 50.5
        assert_eq!(info.amount_a, Some(amount(tka(), 50)));
        // min(50 * 10000 / 2000, 101 * 10000 / 4000) = min(250, 252)
        assert_eq!(info.liquidity_minted, Some(amount(lp(), 250)));
        assert_eq!(info.pool_share.unwrap(), Percent::from_ratio(250, 10_250).unwrap());
        assert_eq!(info.error, None);
    }

    #[test]
    fn test_empty_pool_keeps_both_typed_values() {
        let pool = PoolSnapshot::empty(tka(), tkb(), lp());
        let mut form = MintFormState::new();
        form.on_user_input(MintField::CurrencyA, "4000", true);
        form.on_user_input(MintField::CurrencyB, "9000", true);

        let info = derive_mint_info(&form, account(), &pool, (None, None));
        assert!(info.no_liquidity);
        assert_eq!(info.amount_a, Some(amount(tka(), 4_000)));
        assert_eq!(info.amount_b, Some(amount(tkb(), 9_000)));
        // sqrt(36_000_000) - 1000
        assert_eq!(info.liquidity_minted, Some(amount(lp(), 5_000)));
        assert_eq!(info.pool_share.unwrap(), Percent::one());
    }

    #[test]
    fn test_errors() {
        let mut form = MintFormState::new();
        form.on_user_input(MintField::CurrencyA, "100", false);

        let no_account = derive_mint_info(&form, None, &funded_pool(), (None, None));
        assert_eq!(no_account.error, Some(InputError::NoAccount));

        let balance_a = amount(tka(), 1_000);
        let balance_b = amount(tkb(), 150);
        let short = derive_mint_info(&form, account(), &funded_pool(), (Some(&balance_a), Some(&balance_b)));
        assert_eq!(
            short.error,
            Some(InputError::InsufficientBalance {
                symbol: "TKB".to_string()
            })
        );

        form.on_user_input(MintField::CurrencyA, "", false);
        let empty = derive_mint_info(&form, account(), &funded_pool(), (None, None));
        assert_eq!(empty.error, Some(InputError::NoAmount));
    }
}
