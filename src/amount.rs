//! Exact amount arithmetic
//!
//! Magnitudes are `Uint256` raw units (the smallest unit of a currency).
//! Every multiplication by a rational goes through `Uint512` so it can
//! neither overflow nor lose precision before the final rounding step.

use std::cmp::Ordering;
use std::fmt;

use cosmwasm_std::{Uint256, Uint512};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::currency::Currency;
use crate::error::Error;

/// Direction of the final integer rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `value * numerator / denominator` rounded as requested.
///
/// Returns `None` when the denominator is zero or the result does not fit
/// in 256 bits.
pub fn mul_div(
    value: Uint256,
    numerator: Uint256,
    denominator: Uint256,
    rounding: Rounding,
) -> Option<Uint256> {
    if denominator.is_zero() {
        return None;
    }
    let product = Uint512::from(value) * Uint512::from(numerator);
    let denominator = Uint512::from(denominator);
    let mut quotient = product / denominator;
    if rounding == Rounding::Up && !(product % denominator).is_zero() {
        quotient += Uint512::one();
    }
    Uint256::try_from(quotient).ok()
}

/// `10^exp` as a 512 bit integer, `None` past `10^154`
pub(crate) fn pow10(exp: u32) -> Option<Uint512> {
    Uint512::from(10u128).checked_pow(exp).ok()
}

/// `value * 10^exp`, `None` on overflow
pub(crate) fn scale_pow10(value: Uint512, exp: u32) -> Option<Uint512> {
    pow10(exp).and_then(|p| value.checked_mul(p).ok())
}

/// Rational number used for slippage, removal fractions and price impact
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawPercent")]
pub struct Percent {
    numerator: Uint256,
    denominator: Uint256,
}

#[derive(Deserialize)]
struct RawPercent {
    numerator: Uint256,
    denominator: Uint256,
}

impl TryFrom<RawPercent> for Percent {
    type Error = Error;

    fn try_from(raw: RawPercent) -> Result<Self, Error> {
        Percent::new(raw.numerator, raw.denominator)
    }
}

impl Percent {
    /// Build `numerator / denominator`, rejecting a zero denominator
    pub fn new(numerator: Uint256, denominator: Uint256) -> Result<Self, Error> {
        if denominator.is_zero() {
            return Err(Error::Other("Percent denominator must be positive".to_string()));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self, Error> {
        Self::new(Uint256::from(numerator), Uint256::from(denominator))
    }

    /// Basis points, `100` bips == 1%
    pub fn from_bips(bips: u32) -> Self {
        Self {
            numerator: Uint256::from(bips as u128),
            denominator: Uint256::from(10_000u128),
        }
    }

    pub fn zero() -> Self {
        Self::from_bips(0)
    }

    pub fn one() -> Self {
        Self::from_bips(10_000)
    }

    pub fn numerator(&self) -> Uint256 {
        self.numerator
    }

    pub fn denominator(&self) -> Uint256 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// `1 - self`, floored at zero
    pub fn complement(&self) -> Self {
        Self {
            numerator: self.denominator.saturating_sub(self.numerator),
            denominator: self.denominator,
        }
    }

    /// `1 + self`
    pub fn plus_one(&self) -> Self {
        Self {
            numerator: self.numerator.saturating_add(self.denominator),
            denominator: self.denominator,
        }
    }

    /// `self - other`, floored at zero
    pub fn saturating_sub(&self, other: &Percent) -> Percent {
        let left = Uint512::from(self.numerator) * Uint512::from(other.denominator);
        let right = Uint512::from(other.numerator) * Uint512::from(self.denominator);
        if left <= right {
            return Percent::zero();
        }
        let numerator = left - right;
        let denominator = Uint512::from(self.denominator) * Uint512::from(other.denominator);
        Self::reduce(numerator, denominator)
    }

    /// Product of two fractions
    pub fn multiply(&self, other: &Percent) -> Percent {
        let numerator = Uint512::from(self.numerator) * Uint512::from(other.numerator);
        let denominator = Uint512::from(self.denominator) * Uint512::from(other.denominator);
        Self::reduce(numerator, denominator)
    }

    /// Apply the fraction to a raw magnitude
    pub fn apply(&self, value: Uint256, rounding: Rounding) -> Option<Uint256> {
        mul_div(value, self.numerator, self.denominator, rounding)
    }

    /// Render as a percentage with a fixed number of decimals, e.g. `"0.50"`
    pub fn to_fixed(&self, places: u32) -> String {
        codec::format_fixed_ratio(
            Uint512::from(self.numerator) * Uint512::from(100u128),
            Uint512::from(self.denominator),
            places,
        )
    }

    /// Render as a percentage with `digits` significant digits
    pub fn to_significant(&self, digits: u32) -> String {
        codec::format_significant_ratio(
            Uint512::from(self.numerator) * Uint512::from(100u128),
            Uint512::from(self.denominator),
            digits,
        )
    }

    fn reduce(mut numerator: Uint512, mut denominator: Uint512) -> Percent {
        let divisor = gcd(numerator, denominator);
        if !divisor.is_zero() {
            numerator /= divisor;
            denominator /= divisor;
        }
        // Both fit after reduction for any inputs produced by this module;
        // saturate rather than panic if a caller composes extreme values.
        Percent {
            numerator: Uint256::try_from(numerator).unwrap_or(Uint256::MAX),
            denominator: Uint256::try_from(denominator).unwrap_or(Uint256::MAX),
        }
    }
}

fn gcd(mut a: Uint512, mut b: Uint512) -> Uint512 {
    while !b.is_zero() {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl PartialEq for Percent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Percent {}

impl PartialOrd for Percent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = Uint512::from(self.numerator) * Uint512::from(other.denominator);
        let right = Uint512::from(other.numerator) * Uint512::from(self.denominator);
        left.cmp(&right)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_fixed(2))
    }
}

/// A magnitude of one currency in its smallest unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    currency: Currency,
    raw: Uint256,
}

impl Amount {
    pub fn from_raw(currency: Currency, raw: impl Into<Uint256>) -> Self {
        Self {
            currency,
            raw: raw.into(),
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::from_raw(currency, Uint256::zero())
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn raw(&self) -> Uint256 {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, Error> {
        self.ensure_same_currency(other)?;
        let raw = self
            .raw
            .checked_add(other.raw)
            .map_err(|e| Error::Other(format!("Amount overflow: {}", e)))?;
        Ok(Amount::from_raw(self.currency.clone(), raw))
    }

    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, Error> {
        self.ensure_same_currency(other)?;
        let raw = self
            .raw
            .checked_sub(other.raw)
            .map_err(|e| Error::Other(format!("Amount underflow: {}", e)))?;
        Ok(Amount::from_raw(self.currency.clone(), raw))
    }

    /// `self - other` floored at zero; currencies must match
    pub fn saturating_sub(&self, other: &Amount) -> Result<Amount, Error> {
        self.ensure_same_currency(other)?;
        Ok(Amount::from_raw(
            self.currency.clone(),
            self.raw.saturating_sub(other.raw),
        ))
    }

    /// Multiply by a fraction, rounding to a whole raw unit
    pub fn multiply(&self, percent: &Percent, rounding: Rounding) -> Result<Amount, Error> {
        let raw = percent
            .apply(self.raw, rounding)
            .ok_or_else(|| Error::Other("Amount overflow while scaling".to_string()))?;
        Ok(Amount::from_raw(self.currency.clone(), raw))
    }

    /// `self / other` as a fraction (both must share a currency)
    pub fn ratio_of(&self, other: &Amount) -> Result<Percent, Error> {
        self.ensure_same_currency(other)?;
        Percent::new(self.raw, other.raw)
    }

    /// Display with at most `digits` significant digits
    pub fn to_significant(&self, digits: u32) -> String {
        codec::format_significant(self, digits)
    }

    /// Display with exactly `places` fractional digits, rounded half up
    pub fn to_fixed(&self, places: u32) -> String {
        match pow10(self.currency.decimals as u32) {
            Some(unit) => codec::format_fixed_ratio(Uint512::from(self.raw), unit, places),
            // raw amounts are below 10^-77 of such a unit
            None => codec::format_fixed_ratio(Uint512::zero(), Uint512::one(), places),
        }
    }

    /// Full precision decimal text without trailing zeros
    pub fn to_exact(&self) -> String {
        codec::format_exact(self)
    }

    fn ensure_same_currency(&self, other: &Amount) -> Result<(), Error> {
        if self.currency != other.currency {
            return Err(Error::Other(format!(
                "Currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }
}

impl PartialOrd for Amount {
    /// Amounts of different currencies are not comparable
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_exact(), self.currency.symbol)
    }
}

/// Exchange rate: how many `quote` units one `base` unit buys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: Currency,
    pub quote: Currency,
    /// Raw quote amount
    numerator: Uint256,
    /// Raw base amount
    denominator: Uint256,
}

impl Price {
    /// Price implied by trading `base_amount` for `quote_amount`
    pub fn from_amounts(base_amount: &Amount, quote_amount: &Amount) -> Result<Self, Error> {
        if base_amount.is_zero() {
            return Err(Error::Other("Price base amount must be positive".to_string()));
        }
        Ok(Self {
            base: base_amount.currency().clone(),
            quote: quote_amount.currency().clone(),
            numerator: quote_amount.raw(),
            denominator: base_amount.raw(),
        })
    }

    pub fn invert(&self) -> Result<Self, Error> {
        if self.numerator.is_zero() {
            return Err(Error::Other("Cannot invert a zero price".to_string()));
        }
        Ok(Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
            numerator: self.denominator,
            denominator: self.numerator,
        })
    }

    /// Convert an amount of `base` into `quote`, rounding down
    pub fn quote(&self, amount: &Amount) -> Result<Amount, Error> {
        if amount.currency() != &self.base {
            return Err(Error::Other(format!(
                "Price is for {}, got {}",
                self.base, amount.currency()
            )));
        }
        let raw = mul_div(amount.raw(), self.numerator, self.denominator, Rounding::Down)
            .ok_or_else(|| Error::Other("Price quote overflow".to_string()))?;
        Ok(Amount::from_raw(self.quote.clone(), raw))
    }

    /// Human readable rate, scaled by both currencies' decimals
    ///
    /// Rates outside what 512 bits can scale fall back to `<digits>e<exp>`.
    pub fn to_significant(&self, digits: u32) -> String {
        let numerator = Uint512::from(self.numerator);
        let denominator = Uint512::from(self.denominator);
        let base = self.base.decimals as u32;
        let quote = self.quote.decimals as u32;
        let ratio = |n, d| codec::format_significant_ratio(n, d, digits);

        if base >= quote {
            let shift = base - quote;
            match scale_pow10(numerator, shift) {
                Some(scaled) => ratio(scaled, denominator),
                None => format!("{}e{}", ratio(numerator, denominator), shift),
            }
        } else {
            let shift = quote - base;
            match scale_pow10(denominator, shift) {
                Some(scaled) => ratio(numerator, scaled),
                None => format!("{}e-{}", ratio(numerator, denominator), shift),
            }
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} per {}",
            self.to_significant(6),
            self.quote.symbol,
            self.base.symbol
        )
    }
}
