//! Externally priced trades
//!
//! Trades are produced by the quoting service and only consumed here:
//! compared, bounded by slippage and handed back to the submitter. Each
//! kind of trade is its own variant so every consumer has to say how it
//! handles each one.

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Percent, Price, Rounding};
use crate::config::ContractAddresses;
use crate::currency::{Address, Currency};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

/// One pool traversed by a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool: Address,
    /// LP fee charged by the pool in basis points
    pub fee_bips: u32,
}

/// Ordered currencies from input to output plus the pools in between
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Currency>,
    pub hops: Vec<RouteHop>,
}

impl Route {
    pub fn new(path: Vec<Currency>, hops: Vec<RouteHop>) -> Result<Self, Error> {
        if path.len() < 2 || hops.len() + 1 != path.len() {
            return Err(Error::Other(format!(
                "Route needs n currencies and n-1 hops, got {} and {}",
                path.len(),
                hops.len()
            )));
        }
        Ok(Self { path, hops })
    }
}

/// AMM routed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTrade {
    pub trade_type: TradeType,
    pub route: Route,
    pub input_amount: Amount,
    pub output_amount: Amount,
    /// Price impact reported by the quoting service, LP fees included
    pub price_impact: Percent,
}

/// Resting order filled only at the exact quoted amounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderTrade {
    pub input_amount: Amount,
    pub output_amount: Amount,
    /// Unix seconds after which the order can no longer be filled
    pub expiry: i64,
}

/// Off-chain order filled by a third party filler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentTrade {
    pub trade_type: TradeType,
    pub input_amount: Amount,
    pub output_amount: Amount,
    /// Filler-estimated impact, absent when the filler gave none
    pub price_impact: Option<Percent>,
    pub quote_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trade {
    Swap(SwapTrade),
    LimitOrder(LimitOrderTrade),
    Intent(IntentTrade),
}

impl Trade {
    pub fn trade_type(&self) -> TradeType {
        match self {
            Trade::Swap(t) => t.trade_type,
            Trade::LimitOrder(_) => TradeType::ExactInput,
            Trade::Intent(t) => t.trade_type,
        }
    }

    pub fn input_amount(&self) -> &Amount {
        match self {
            Trade::Swap(t) => &t.input_amount,
            Trade::LimitOrder(t) => &t.input_amount,
            Trade::Intent(t) => &t.input_amount,
        }
    }

    pub fn output_amount(&self) -> &Amount {
        match self {
            Trade::Swap(t) => &t.output_amount,
            Trade::LimitOrder(t) => &t.output_amount,
            Trade::Intent(t) => &t.output_amount,
        }
    }

    pub fn input_currency(&self) -> &Currency {
        self.input_amount().currency()
    }

    pub fn output_currency(&self) -> &Currency {
        self.output_amount().currency()
    }

    pub fn route(&self) -> Option<&Route> {
        match self {
            Trade::Swap(t) => Some(&t.route),
            Trade::LimitOrder(_) | Trade::Intent(_) => None,
        }
    }

    pub fn price_impact(&self) -> Option<Percent> {
        match self {
            Trade::Swap(t) => Some(t.price_impact),
            Trade::LimitOrder(_) => None,
            Trade::Intent(t) => t.price_impact,
        }
    }

    /// Output received per unit of input
    pub fn execution_price(&self) -> Result<Price, Error> {
        Price::from_amounts(self.input_amount(), self.output_amount())
    }

    /// Least output the user accepts. Exact-input trades give up
    /// `slippage` of the quoted output, rounded down.
    pub fn minimum_amount_out(&self, slippage: &Percent) -> Result<Amount, Error> {
        match self {
            Trade::LimitOrder(t) => Ok(t.output_amount.clone()),
            Trade::Swap(_) | Trade::Intent(_) => match self.trade_type() {
                TradeType::ExactOutput => Ok(self.output_amount().clone()),
                TradeType::ExactInput => self
                    .output_amount()
                    .multiply(&slippage.complement(), Rounding::Down),
            },
        }
    }

    /// Most input the user spends. Exact-output trades allow `slippage`
    /// above the quoted input, rounded up.
    pub fn maximum_amount_in(&self, slippage: &Percent) -> Result<Amount, Error> {
        match self {
            Trade::LimitOrder(t) => Ok(t.input_amount.clone()),
            Trade::Swap(_) | Trade::Intent(_) => match self.trade_type() {
                TradeType::ExactInput => Ok(self.input_amount().clone()),
                TradeType::ExactOutput => self
                    .input_amount()
                    .multiply(&slippage.plus_one(), Rounding::Up),
            },
        }
    }

    /// Contract that must be allowed to pull the input token
    pub fn spender(&self, contracts: &ContractAddresses) -> Option<Address> {
        match self {
            Trade::Swap(_) => contracts.router,
            Trade::LimitOrder(_) => contracts.limit_order_reactor,
            Trade::Intent(_) => contracts.intent_reactor,
        }
    }

    /// LP fees of every pool on the route, empty for off-chain fills
    pub fn hop_fees(&self) -> Vec<u32> {
        match self.route() {
            Some(route) => route.hops.iter().map(|h| h.fee_bips).collect(),
            None => Vec::new(),
        }
    }
}

/// What a quote request resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteOutcome {
    Trade(Trade),
    NoRoute,
    InsufficientLiquidity,
}

/// Parameters a quote was requested with. A quote only applies to the form
/// while these still match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub input_currency: Currency,
    pub output_currency: Currency,
    /// Amount of the independent side
    pub amount: Amount,
    pub trade_type: TradeType,
}

/// Latest known quote for the current form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuoteState {
    /// Nothing to quote
    #[default]
    Idle,
    Loading,
    Ready(Trade),
    NoRoute,
    InsufficientLiquidity,
}

impl QuoteState {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            QuoteState::Ready(trade) => Some(trade),
            _ => None,
        }
    }
}

impl From<QuoteOutcome> for QuoteState {
    fn from(outcome: QuoteOutcome) -> Self {
        match outcome {
            QuoteOutcome::Trade(trade) => QuoteState::Ready(trade),
            QuoteOutcome::NoRoute => QuoteState::NoRoute,
            QuoteOutcome::InsufficientLiquidity => QuoteState::InsufficientLiquidity,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use cosmwasm_std::Uint256;

    pub const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    pub const POOL: &str = "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc";

    pub fn weth() -> Currency {
        Currency::token(
            1,
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap(),
            18,
            "WETH",
        )
    }

    pub fn usdc() -> Currency {
        Currency::token(
            1,
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse().unwrap(),
            6,
            "USDC",
        )
    }

    pub fn swap_trade(
        trade_type: TradeType,
        input: Amount,
        output: Amount,
        impact_bips: u32,
    ) -> Trade {
        let route = Route::new(
            vec![input.currency().clone(), output.currency().clone()],
            vec![RouteHop {
                pool: POOL.parse().unwrap(),
                fee_bips: 30,
            }],
        )
        .unwrap();
        Trade::Swap(SwapTrade {
            trade_type,
            route,
            input_amount: input,
            output_amount: output,
            price_impact: Percent::from_bips(impact_bips),
        })
    }

    pub fn amount(currency: Currency, raw: u128) -> Amount {
        Amount::from_raw(currency, Uint256::from(raw))
    }
}
