//! Swap derivation
//!
//! [`derive_swap_info`] is a pure function of the form, the latest quote,
//! balances and slippage. It never fails: anything that prevents a swap is
//! reported through `input_error`.

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Percent};
use crate::codec;
use crate::currency::{Address, Currency};
use crate::error::{InputError, ParseError};
use crate::field::SwapField;
use crate::swap::state::SwapFormState;
use crate::trade::{QuoteState, Trade, TradeType};

/// One value per side of the swap form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwapPair<T> {
    pub input: T,
    pub output: T,
}

impl<T> SwapPair<T> {
    pub fn new(input: T, output: T) -> Self {
        Self { input, output }
    }

    pub fn get(&self, field: SwapField) -> &T {
        match field {
            SwapField::Input => &self.input,
            SwapField::Output => &self.output,
        }
    }

    fn set(&mut self, field: SwapField, value: T) {
        match field {
            SwapField::Input => self.input = value,
            SwapField::Output => self.output = value,
        }
    }
}

/// Amounts the submitter is held to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageBounds {
    pub minimum_amount_out: Amount,
    pub maximum_amount_in: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSwapInfo {
    pub independent_field: SwapField,
    pub dependent_field: SwapField,
    pub currencies: SwapPair<Option<Currency>>,
    pub parsed_amounts: SwapPair<Option<Amount>>,
    pub currency_balances: SwapPair<Option<Amount>>,
    /// The quote, only when it was priced for what the form currently shows
    pub trade: Option<Trade>,
    pub input_error: Option<InputError>,
    pub slippage_adjusted: Option<SlippageBounds>,
    /// Why the typed text did not parse, if it did not
    pub parse_error: Option<ParseError>,
}

impl DerivedSwapInfo {
    pub fn parsed_amount(&self, field: SwapField) -> Option<&Amount> {
        self.parsed_amounts.get(field).as_ref()
    }

    /// Text for `field`: what was typed for the independent side, the
    /// quoted amount for the other
    pub fn formatted_amount(&self, form: &SwapFormState, field: SwapField) -> String {
        if field == self.independent_field {
            return form.typed_value().to_string();
        }
        self.parsed_amount(field)
            .map(|a| codec::format_significant(a, 6))
            .unwrap_or_default()
    }
}

fn trade_type_for(independent: SwapField) -> TradeType {
    match independent {
        SwapField::Input => TradeType::ExactInput,
        SwapField::Output => TradeType::ExactOutput,
    }
}

/// The quoted trade, if it was priced for this form's currencies and
/// direction
fn matching_trade<'a>(form: &SwapFormState, quote: &'a QuoteState) -> Option<&'a Trade> {
    let trade = quote.trade()?;
    let matches = Some(trade.input_currency()) == form.input_currency.as_ref()
        && Some(trade.output_currency()) == form.output_currency.as_ref()
        && trade.trade_type() == trade_type_for(form.independent_field());
    matches.then_some(trade)
}

pub fn derive_swap_info(
    form: &SwapFormState,
    account: Option<Address>,
    balances: &SwapPair<Option<Amount>>,
    quote: &QuoteState,
    slippage: &Percent,
) -> DerivedSwapInfo {
    let independent_field = form.independent_field();
    let dependent_field = independent_field.dependent();
    let currencies = SwapPair::new(form.input_currency.clone(), form.output_currency.clone());

    let (independent_amount, parse_error) = match currencies.get(independent_field) {
        Some(currency) => match codec::parse(form.typed_value(), currency) {
            Ok(amount) => (amount, None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };
    let has_amount = independent_amount.as_ref().is_some_and(|a| !a.is_zero());

    let trade = if has_amount {
        matching_trade(form, quote).cloned()
    } else {
        None
    };

    let mut parsed_amounts = SwapPair::default();
    parsed_amounts.set(independent_field, independent_amount);
    if let Some(trade) = &trade {
        let dependent_amount = match dependent_field {
            SwapField::Input => trade.input_amount().clone(),
            SwapField::Output => trade.output_amount().clone(),
        };
        parsed_amounts.set(dependent_field, Some(dependent_amount));
    }

    let slippage_adjusted = trade.as_ref().and_then(|trade| {
        Some(SlippageBounds {
            minimum_amount_out: trade.minimum_amount_out(slippage).ok()?,
            maximum_amount_in: trade.maximum_amount_in(slippage).ok()?,
        })
    });

    let input_error = input_error(
        form,
        account,
        has_amount,
        &currencies,
        quote,
        trade.as_ref(),
        &parsed_amounts,
        slippage_adjusted.as_ref(),
        balances,
    );

    DerivedSwapInfo {
        independent_field,
        dependent_field,
        currencies,
        parsed_amounts,
        currency_balances: balances.clone(),
        trade,
        input_error,
        slippage_adjusted,
        parse_error,
    }
}

/// First blocking condition in priority order
#[allow(clippy::too_many_arguments)]
fn input_error(
    form: &SwapFormState,
    account: Option<Address>,
    has_amount: bool,
    currencies: &SwapPair<Option<Currency>>,
    quote: &QuoteState,
    trade: Option<&Trade>,
    parsed_amounts: &SwapPair<Option<Amount>>,
    bounds: Option<&SlippageBounds>,
    balances: &SwapPair<Option<Amount>>,
) -> Option<InputError> {
    if account.is_none() {
        return Some(InputError::NoAccount);
    }
    if !has_amount {
        return Some(InputError::NoAmount);
    }
    if currencies.input.is_none() || currencies.output.is_none() {
        return Some(InputError::SelectCurrency);
    }
    if let Some(recipient) = &form.recipient {
        if !Address::is_valid(recipient.trim()) {
            return Some(InputError::InvalidRecipient);
        }
    }
    if trade.is_none() {
        match quote {
            QuoteState::NoRoute => return Some(InputError::NoRoute),
            QuoteState::InsufficientLiquidity => return Some(InputError::InsufficientLiquidity),
            QuoteState::Idle | QuoteState::Loading | QuoteState::Ready(_) => {}
        }
    }

    let amount_in = bounds
        .map(|b| &b.maximum_amount_in)
        .or(parsed_amounts.input.as_ref());
    if let (Some(balance), Some(amount_in)) = (&balances.input, amount_in) {
        if balance < amount_in {
            return Some(InputError::InsufficientBalance {
                symbol: amount_in.currency().symbol.clone(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::state::SwapAction;
    use crate::trade::fixtures::*;
    use cosmwasm_std::Uint256;

    fn account() -> Option<Address> {
        Some(ROUTER.parse().unwrap())
    }

    fn form(field: SwapField, value: &str) -> SwapFormState {
        SwapFormState::with_currencies(usdc(), weth()).reduce(&SwapAction::TypeInput {
            field,
            value: value.to_string(),
        })
    }

    fn balances(usdc_raw: u128) -> SwapPair<Option<Amount>> {
        SwapPair::new(Some(amount(usdc(), usdc_raw)), Some(amount(weth(), 0)))
    }

    fn exact_in_quote(input: u128, output: u128) -> QuoteState {
        QuoteState::Ready(swap_trade(
            TradeType::ExactInput,
            amount(usdc(), input),
            amount(weth(), output),
            10,
        ))
    }

    #[test]
    fn test_empty_text_is_no_amount_not_insufficient_balance() {
        let info = derive_swap_info(
            &form(SwapField::Input, ""),
            account(),
            &balances(0),
            &exact_in_quote(10_000_000, 5),
            &Percent::from_bips(50),
        );
        assert_eq!(info.parsed_amounts.input, None);
        assert_eq!(info.parsed_amounts.output, None);
        assert_eq!(info.input_error, Some(InputError::NoAmount));
        assert!(info.trade.is_none());
    }

    #[test]
    fn test_no_account_wins() {
        let info = derive_swap_info(
            &form(SwapField::Input, ""),
            None,
            &balances(0),
            &QuoteState::Idle,
            &Percent::from_bips(50),
        );
        assert_eq!(info.input_error, Some(InputError::NoAccount));
    }

    #[test]
    fn test_zero_is_no_amount() {
        let info = derive_swap_info(
            &form(SwapField::Input, "0"),
            account(),
            &balances(0),
            &QuoteState::Idle,
            &Percent::from_bips(50),
        );
        assert_eq!(info.parsed_amounts.input, Some(amount(usdc(), 0)));
        assert_eq!(info.input_error, Some(InputError::NoAmount));
    }

    #[test]
    fn test_dependent_amount_comes_from_trade() {
        let info = derive_swap_info(
            &form(SwapField::Input, "10"),
            account(),
            &balances(100_000_000),
            &exact_in_quote(10_000_000, 5_000),
            &Percent::from_bips(50),
        );
        assert_eq!(info.dependent_field, SwapField::Output);
        assert_eq!(info.parsed_amounts.input, Some(amount(usdc(), 10_000_000)));
        assert_eq!(info.parsed_amounts.output, Some(amount(weth(), 5_000)));
        assert_eq!(info.input_error, None);

        let bounds = info.slippage_adjusted.unwrap();
        assert_eq!(bounds.minimum_amount_out.raw(), Uint256::from(4_975u128));
        assert_eq!(bounds.maximum_amount_in.raw(), Uint256::from(10_000_000u128));
    }

    #[test]
    fn test_trade_for_other_direction_is_ignored() {
        let info = derive_swap_info(
            &form(SwapField::Output, "1"),
            account(),
            &balances(100_000_000),
            &exact_in_quote(10_000_000, 5_000),
            &Percent::from_bips(50),
        );
        assert!(info.trade.is_none());
        assert_eq!(info.parsed_amounts.input, None);
        assert_eq!(info.input_error, None);
    }

    #[test]
    fn test_route_errors() {
        let no_route = derive_swap_info(
            &form(SwapField::Input, "10"),
            account(),
            &balances(100_000_000),
            &QuoteState::NoRoute,
            &Percent::from_bips(50),
        );
        assert_eq!(no_route.input_error, Some(InputError::NoRoute));

        let thin = derive_swap_info(
            &form(SwapField::Input, "10"),
            account(),
            &balances(0),
            &QuoteState::InsufficientLiquidity,
            &Percent::from_bips(50),
        );
        assert_eq!(thin.input_error, Some(InputError::InsufficientLiquidity));
    }

    #[test]
    fn test_insufficient_balance_uses_maximum_in() {
        // exact output: 1001 * 1.005 rounds up to 1007 > 1005
        let quote = QuoteState::Ready(swap_trade(
            TradeType::ExactOutput,
            amount(usdc(), 1_001),
            amount(weth(), 1_000_000_000_000_000),
            10,
        ));
        let info = derive_swap_info(
            &form(SwapField::Output, "0.001"),
            account(),
            &balances(1_005),
            &quote,
            &Percent::from_bips(50),
        );
        assert_eq!(
            info.input_error,
            Some(InputError::InsufficientBalance {
                symbol: "USDC".to_string()
            })
        );
    }

    #[test]
    fn test_select_currency_and_recipient() {
        let missing = SwapFormState {
            output_currency: None,
            ..form(SwapField::Input, "1")
        };
        let info = derive_swap_info(
            &missing,
            account(),
            &balances(0),
            &QuoteState::Idle,
            &Percent::from_bips(50),
        );
        assert_eq!(info.input_error, Some(InputError::SelectCurrency));

        let bad_recipient =
            form(SwapField::Input, "1").reduce(&SwapAction::SetRecipient(Some("vitalik".to_string())));
        let info = derive_swap_info(
            &bad_recipient,
            account(),
            &balances(0),
            &QuoteState::NoRoute,
            &Percent::from_bips(50),
        );
        assert_eq!(info.input_error, Some(InputError::InvalidRecipient));
    }

    #[test]
    fn test_parse_error_is_reported_as_no_amount() {
        let typed = SwapFormState {
            fields: {
                let mut fields = crate::field::FieldResolver::new();
                fields.on_user_input(SwapField::Input, "1.2.3");
                fields
            },
            ..SwapFormState::with_currencies(usdc(), weth())
        };
        let info = derive_swap_info(
            &typed,
            account(),
            &balances(0),
            &QuoteState::Idle,
            &Percent::from_bips(50),
        );
        assert!(info.parse_error.is_some());
        assert_eq!(info.input_error, Some(InputError::NoAmount));
    }
}
