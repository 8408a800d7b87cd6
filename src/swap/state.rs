//! Swap form state and its reducer
//!
//! The form is a plain value owned by one session. User events are
//! [`SwapAction`]s; [`SwapFormState::reduce`] returns the next state and
//! never touches the current one.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::currency::Currency;
use crate::field::{FieldResolver, SwapField};

/// Decimals assumed for keystroke filtering before a currency is chosen
const UNSELECTED_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapAction {
    SelectCurrency { field: SwapField, currency: Currency },
    TypeInput { field: SwapField, value: String },
    /// Flip which currency sits in which field
    SwitchCurrencies,
    SetRecipient(Option<String>),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwapFormState {
    pub fields: FieldResolver<SwapField>,
    pub input_currency: Option<Currency>,
    pub output_currency: Option<Currency>,
    /// Raw recipient text, `None` sends to the connected account
    pub recipient: Option<String>,
}

impl SwapFormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a form with both currencies chosen
    pub fn with_currencies(input: Currency, output: Currency) -> Self {
        Self {
            input_currency: Some(input),
            output_currency: Some(output),
            ..Self::default()
        }
    }

    pub fn currency(&self, field: SwapField) -> Option<&Currency> {
        match field {
            SwapField::Input => self.input_currency.as_ref(),
            SwapField::Output => self.output_currency.as_ref(),
        }
    }

    pub fn independent_field(&self) -> SwapField {
        self.fields.independent_field()
    }

    pub fn typed_value(&self) -> &str {
        self.fields.typed_value()
    }

    pub fn reduce(&self, action: &SwapAction) -> Self {
        let mut next = self.clone();
        match action {
            SwapAction::SelectCurrency { field, currency } => {
                let other = field.dependent();
                if next.currency(other) == Some(currency) {
                    next.switch_currencies();
                } else {
                    next.set_currency(*field, Some(currency.clone()));
                }
            }
            SwapAction::TypeInput { field, value } => {
                let decimals = self
                    .currency(*field)
                    .map(|c| c.decimals)
                    .unwrap_or(UNSELECTED_DECIMALS);
                if !codec::accepts_keystroke(value, decimals) {
                    return next;
                }
                next.fields.on_user_input(*field, value.clone());
            }
            SwapAction::SwitchCurrencies => next.switch_currencies(),
            SwapAction::SetRecipient(recipient) => {
                next.recipient = recipient.clone().filter(|r| !r.trim().is_empty());
            }
            SwapAction::Reset => {
                next.fields.reset();
                next.recipient = None;
            }
        }
        next
    }

    fn set_currency(&mut self, field: SwapField, currency: Option<Currency>) {
        match field {
            SwapField::Input => self.input_currency = currency,
            SwapField::Output => self.output_currency = currency,
        }
    }

    /// Only currencies move; the independent field and its text stay put
    fn switch_currencies(&mut self) {
        std::mem::swap(&mut self.input_currency, &mut self.output_currency);
    }
}
