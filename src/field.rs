//! Form fields and independent-field tracking
//!
//! A form remembers only the field the user last typed into and the raw
//! text they typed. Every other field is recomputed from quotes or pool
//! facts and never stored.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// A closed family of form fields
pub trait FormField: Copy + Eq + Debug {
    /// Field that is independent when a form is first opened
    fn initial() -> Self;
}

/// Two-sided swap form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapField {
    Input,
    Output,
}

impl SwapField {
    /// The field computed from the quote when `self` is independent
    pub fn dependent(self) -> Self {
        match self {
            SwapField::Input => SwapField::Output,
            SwapField::Output => SwapField::Input,
        }
    }
}

impl FormField for SwapField {
    fn initial() -> Self {
        SwapField::Input
    }
}

/// Liquidity removal form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoveField {
    CurrencyA,
    CurrencyB,
    Liquidity,
    LiquidityPercent,
}

impl FormField for RemoveField {
    fn initial() -> Self {
        RemoveField::LiquidityPercent
    }
}

/// Liquidity provision form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MintField {
    CurrencyA,
    CurrencyB,
}

impl MintField {
    pub fn dependent(self) -> Self {
        match self {
            MintField::CurrencyA => MintField::CurrencyB,
            MintField::CurrencyB => MintField::CurrencyA,
        }
    }
}

impl FormField for MintField {
    fn initial() -> Self {
        MintField::CurrencyA
    }
}

/// Which field is independent and what was typed into it.
///
/// Exactly one field is independent at any time; a new write always
/// replaces the previous one, the two are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResolver<F> {
    independent_field: F,
    typed_value: String,
}

impl<F: FormField> Default for FieldResolver<F> {
    fn default() -> Self {
        Self {
            independent_field: F::initial(),
            typed_value: String::new(),
        }
    }
}

impl<F: FormField> FieldResolver<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn independent_field(&self) -> F {
        self.independent_field
    }

    pub fn typed_value(&self) -> &str {
        &self.typed_value
    }

    pub fn is_independent(&self, field: F) -> bool {
        self.independent_field == field
    }

    /// Record a keystroke: `field` becomes independent, `value` replaces
    /// whatever was typed before
    pub fn on_user_input(&mut self, field: F, value: impl Into<String>) {
        self.independent_field = field;
        self.typed_value = value.into();
    }

    /// Back to the freshly opened state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
