//! Quote staleness detection
//!
//! Confirmation is two-phase: the trade shown to the user is snapshotted
//! when the confirmation opens, and re-compared against the latest quote
//! right before sending. A difference blocks the send until the user
//! accepts the updated trade.

use tracing::debug;

use crate::error::SubmitBlock;
use crate::trade::Trade;

/// Whether `latest` is different enough from `confirmed` that the user has
/// to see it again. Amounts are compared exactly.
pub fn trade_meaningfully_differs(confirmed: &Trade, latest: &Trade) -> bool {
    confirmed.trade_type() != latest.trade_type()
        || confirmed.input_currency() != latest.input_currency()
        || confirmed.input_amount().raw() != latest.input_amount().raw()
        || confirmed.output_currency() != latest.output_currency()
        || confirmed.output_amount().raw() != latest.output_amount().raw()
}

/// An open confirmation prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    trade_to_confirm: Trade,
}

impl Confirmation {
    /// Phase one: snapshot the trade the user is asked to confirm
    pub fn open(trade: Trade) -> Self {
        Self {
            trade_to_confirm: trade,
        }
    }

    pub fn trade(&self) -> &Trade {
        &self.trade_to_confirm
    }

    /// Whether the prompt should show an "accept updated price" action
    pub fn needs_acceptance(&self, latest: Option<&Trade>) -> bool {
        latest.is_some_and(|latest| trade_meaningfully_differs(&self.trade_to_confirm, latest))
    }

    /// The user accepted the updated trade; it becomes the new snapshot
    pub fn accept(&mut self, latest: Trade) {
        debug!(
            input = %latest.input_amount(),
            output = %latest.output_amount(),
            "Accepted updated trade"
        );
        self.trade_to_confirm = latest;
    }

    /// Phase two: the trade to send, provided it still matches the latest
    /// quote
    pub fn check_before_send(&self, latest: Option<&Trade>) -> Result<&Trade, SubmitBlock> {
        match latest {
            None => Err(SubmitBlock::AwaitingQuote),
            Some(latest) if trade_meaningfully_differs(&self.trade_to_confirm, latest) => {
                Err(SubmitBlock::StaleTrade)
            }
            Some(_) => Ok(&self.trade_to_confirm),
        }
    }
}
