//! Token approval state machine
//!
//! ```text
//!   UNKNOWN --read ok--> APPROVED
//!   UNKNOWN --read low--> NOT_APPROVED --submit--> PENDING --read ok--> APPROVED
//!                                     ^                   |
//!                                     +------failed-------+
//! ```
//!
//! Any change of token, spender or required amount goes back to UNKNOWN.
//! PENDING only resolves through a later allowance read, never through the
//! transaction receipt, so a lagging provider cannot flip it early.

use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::currency::{Address, Currency};
use crate::error::Error;
use crate::provider::TxHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Unknown,
    NotApproved,
    Pending,
    Approved,
}

/// What has to be approved: `spender` moving `required` of `token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalKey {
    pub token: Currency,
    pub spender: Address,
    pub required: Uint256,
}

/// Amount to put in the approval transaction
pub fn amount_to_approve(required: Uint256, approve_exact: bool) -> Uint256 {
    if approve_exact {
        required
    } else {
        Uint256::MAX
    }
}

#[derive(Debug, Clone)]
pub struct ApprovalTracker {
    key: Option<ApprovalKey>,
    state: ApprovalState,
    last_allowance: Option<Uint256>,
    pending_tx: Option<TxHash>,
}

impl Default for ApprovalTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalTracker {
    pub fn new() -> Self {
        Self {
            key: None,
            state: ApprovalState::Unknown,
            last_allowance: None,
            pending_tx: None,
        }
    }

    pub fn state(&self) -> ApprovalState {
        self.state
    }

    pub fn key(&self) -> Option<&ApprovalKey> {
        self.key.as_ref()
    }

    pub fn last_allowance(&self) -> Option<Uint256> {
        self.last_allowance
    }

    pub fn pending_tx(&self) -> Option<&TxHash> {
        self.pending_tx.as_ref()
    }

    /// Point the tracker at a new requirement. Anything judged for a
    /// different requirement is forgotten.
    pub fn set_requirement(&mut self, key: Option<ApprovalKey>) {
        if self.key == key {
            return;
        }
        debug!(?key, "Approval requirement changed");

        self.state = match &key {
            Some(k) if k.token.is_native() => ApprovalState::Approved,
            _ => ApprovalState::Unknown,
        };
        self.key = key;
        self.last_allowance = None;
        self.pending_tx = None;
    }

    /// Whether the token needs an allowance at all
    pub fn requires_approval(&self) -> bool {
        self.key.as_ref().is_some_and(|k| !k.token.is_native())
    }

    /// Whether approval is required and not yet confirmed on-chain
    pub fn blocks_submit(&self) -> bool {
        self.requires_approval() && self.state != ApprovalState::Approved
    }

    /// Apply an allowance read. Reads for any other requirement than the
    /// current one are discarded.
    pub fn on_allowance(&mut self, key: &ApprovalKey, allowance: Uint256) -> ApprovalState {
        let Some(current) = self.key.as_ref().filter(|current| *current == key) else {
            debug!(?key, "Discarding allowance read for superseded requirement");
            return self.state;
        };
        if current.token.is_native() {
            return self.state;
        }

        let sufficient = allowance >= current.required;
        self.last_allowance = Some(allowance);

        let next = match (self.state, sufficient) {
            (_, true) => ApprovalState::Approved,
            (ApprovalState::Pending, false) => ApprovalState::Pending,
            (_, false) => ApprovalState::NotApproved,
        };
        if next != self.state {
            info!(
                token = %current.token,
                spender = %current.spender,
                allowance = %allowance,
                from = ?self.state,
                to = ?next,
                "Approval state changed"
            );
        }
        if next == ApprovalState::Approved {
            self.pending_tx = None;
        }
        self.state = next;
        self.state
    }

    /// An approval transaction was handed to the signer and accepted
    pub fn on_approval_submitted(&mut self, key: &ApprovalKey, tx: TxHash) -> Result<(), Error> {
        self.ensure_current(key)?;
        if self.state != ApprovalState::NotApproved {
            return Err(Error::InvalidTransition(format!(
                "cannot submit approval from {:?}",
                self.state
            )));
        }
        info!(tx = %tx, token = %key.token, "Approval submitted");
        self.pending_tx = Some(tx);
        self.state = ApprovalState::Pending;
        Ok(())
    }

    /// The approval transaction failed or was dropped
    pub fn on_approval_failed(&mut self, key: &ApprovalKey) -> Result<(), Error> {
        self.ensure_current(key)?;
        if self.state != ApprovalState::Pending {
            return Err(Error::InvalidTransition(format!(
                "no pending approval to fail in {:?}",
                self.state
            )));
        }
        info!(token = %key.token, "Approval failed");
        self.pending_tx = None;
        self.state = ApprovalState::NotApproved;
        Ok(())
    }

    fn ensure_current(&self, key: &ApprovalKey) -> Result<(), Error> {
        if self.key.as_ref() != Some(key) {
            return Err(Error::InvalidTransition(
                "approval requirement has changed".to_string(),
            ));
        }
        Ok(())
    }
}
