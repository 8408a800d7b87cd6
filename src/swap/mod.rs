//! Swap form: state, derivation and slippage settings

pub mod derive;
pub mod slippage;
pub mod state;

pub use derive::{derive_swap_info, DerivedSwapInfo, SlippageBounds, SwapPair};
pub use slippage::{max_amount_spend, SlippageTolerance, SlippageWarning};
pub use state::{SwapAction, SwapFormState};
