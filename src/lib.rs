pub mod amount;
pub mod approval;
pub mod codec;
pub mod config;
pub mod currency;
pub mod error;
pub mod field;
pub mod liquidity;
pub mod logging;
pub mod memo;
pub mod price_impact;
pub mod provider;
pub mod session;
pub mod staleness;
pub mod subscription;
pub mod swap;
pub mod trade;

pub use amount::{Amount, Percent, Price, Rounding};
pub use approval::{ApprovalKey, ApprovalState, ApprovalTracker};
pub use config::{ContractAddresses, PriceImpactThresholds, Settings};
pub use currency::{Address, Currency, CurrencyId};
pub use error::{Error, ExecutionError, InputError, ParseError, ProviderError, SubmitBlock};
pub use field::{FieldResolver, FormField, MintField, RemoveField, SwapField};
pub use liquidity::{derive_burn_info, derive_mint_info, PoolSnapshot};
pub use logging::{init_logging, LoggingConfig};
pub use price_impact::Severity;
pub use provider::{ChainReader, ExecutionRequest, TradeQuoter, TransactionSubmitter, TxHash};
pub use session::{SubmissionRecord, SwapSession};
pub use staleness::{trade_meaningfully_differs, Confirmation};
pub use subscription::{Keyed, PollLease};
pub use swap::{derive_swap_info, DerivedSwapInfo, SwapAction, SwapFormState, SwapPair};
pub use trade::{QuoteOutcome, QuoteRequest, QuoteState, Trade, TradeType};

// Re-export the integer types amounts are built on
pub use cosmwasm_std::{Uint256, Uint512};
