use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest provider message shown to the user before truncation
pub const MAX_DISPLAY_MESSAGE_LEN: usize = 150;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Amount text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// External collaborator (quoter, reader, signer) failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Slippage tolerance text or value rejected
    #[error("Invalid slippage: {0}")]
    InvalidSlippage(String),

    /// A state machine was asked to perform a transition it does not allow
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Submission failed after classification
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Submission was blocked by the submit gate
    #[error("Submit blocked: {0}")]
    Blocked(#[from] SubmitBlock),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Failure to turn typed text into an [`crate::amount::Amount`]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseError {
    #[error("invalid decimal number: '{0}'")]
    InvalidNumber(String),

    #[error("'{text}' has more than {decimals} fractional digits")]
    TooManyDecimals { text: String, decimals: u8 },

    #[error("'{0}' does not fit in 256 bits")]
    Overflow(String),
}

/// Raw failure returned by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    /// Provider specific error code, when one was reported (e.g. 4001)
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Reason the current form inputs cannot produce a transaction.
///
/// Variants are listed in evaluation priority: the first matching kind is
/// reported.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputError {
    #[error("Connect wallet")]
    NoAccount,

    #[error("Enter an amount")]
    NoAmount,

    #[error("Select a token")]
    SelectCurrency,

    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("No route found for this trade")]
    NoRoute,

    #[error("Insufficient liquidity for this trade")]
    InsufficientLiquidity,

    #[error("Insufficient {symbol} balance")]
    InsufficientBalance { symbol: String },
}

/// Reason the submit action is disabled even though inputs may be valid
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitBlock {
    #[error("{0}")]
    Input(InputError),

    #[error("Waiting for a quote")]
    AwaitingQuote,

    #[error("No spender configured for {symbol}")]
    MissingSpender { symbol: String },

    #[error("Approve {symbol} first")]
    ApprovalRequired { symbol: String },

    #[error("Price impact too high, acknowledgement required")]
    PriceImpactUnacknowledged,

    #[error("Price impact too high, expert mode required")]
    PriceImpactTooHigh,

    #[error("Price updated, accept the new price to continue")]
    StaleTrade,

}

/// Classified failure of an approval or swap submission
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionError {
    #[error("Transaction rejected")]
    UserRejected,

    #[error("Too many requests, try again shortly")]
    RateLimited,

    #[error("Network error, try again")]
    TransportError,

    #[error("Price moved beyond your slippage tolerance")]
    SlippageExceeded,

    #[error("Transaction failed: {display}")]
    UnknownExecutionError { display: String, detail: String },
}

const REJECTION_MARKERS: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected the request",
    "user cancelled",
];
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "rate-limit", "429", "too many requests"];
const TRANSPORT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection",
    "failed to fetch",
    "econnrefused",
    "502",
    "503",
];
const SLIPPAGE_MARKERS: &[&str] = &[
    "insufficient_output_amount",
    "excessive_input_amount",
    "too little received",
    "too much requested",
];

impl ExecutionError {
    /// Classify a provider failure from its code and message text
    pub fn classify(error: &ProviderError) -> Self {
        if error.code == Some(4001) {
            return Self::UserRejected;
        }
        if error.code == Some(429) {
            return Self::RateLimited;
        }

        let lowered = error.message.to_lowercase();
        let matches = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

        if matches(REJECTION_MARKERS) {
            Self::UserRejected
        } else if matches(RATE_LIMIT_MARKERS) {
            Self::RateLimited
        } else if matches(SLIPPAGE_MARKERS) {
            Self::SlippageExceeded
        } else if matches(TRANSPORT_MARKERS) {
            Self::TransportError
        } else {
            Self::UnknownExecutionError {
                display: truncate_for_display(&error.message),
                detail: error.message.clone(),
            }
        }
    }

    /// Rejections are a normal user choice, not a failure worth reporting
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::UserRejected)
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnknownExecutionError { .. })
    }
}

fn truncate_for_display(message: &str) -> String {
    if message.chars().count() <= MAX_DISPLAY_MESSAGE_LEN {
        message.to_string()
    } else {
        let head: String = message.chars().take(MAX_DISPLAY_MESSAGE_LEN).collect();
        format!("{}...", head)
    }
}
