//! Error types for the dashboard core

use thiserror::Error;

/// Main error type for the dashboard core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported currency: {denom}")]
    UnsupportedCurrency { denom: String },

    #[error("Signer not connected")]
    NotReady,

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),
}

impl CoreError {
    /// Check if the error was caused by caller input (deterministic, retrying
    /// will not change the outcome)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_)
                | CoreError::InvalidAddress(_)
                | CoreError::UnsupportedCurrency { .. }
        )
    }

    /// Stable user-facing message for each error kind.
    ///
    /// Total over the enum so the UI never has to match on free-form error
    /// text coming back from the chain.
    pub fn user_message(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "The dashboard is misconfigured",
            CoreError::InvalidAmount(_) => "Enter a valid, non-negative amount",
            CoreError::InvalidAddress(_) => "Enter a valid account address",
            CoreError::UnsupportedCurrency { .. } => "This currency is not supported",
            CoreError::NotReady => "Connect a wallet before submitting",
            CoreError::BroadcastFailed(_) => "The transaction was rejected by the chain",
        }
    }
}

/// Result type for dashboard core operations
pub type CoreResult<T> = Result<T, CoreError>;
