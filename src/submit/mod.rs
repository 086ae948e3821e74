//! Submit module - serialized transaction submission
//!
//! Composes the single-flight gate with an injected broadcast collaborator:
//! exactly one transaction is being signed/broadcast at any time, concurrent
//! callers queue in FIFO order, and every caller gets its own outcome.

mod submitter;

pub use submitter::{
    AnyMessage, BroadcastClient, PendingTransaction, SignerProvider, TransactionSubmitter,
    TxResponse,
};
