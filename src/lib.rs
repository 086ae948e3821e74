//! Merlion dashboard core - serialized transaction submission and exact
//! amount/address normalization
//!
//! This crate is the non-visual core of a wallet-connected dashboard for a
//! stablecoin/collateral protocol. It owns the parts where a bug costs money
//! rather than pixels:
//!
//! - [`gate::SingleFlightGate`]: at most one transaction is being
//!   signed/broadcast at a time, with concurrent callers queued FIFO
//! - [`submit::TransactionSubmitter`]: the gate composed with an injected
//!   broadcast collaborator
//! - [`amount`]: exact fixed-point conversion between display amounts and
//!   integer minimal-denomination amounts (never floating point)
//! - [`address`]: dual-format account address codec (EIP-55 hex and bech32
//!   over the same 20-byte payload)
//!
//! Wallet connection, signing, RPC transport, and all UI concerns live
//! outside this crate behind the narrow traits in [`submit`].

pub mod address;
pub mod amount;
pub mod config;
pub mod error;
pub mod gate;
pub mod submit;

pub use address::{Address, AddressCodec};
pub use amount::{Coin, Currency, CurrencyRegistry, DecimalAmount};
pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use gate::{GateGuard, SingleFlightGate};
pub use submit::{AnyMessage, BroadcastClient, SignerProvider, TransactionSubmitter, TxResponse};
