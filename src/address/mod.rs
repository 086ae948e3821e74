//! Address module - dual-format account address codec
//!
//! One account, two renderings: an EVM-style 0x hex string with EIP-55
//! checksum casing and a Cosmos-style bech32 string. Both carry the same
//! 20-byte payload; converting between them is a pure bijection with no
//! external lookup.

mod codec;

pub use codec::{
    reprefix, shorten, Address, AddressCodec, DEFAULT_ACCOUNT_PREFIX, DEFAULT_KEEP_CHARS,
};
