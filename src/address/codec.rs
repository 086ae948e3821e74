//! Parsing and rendering of the two account address formats

use crate::error::{CoreError, CoreResult};

use bech32::{FromBase32, ToBase32, Variant};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Bech32 human-readable prefix for account addresses.
pub const DEFAULT_ACCOUNT_PREFIX: &str = "mer";

/// Default number of characters kept at each end of a shortened address.
pub const DEFAULT_KEEP_CHARS: usize = 4;

/// Number of bytes in an account address payload.
const ADDRESS_LEN: usize = 20;

/// A validated account address.
///
/// Constructed only through [`AddressCodec::parse`] or
/// [`AddressCodec::from_bytes`], so the renderings [`Address::eth`] and
/// [`Address::mer`] are total and never fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    bytes: [u8; ADDRESS_LEN],
    prefix: String,
}

impl Address {
    /// Render as a 0x-prefixed, EIP-55 checksum-cased hex string.
    pub fn eth(&self) -> String {
        checksum_hex(&self.bytes)
    }

    /// Render as a bech32 string under the configured account prefix.
    pub fn mer(&self) -> String {
        // The prefix was validated when this address was constructed.
        bech32::encode(&self.prefix, self.bytes.to_base32(), Variant::Bech32)
            .expect("prefix validated at construction")
    }

    /// Both renderings shortened to `keep` characters at head and tail.
    pub fn shortened(&self, keep: usize) -> (String, String) {
        (shorten(&self.eth(), keep), shorten(&self.mer(), keep))
    }

    /// Both renderings shortened to the default width.
    pub fn shortened_default(&self) -> (String, String) {
        self.shortened(DEFAULT_KEEP_CHARS)
    }

    /// The raw 20-byte payload shared by both renderings.
    pub fn bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mer())
    }
}

/// Parses addresses in either format against a configured bech32 prefix.
#[derive(Debug, Clone)]
pub struct AddressCodec {
    account_prefix: String,
}

impl AddressCodec {
    /// Create a codec for the given bech32 account prefix.
    pub fn new(account_prefix: impl Into<String>) -> CoreResult<Self> {
        let account_prefix = account_prefix.into();

        // Reject prefixes bech32 cannot encode under, so rendering is
        // infallible afterwards.
        bech32::encode(&account_prefix, [0u8; ADDRESS_LEN].to_base32(), Variant::Bech32)
            .map_err(|e| CoreError::Config(format!("invalid bech32 prefix: {}", e)))?;

        Ok(Self { account_prefix })
    }

    /// Parse either rendering of an account address.
    ///
    /// Accepts a 0x-prefixed 20-byte hex string (mixed-case input must carry
    /// a valid EIP-55 checksum) or a bech32 string under the configured
    /// account prefix.
    pub fn parse(&self, input: &str) -> CoreResult<Address> {
        let input = input.trim();

        if let Some(hex_body) = input.strip_prefix("0x") {
            return self.parse_hex(input, hex_body);
        }

        self.parse_bech32(input)
    }

    /// Build an address directly from its payload.
    pub fn from_bytes(&self, bytes: [u8; ADDRESS_LEN]) -> Address {
        Address {
            bytes,
            prefix: self.account_prefix.clone(),
        }
    }

    /// The configured bech32 account prefix.
    pub fn account_prefix(&self) -> &str {
        &self.account_prefix
    }

    fn parse_hex(&self, full: &str, body: &str) -> CoreResult<Address> {
        let decoded = hex::decode(body)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", full, e)))?;

        let bytes: [u8; ADDRESS_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "{}: expected {} bytes, found {}",
                full,
                ADDRESS_LEN,
                decoded.len()
            ))
        })?;

        // Mixed-case hex must match the EIP-55 checksum casing exactly.
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && full != checksum_hex(&bytes) {
            return Err(CoreError::InvalidAddress(format!(
                "{}: checksum mismatch",
                full
            )));
        }

        Ok(self.from_bytes(bytes))
    }

    fn parse_bech32(&self, input: &str) -> CoreResult<Address> {
        let (hrp, words, variant) = bech32::decode(input)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", input, e)))?;

        if variant != Variant::Bech32 {
            return Err(CoreError::InvalidAddress(format!(
                "{}: not a bech32 (non-m) address",
                input
            )));
        }
        if hrp != self.account_prefix {
            return Err(CoreError::InvalidAddress(format!(
                "{}: expected prefix {}, found {}",
                input, self.account_prefix, hrp
            )));
        }

        let decoded = Vec::<u8>::from_base32(&words)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", input, e)))?;

        let bytes: [u8; ADDRESS_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "{}: expected {} bytes, found {}",
                input,
                ADDRESS_LEN,
                decoded.len()
            ))
        })?;

        Ok(self.from_bytes(bytes))
    }
}

impl Default for AddressCodec {
    fn default() -> Self {
        Self {
            account_prefix: DEFAULT_ACCOUNT_PREFIX.to_string(),
        }
    }
}

/// Shorten a rendered address to `head…tail` with `keep` characters on each
/// side. Operates on character count of the rendered string; addresses are
/// ASCII, width-sensitive (CJK) display is not addressed here.
pub fn shorten(rendered: &str, keep: usize) -> String {
    let chars: Vec<char> = rendered.chars().collect();
    if chars.len() <= keep * 2 {
        return rendered.to_string();
    }

    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Decode a bech32 address and re-encode it under a different prefix,
/// keeping the payload words unchanged (validator ⇄ delegator families).
pub fn reprefix(addr: &str, new_prefix: &str) -> CoreResult<String> {
    let (_, words, variant) = bech32::decode(addr)
        .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", addr, e)))?;

    bech32::encode(new_prefix, words, variant)
        .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", new_prefix, e)))
}

/// EIP-55 checksum casing: uppercase each hex digit whose corresponding
/// nibble in `keccak256(lowercase_hex)` is >= 8.
fn checksum_hex(bytes: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
