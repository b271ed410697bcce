//! Scalar literal decoders used by the notation parser.
//!
//! The parser only knows how to split a notation string and dispatch on the
//! type tag; turning a literal into a value is delegated to a
//! [`ScalarDecoder`]. [`StandardDecoder`] implements the rules the notation
//! has always had:
//!
//! - integers are plain decimal and must fit an `i64` before being widened
//! - hex accepts an optional lower-case `0x` prefix, must have even length and
//!   is case-insensitive
//! - `bytes32` rejects anything longer than 32 bytes and left-pads the rest
//! - addresses are not length checked: short input is left-padded and long
//!   input keeps its trailing 20 bytes

use alloy::{
    hex,
    primitives::{Address, B256, U256},
};

use crate::error::NotationError;

/// Decoder for the scalar literal forms of the notation.
///
/// Only `decode_hex` and `decode_uint256` are required; the fixed-size forms
/// are derived from `decode_hex` unless overridden.
pub trait ScalarDecoder {
    /// Decode a hex literal with an optional `0x` prefix.
    fn decode_hex(&self, literal: &str) -> Result<Vec<u8>, NotationError>;

    /// Decode a decimal `uint256` literal.
    fn decode_uint256(&self, literal: &str) -> Result<U256, NotationError>;

    /// Decode a `bytes32` literal, left-padding short values with zeros.
    fn decode_bytes32(&self, literal: &str) -> Result<B256, NotationError> {
        let body = strip_hex_prefix(literal);
        if body.len() > 64 {
            return Err(NotationError::FixedBytesOverflow(literal.to_string()));
        }
        let bytes = self.decode_hex(body)?;
        Ok(B256::left_padding_from(&bytes))
    }

    /// Decode an address literal. Length is not validated.
    fn decode_address(&self, literal: &str) -> Result<Address, NotationError> {
        let bytes = self.decode_hex(literal)?;
        Ok(bytes_to_address(&bytes))
    }
}

/// The stock decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl ScalarDecoder for StandardDecoder {
    fn decode_hex(&self, literal: &str) -> Result<Vec<u8>, NotationError> {
        let body = strip_hex_prefix(literal);
        if body.len() % 2 != 0 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(NotationError::HexFormat(literal.to_string()));
        }
        hex::decode(body).map_err(|_| NotationError::HexFormat(literal.to_string()))
    }

    fn decode_uint256(&self, literal: &str) -> Result<U256, NotationError> {
        if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NotationError::NumericFormat(literal.to_string()));
        }
        // Literals beyond i64::MAX are rejected rather than parsed as big integers.
        let value: i64 = literal
            .parse()
            .map_err(|_| NotationError::NumericFormat(literal.to_string()))?;
        Ok(U256::from(value as u64))
    }
}

fn strip_hex_prefix(literal: &str) -> &str {
    literal.strip_prefix("0x").unwrap_or(literal)
}

/// Convert arbitrary-length bytes to an address the lenient way: keep the
/// trailing 20 bytes, left-pad anything shorter.
pub fn bytes_to_address(bytes: &[u8]) -> Address {
    let tail = &bytes[bytes.len().saturating_sub(20)..];
    let mut out = [0u8; 20];
    out[20 - tail.len()..].copy_from_slice(tail);
    Address::from(out)
}
