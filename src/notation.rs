//! Textual argument notation for contract calls.
//!
//! A notation string is a `;`-separated list of `<type>:<value>` entries:
//!
//! ```text
//! address:0xd69cfc58b5a8b3b7866d2c2682ba971074a946a0;uint256:3;string:"hello";bytes32[]:0x01,0x02
//! ```
//!
//! ## Grammar
//!
//! - one trailing `;` is tolerated, empty entries are skipped, and the empty
//!   string is the empty argument list
//! - every entry contains exactly one `:`
//! - array values are `,`-separated (one trailing `,` tolerated); each element
//!   uses the scalar syntax of the element type
//! - string values may be wrapped in double quotes; no escapes are interpreted
//!
//! Parsing is all-or-nothing: the first bad entry rejects the whole string.

use std::{fmt, str::FromStr};

use alloy::{
    hex,
    primitives::{Address, Bytes, B256, U256},
};

use crate::{
    decoder::{ScalarDecoder, StandardDecoder},
    error::NotationError,
};

// ============================================================================
// ArgType
// ============================================================================

/// The closed set of notation type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Uint256,
    Bytes,
    Bytes32,
    String,
    Address,
    Uint256Array,
    BytesArray,
    Bytes32Array,
    AddressArray,
}

impl ArgType {
    /// Every supported tag, scalars first.
    pub const ALL: [ArgType; 9] = [
        ArgType::Uint256,
        ArgType::Bytes,
        ArgType::Bytes32,
        ArgType::String,
        ArgType::Address,
        ArgType::Uint256Array,
        ArgType::BytesArray,
        ArgType::Bytes32Array,
        ArgType::AddressArray,
    ];

    /// The tag as written in the notation, which is also its Solidity type name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ArgType::Uint256 => "uint256",
            ArgType::Bytes => "bytes",
            ArgType::Bytes32 => "bytes32",
            ArgType::String => "string",
            ArgType::Address => "address",
            ArgType::Uint256Array => "uint256[]",
            ArgType::BytesArray => "bytes[]",
            ArgType::Bytes32Array => "bytes32[]",
            ArgType::AddressArray => "address[]",
        }
    }

    pub const fn is_array(&self) -> bool {
        self.element().is_some()
    }

    /// Element type of an array tag, `None` for scalars.
    pub const fn element(&self) -> Option<ArgType> {
        match self {
            ArgType::Uint256Array => Some(ArgType::Uint256),
            ArgType::BytesArray => Some(ArgType::Bytes),
            ArgType::Bytes32Array => Some(ArgType::Bytes32),
            ArgType::AddressArray => Some(ArgType::Address),
            ArgType::Uint256
            | ArgType::Bytes
            | ArgType::Bytes32
            | ArgType::String
            | ArgType::Address => None,
        }
    }

    /// Decode one literal of this type.
    pub fn decode<D: ScalarDecoder + ?Sized>(
        &self,
        literal: &str,
        decoder: &D,
    ) -> Result<ArgValue, NotationError> {
        match self {
            ArgType::Uint256 => decoder.decode_uint256(literal).map(ArgValue::Uint),
            ArgType::Bytes => decoder
                .decode_hex(literal)
                .map(|b| ArgValue::Bytes(Bytes::from(b))),
            ArgType::Bytes32 => decoder.decode_bytes32(literal).map(ArgValue::FixedBytes),
            ArgType::String => Ok(ArgValue::String(literal.trim_matches('"').to_string())),
            ArgType::Address => decoder.decode_address(literal).map(ArgValue::Address),
            ArgType::Uint256Array => decode_array(ArgType::Uint256, literal, decoder),
            ArgType::BytesArray => decode_array(ArgType::Bytes, literal, decoder),
            ArgType::Bytes32Array => decode_array(ArgType::Bytes32, literal, decoder),
            ArgType::AddressArray => decode_array(ArgType::Address, literal, decoder),
        }
    }
}

fn decode_array<D: ScalarDecoder + ?Sized>(
    element: ArgType,
    literal: &str,
    decoder: &D,
) -> Result<ArgValue, NotationError> {
    let list = literal.strip_suffix(',').unwrap_or(literal);
    list.split(',')
        .map(|item| element.decode(item, decoder))
        .collect::<Result<Vec<_>, _>>()
        .map(ArgValue::Array)
}

impl FromStr for ArgType {
    type Err = NotationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ArgType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == tag)
            .ok_or_else(|| NotationError::UnsupportedType(tag.to_string()))
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ArgValue
// ============================================================================

/// A decoded argument or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Uint(U256),
    Bytes(Bytes),
    FixedBytes(B256),
    String(String),
    Address(Address),
    /// Homogeneous sequence of scalar values.
    Array(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            ArgValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            ArgValue::Address(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ArgValue::Bytes(v) => Some(&v[..]),
            ArgValue::FixedBytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// Renders the value in notation syntax, so `ty:value` parses back.
impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Uint(v) => write!(f, "{v}"),
            ArgValue::Bytes(v) => write!(f, "{}", hex::encode_prefixed(v)),
            ArgValue::FixedBytes(v) => write!(f, "{}", hex::encode_prefixed(v)),
            ArgValue::String(v) => write!(f, "\"{v}\""),
            ArgValue::Address(v) => write!(f, "{v}"),
            ArgValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// ArgumentSpec
// ============================================================================

/// One parsed `<type>:<value>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub ty: ArgType,
    pub value: ArgValue,
}

/// An ordered, fully decoded argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSpec {
    args: Vec<Argument>,
}

impl ArgumentSpec {
    pub fn new(args: Vec<Argument>) -> Self {
        Self { args }
    }

    /// Parse with the [`StandardDecoder`].
    pub fn parse(notation: &str) -> Result<Self, NotationError> {
        Self::parse_with(notation, &StandardDecoder)
    }

    /// Parse with a custom scalar decoder.
    pub fn parse_with<D: ScalarDecoder + ?Sized>(
        notation: &str,
        decoder: &D,
    ) -> Result<Self, NotationError> {
        let notation = notation.strip_suffix(';').unwrap_or(notation);
        let mut args = Vec::new();

        for entry in notation.split(';').filter(|e| !e.is_empty()) {
            let mut parts = entry.split(':');
            let (Some(tag), Some(literal), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(NotationError::MalformedEntry(entry.to_string()));
            };

            let ty: ArgType = tag.parse()?;
            let value = ty.decode(literal, decoder)?;
            args.push(Argument { ty, value });
        }

        tracing::trace!(count = args.len(), "parsed argument notation");
        Ok(Self { args })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.args.iter()
    }

    pub fn types(&self) -> impl Iterator<Item = ArgType> + '_ {
        self.args.iter().map(|a| a.ty)
    }

    pub fn values(&self) -> impl Iterator<Item = &ArgValue> + '_ {
        self.args.iter().map(|a| &a.value)
    }

    pub fn into_values(self) -> Vec<ArgValue> {
        self.args.into_iter().map(|a| a.value).collect()
    }
}

impl FromStr for ArgumentSpec {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a ArgumentSpec {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.iter()
    }
}

/// Parse a notation string with the standard decoder.
pub fn parse(notation: &str) -> Result<ArgumentSpec, NotationError> {
    ArgumentSpec::parse(notation)
}

// ============================================================================
// Return values
// ============================================================================

/// A decoded return value paired with its declared ABI type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnValue {
    pub ty: String,
    pub value: ArgValue,
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type: {}, value: {}", self.ty, self.value)
    }
}

/// Pair decoded return values with their declared types.
///
/// Values are passed through untouched. Lists of different length are paired
/// up to the shorter one.
pub fn serialize_return<S: AsRef<str>>(
    expected_types: &[S],
    values: Vec<ArgValue>,
) -> Vec<ReturnValue> {
    expected_types
        .iter()
        .zip(values)
        .map(|(ty, value)| ReturnValue {
            ty: ty.as_ref().to_string(),
            value,
        })
        .collect()
}
