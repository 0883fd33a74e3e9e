//! ZeroTier identifiers.
//!
//! Node ids (10 hex digits, 40 bits) and network ids (16 hex digits, 64 bits)
//! are fixed-width values. They are validated once when parsed from
//! configuration or controller replies and always rendered back zero-padded
//! in lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised when identifier text is malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} must be a {width} digit hexadecimal number, got {input:?}")]
    Malformed {
        kind: &'static str,
        width: usize,
        input: String,
    },
    #[error("{kind} value {value:#x} does not fit in {bits} bits")]
    OutOfRange {
        kind: &'static str,
        bits: u32,
        value: u64,
    },
}

/// Parse exactly `width` hex digits, case-insensitive.
///
/// `u64::from_str_radix` alone would also accept a leading `+`, so the
/// alphabet is checked explicitly.
fn parse_fixed_hex(kind: &'static str, width: usize, text: &str) -> Result<u64, ValidationError> {
    let malformed = || ValidationError::Malformed {
        kind,
        width,
        input: text.to_string(),
    };

    if text.len() != width || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    u64::from_str_radix(text, 16).map_err(|_| malformed())
}

/// Address of a node on a ZeroTier network
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(u64);

impl NodeId {
    /// Number of hex digits in the canonical form
    pub const WIDTH: usize = 10;
    /// Number of significant bits
    pub const BITS: u32 = 40;

    /// Build a node id from its integer value, rejecting anything wider than 40 bits
    pub fn from_u64(value: u64) -> Result<Self, ValidationError> {
        if value >> Self::BITS != 0 {
            return Err(ValidationError::OutOfRange {
                kind: "Node Address",
                bits: Self::BITS,
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for NodeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex("Node Address", Self::WIDTH, s).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010x}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId(\"{}\")", self)
    }
}

impl TryFrom<String> for NodeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

/// Identifier of a ZeroTier network
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(u64);

impl NetworkId {
    /// Number of hex digits in the canonical form
    pub const WIDTH: usize = 16;

    /// Every 64-bit value is a valid network id
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for NetworkId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex("Network Address", Self::WIDTH, s).map(Self)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId(\"{}\")", self)
    }
}

impl TryFrom<String> for NetworkId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.to_string()
    }
}
