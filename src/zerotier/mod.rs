//! ZeroTier identifiers and managed address derivation.
//!
//! This module knows how node and network ids are written and how the
//! 6plane and rfc4193 addressing modes turn them into IPv6 addresses.
//! Nothing here performs I/O.

pub mod addressing;
pub mod ids;

// Re-export commonly used types
pub use addressing::{derive_6plane, derive_unique_local, SixPlaneAddresses, UniqueLocalAddresses};
pub use ids::{NetworkId, NodeId, ValidationError};
