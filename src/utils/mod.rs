//! Shared utilities: the resolver feeder and IP helpers.

pub mod feeder;
pub mod ip_utils;

pub use feeder::{Drain, ExhaustedResolverError, FeedError, Feeder};
pub use ip_utils::{join_addresses, parse_any_address, AnyAddress};
