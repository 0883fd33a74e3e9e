//! # ztdns - DNS server configuration for ZeroTier networks
//!
//! This library generates DNS server configuration for the networks managed
//! by a ZeroTier network controller, and publishes the resulting DNS
//! settings back to the controller.
//!
//! ## Overview
//!
//! Each network member is named in a per-network JSON file by its node id.
//! The addresses a member is reachable at come from two places: addresses
//! assigned directly by the controller, and managed IPv6 addresses derived
//! from the network id and the node id (6plane and rfc4193 modes).
//!
//! ## Architecture
//!
//! - `zerotier`: node/network identifiers and managed address derivation
//! - `utils`: the push-one/pull-one resolver feeder and IP helpers
//! - `resolver`: node id → address list resolution for one network
//! - `controller`: the external controller command and its JSON replies
//! - `config` / `config_loader`: per-network configuration files
//! - `template`: placeholder templates for the generated files
//! - `orchestrator`: the per-network driver loop
//!
//! ## Example Usage
//!
//! ```rust
//! use ztdns::zerotier::{derive_6plane, derive_unique_local, NetworkId, NodeId};
//!
//! let nwid: NetworkId = "8056c2e21c000001".parse()?;
//! let node: NodeId = "efcc1b0947".parse()?;
//!
//! let sixplane = derive_6plane(nwid, node);
//! assert_eq!(sixplane.node_address.to_string(), "fc9c:56c2:e3ef:cc1b:947::1");
//!
//! let rfc4193 = derive_unique_local(nwid, node);
//! assert_eq!(rfc4193.network.to_string(), "fd80:56c2:e21c:0:199:9300::/88");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```json
//! {
//!   "zt_hosts": { "efcc1b0947": ["gateway", "gw"] },
//!   "dns": { "domain": "zt.example", "servers": ["efcc1b0947", "1.1.1.1"] }
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library modules define `thiserror` error enums; the loader and the
//! orchestrator return `color_eyre` reports with file and network context.

pub mod config;
pub mod config_loader;
pub mod controller;
pub mod orchestrator;
pub mod resolver;
pub mod template;
pub mod utils;
pub mod zerotier;
