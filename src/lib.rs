//! arpctl - IPv4 ARP cache control
//!
//! Inspects and mutates the kernel's IPv4-to-link-layer resolution cache,
//! in the manner of the classic arp(8) command: list the /proc/net/arp
//! snapshot, or query/insert/delete a single entry through the ARP ioctls.

pub mod cache;
pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;

pub use error::{Error, Result};
