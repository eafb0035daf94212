//! Cache entry record and per-operation builders

use super::CacheFlags;
use crate::protocol::MacAddr;
use crate::{Error, Result};
use std::net::Ipv4Addr;

/// Interface names are bounded to 15 visible bytes plus a terminator.
const DEVICE_NAME_MAX: usize = libc::IFNAMSIZ - 1;

/// One addressable cache entry: the unit exchanged with the control
/// channel. Constructed fresh per operation; the kernel is the sole
/// owner of durable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub ip: Ipv4Addr,
    pub device: String,
    pub mac: MacAddr,
    pub flags: CacheFlags,
}

impl CacheRecord {
    /// Build a record addressing an entry for a Get submission.
    ///
    /// MAC and flags stay zeroed; the channel's reply populates them.
    pub fn query(ip: &str, device: &str) -> Result<Self> {
        Ok(Self {
            ip: parse_ipv4(ip)?,
            device: bound_device(device),
            mac: MacAddr::ZERO,
            flags: CacheFlags::empty(),
        })
    }

    /// Build a record addressing an entry for a Delete submission.
    pub fn delete(ip: &str, device: &str) -> Result<Self> {
        Self::query(ip, device)
    }

    /// Build a complete permanent entry for a Set submission.
    pub fn insert(ip: &str, device: &str, mac: &str) -> Result<Self> {
        Ok(Self {
            ip: parse_ipv4(ip)?,
            device: bound_device(device),
            mac: mac.parse()?,
            flags: CacheFlags::PERMANENT | CacheFlags::COMPLETE,
        })
    }
}

fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    text.parse()
        .map_err(|_| Error::Parse(format!("invalid IPv4 address: {}", text)))
}

/// Truncate to the interface-name bound, never rejecting. Historic
/// behavior: an over-long name is silently cut, not an error.
fn bound_device(device: &str) -> String {
    if device.len() <= DEVICE_NAME_MAX {
        return device.to_string();
    }
    let mut end = DEVICE_NAME_MAX;
    while !device.is_char_boundary(end) {
        end -= 1;
    }
    device[..end].to_string()
}
