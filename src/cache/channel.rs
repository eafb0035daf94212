//! Kernel control channel
//!
//! Owns the one AF_INET datagram socket the ARP ioctls are issued on and
//! translates [`CacheRecord`] to and from the kernel's `arpreq` shape.
//! Every successful Set/Delete mutates cache state visible host-wide;
//! the channel itself holds nothing but the fd.

use super::{CacheFlags, CacheRecord};
use crate::protocol::MacAddr;
use crate::{Error, Result};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;

/// Control operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Get,
    Set,
    Delete,
}

impl CacheOp {
    fn request(self) -> libc::c_ulong {
        match self {
            CacheOp::Get => libc::SIOCGARP,
            CacheOp::Set => libc::SIOCSARP,
            CacheOp::Delete => libc::SIOCDARP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CacheOp::Get => "get ARP entry",
            CacheOp::Set => "set ARP entry",
            CacheOp::Delete => "delete ARP entry",
        }
    }
}

/// The process's single control handle to the ARP subsystem.
pub struct CacheChannel {
    fd: RawFd,
}

impl CacheChannel {
    /// Open the control socket. Intended to be opened once per process;
    /// `Drop` closes the fd exactly once regardless of exit path.
    pub fn open() -> Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
        if fd < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(Self { fd })
    }

    /// Submit one record to the kernel cache.
    ///
    /// Get returns a record with flags and MAC read back from the reply;
    /// a reply without the Complete flag is a valid outcome, not an
    /// error. Set/Delete return the submitted record unchanged. Failures
    /// carry the OS error and are never retried here.
    pub fn submit(&self, op: CacheOp, record: &CacheRecord) -> Result<CacheRecord> {
        let mut req = encode_request(record);
        debug!(op = op.name(), ip = %record.ip, device = %record.device, "submitting");

        let ret = unsafe { libc::ioctl(self.fd, op.request(), &mut req) };
        if ret < 0 {
            return Err(Error::Control {
                op: op.name(),
                source: io::Error::last_os_error(),
            });
        }

        Ok(decode_reply(record, &req))
    }
}

impl AsRawFd for CacheChannel {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for CacheChannel {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

/// Serialize a record into the kernel's `arpreq` shape:
/// - protocol address: AF_INET family tag + 4 address bytes in network
///   order, written through `sockaddr_in`
/// - hardware address: ARPHRD_ETHER family tag + 6 significant bytes at
///   the head of the 14-byte `sa_data` buffer
/// - device: 16-byte NUL-padded field (builder already bounds it to 15)
/// - flags: the ATF_* word
fn encode_request(record: &CacheRecord) -> libc::arpreq {
    let mut req: libc::arpreq = unsafe { std::mem::zeroed() };

    let pa = &mut req.arp_pa as *mut libc::sockaddr as *mut libc::sockaddr_in;
    unsafe {
        (*pa).sin_family = libc::AF_INET as libc::sa_family_t;
        (*pa).sin_port = 0;
        (*pa).sin_addr.s_addr = u32::from(record.ip).to_be();
    }

    req.arp_ha.sa_family = libc::ARPHRD_ETHER as libc::sa_family_t;
    for (dst, src) in req.arp_ha.sa_data.iter_mut().zip(record.mac.octets()) {
        *dst = src as libc::c_char;
    }

    for (dst, src) in req.arp_dev.iter_mut().zip(record.device.as_bytes()) {
        *dst = *src as libc::c_char;
    }

    req.arp_flags = record.flags.bits() as libc::c_int;
    req
}

/// Read flags and hardware address back out of a Get reply.
fn decode_reply(record: &CacheRecord, req: &libc::arpreq) -> CacheRecord {
    let mut mac = [0u8; 6];
    for (dst, src) in mac.iter_mut().zip(req.arp_ha.sa_data.iter()) {
        *dst = *src as u8;
    }

    CacheRecord {
        ip: record.ip,
        device: record.device.clone(),
        mac: MacAddr(mac),
        flags: CacheFlags::from_bits(req.arp_flags as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn sample_record() -> CacheRecord {
        CacheRecord::insert("192.0.2.5", "eth0", "aa:bb:cc:dd:ee:ff").unwrap()
    }

    #[test]
    fn test_encode_protocol_address() {
        let req = encode_request(&sample_record());
        let pa = &req.arp_pa as *const libc::sockaddr as *const libc::sockaddr_in;
        let (family, addr) = unsafe { ((*pa).sin_family, (*pa).sin_addr.s_addr) };
        assert_eq!(family, libc::AF_INET as libc::sa_family_t);
        assert_eq!(u32::from_be(addr), u32::from(Ipv4Addr::new(192, 0, 2, 5)));
    }

    #[test]
    fn test_encode_hardware_address() {
        let req = encode_request(&sample_record());
        assert_eq!(req.arp_ha.sa_family, libc::ARPHRD_ETHER as libc::sa_family_t);
        let head: Vec<u8> = req.arp_ha.sa_data[..6].iter().map(|b| *b as u8).collect();
        assert_eq!(head, vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        // Remainder of the 14-byte buffer stays zeroed
        assert!(req.arp_ha.sa_data[6..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_device_nul_bounded() {
        let record = CacheRecord::query("192.0.2.5", "averylonginterfacename0").unwrap();
        let req = encode_request(&record);
        let dev: Vec<u8> = req.arp_dev.iter().map(|b| *b as u8).collect();
        assert_eq!(&dev[..15], b"averylonginterf");
        assert_eq!(dev[15], 0);
    }

    #[test]
    fn test_encode_flags_word() {
        let req = encode_request(&sample_record());
        assert_eq!(
            req.arp_flags as u32,
            (CacheFlags::PERMANENT | CacheFlags::COMPLETE).bits()
        );
    }

    #[test]
    fn test_encode_query_is_zeroed() {
        let record = CacheRecord::query("192.0.2.5", "eth0").unwrap();
        let req = encode_request(&record);
        assert_eq!(req.arp_flags, 0);
        assert!(req.arp_ha.sa_data.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_reply_reads_back_flags_and_mac() {
        let record = CacheRecord::query("192.0.2.5", "eth0").unwrap();
        let mut req = encode_request(&record);
        // Simulate the kernel filling in a resolved entry
        req.arp_flags = CacheFlags::COMPLETE.bits() as libc::c_int;
        for (dst, src) in req.arp_ha.sa_data.iter_mut().zip([0x11u8, 0x22, 0x33, 0x44, 0x55, 0x66])
        {
            *dst = src as libc::c_char;
        }

        let reply = decode_reply(&record, &req);
        assert!(reply.flags.contains(CacheFlags::COMPLETE));
        assert_eq!(reply.mac, MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]));
        assert_eq!(reply.ip, record.ip);
        assert_eq!(reply.device, "eth0");
    }

    #[test]
    fn test_decode_incomplete_reply_is_not_an_error() {
        let record = CacheRecord::query("192.0.2.5", "eth0").unwrap();
        let req = encode_request(&record);

        let reply = decode_reply(&record, &req);
        assert!(!reply.flags.contains(CacheFlags::COMPLETE));
        assert_eq!(reply.mac, MacAddr::ZERO);
    }

    #[test]
    fn test_op_names() {
        assert_eq!(CacheOp::Get.name(), "get ARP entry");
        assert_eq!(CacheOp::Set.name(), "set ARP entry");
        assert_eq!(CacheOp::Delete.name(), "delete ARP entry");
    }
}
