//! Read-only table snapshot
//!
//! Parses the kernel's /proc/net/arp listing and renders one display
//! line per entry. The snapshot has no consistency guarantee beyond the
//! instant it was read; other processes mutate the cache concurrently.

use super::CacheFlags;
use crate::protocol::MacAddr;
use crate::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::debug;

/// Well-known virtual path exposing the whole cache, one line per entry.
pub const PROC_NET_ARP: &str = "/proc/net/arp";

/// Reverse name lookup seam. Implementations may block; failure is
/// tolerated and never surfaced as an error.
pub trait NameResolver {
    fn resolve(&self, ip: Ipv4Addr) -> Option<String>;
}

/// Blocking reverse lookup through the system resolver.
pub struct SystemResolver;

impl NameResolver for SystemResolver {
    fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        let addr = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: 0,
            sin_addr: libc::in_addr {
                s_addr: u32::from(ip).to_be(),
            },
            sin_zero: [0; 8],
        };
        let mut host = [0 as libc::c_char; libc::NI_MAXHOST as usize];

        // NI_NAMEREQD turns "no PTR record" into an explicit miss so the
        // caller can apply its deterministic numeric fallback.
        let ret = unsafe {
            libc::getnameinfo(
                &addr as *const libc::sockaddr_in as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                host.as_mut_ptr(),
                host.len() as libc::socklen_t,
                std::ptr::null_mut(),
                0,
                libc::NI_NAMEREQD,
            )
        };
        if ret != 0 {
            return None;
        }

        let host = unsafe { std::ffi::CStr::from_ptr(host.as_ptr()) };
        host.to_str().ok().map(str::to_string)
    }
}

/// One parsed line of the kernel table. Transient; exists only to build
/// a display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub ip: String,
    pub hw_type: u32,
    pub flags: CacheFlags,
    pub hw_address: String,
    /// Present in the table but not handled here.
    pub mask: String,
    pub device: String,
}

impl TableRow {
    /// Tokenize one table line into the six fields: ip, hw_type (hex),
    /// flags (hex), hw_address, mask, device.
    ///
    /// A line with fewer tokens is tolerated rather than rejected:
    /// unfilled fields stay zero/empty, matching the historic parser.
    pub fn parse(line: &str) -> TableRow {
        let mut fields = line.split_whitespace();
        TableRow {
            ip: fields.next().unwrap_or("").to_string(),
            hw_type: fields.next().map_or(0, parse_hex),
            flags: CacheFlags::from_bits(fields.next().map_or(0, parse_hex)),
            hw_address: fields.next().unwrap_or("").to_string(),
            mask: fields.next().unwrap_or("").to_string(),
            device: fields.next().unwrap_or("").to_string(),
        }
    }

    /// Render the row arp -a style.
    ///
    /// Incomplete entries show "*" (published) or "<incomplete>" with the
    /// MAC omitted; complete entries show the MAC and the fixed "[ether]"
    /// label (the hardware type field is not otherwise resolved).
    pub fn display_line<N: NameResolver + ?Sized>(&self, resolver: &N) -> String {
        let host = self
            .ip
            .parse::<Ipv4Addr>()
            .ok()
            .and_then(|ip| resolver.resolve(ip))
            .unwrap_or_else(|| self.ip.clone());
        debug!(%host, ip = %self.ip, "hostname resolved");

        if !self.flags.contains(CacheFlags::COMPLETE) {
            let hardname = if self.flags.contains(CacheFlags::PUBLISHED) {
                "*"
            } else {
                "<incomplete>"
            };
            format!("{} ({}) at {} on {}", host, self.ip, hardname, self.device)
        } else {
            let mac = self
                .hw_address
                .parse::<MacAddr>()
                .map(|m| m.to_string())
                .unwrap_or_else(|_| self.hw_address.clone());
            format!("{} ({}) at {} [ether] on {}", host, self.ip, mac, self.device)
        }
    }
}

fn parse_hex(field: &str) -> u32 {
    let digits = field.strip_prefix("0x").unwrap_or(field);
    u32::from_str_radix(digits, 16).unwrap_or(0)
}

/// Reader over the kernel table snapshot.
pub struct TableReader<N: NameResolver = SystemResolver> {
    path: PathBuf,
    resolver: N,
}

impl TableReader {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(PROC_NET_ARP),
            resolver: SystemResolver,
        }
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NameResolver> TableReader<N> {
    #[cfg(test)]
    fn with(path: impl Into<PathBuf>, resolver: N) -> Self {
        Self {
            path: path.into(),
            resolver,
        }
    }

    /// Stream the table as formatted display lines, one per entry.
    ///
    /// Lazy, finite, and non-restartable: the snapshot is read once,
    /// the column header is discarded, and each subsequent input line
    /// yields one item until end of input.
    pub fn display_all(&self) -> Result<DisplayLines<'_, N>> {
        let file = File::open(&self.path)?;
        let mut lines = BufReader::new(file).lines();

        if let Some(header) = lines.next() {
            let header = header?;
            debug!(%header, "skipping table header");
        }

        Ok(DisplayLines {
            lines,
            resolver: &self.resolver,
        })
    }
}

/// Lazy line sequence produced by [`TableReader::display_all`].
pub struct DisplayLines<'a, N> {
    lines: Lines<BufReader<File>>,
    resolver: &'a N,
}

impl<N: NameResolver> Iterator for DisplayLines<'_, N> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        Some(Ok(TableRow::parse(&line).display_line(self.resolver)))
    }
}
