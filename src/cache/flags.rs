//! Cache entry state flags

use std::fmt;
use std::ops::BitOr;

/// Entry state bits, mirroring the kernel's ATF_* flag word.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheFlags(u32);

impl CacheFlags {
    /// Hardware address is resolved and usable.
    pub const COMPLETE: CacheFlags = CacheFlags(0x02);
    /// Entry is not aged out automatically.
    pub const PERMANENT: CacheFlags = CacheFlags(0x04);
    /// This host answers resolution requests for the address (proxy).
    pub const PUBLISHED: CacheFlags = CacheFlags(0x08);
    /// Obsolete trailer-encapsulation bit; carried but never acted on.
    pub const USE_TRAILERS: CacheFlags = CacheFlags(0x10);

    pub const fn empty() -> Self {
        CacheFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        CacheFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CacheFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CacheFlags {
    type Output = CacheFlags;

    fn bitor(self, rhs: CacheFlags) -> CacheFlags {
        CacheFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for CacheFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheFlags({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(CacheFlags::empty().bits(), 0);
        assert!(!CacheFlags::empty().contains(CacheFlags::COMPLETE));
    }

    #[test]
    fn test_bitor() {
        let flags = CacheFlags::PERMANENT | CacheFlags::COMPLETE;
        assert_eq!(flags.bits(), 0x06);
        assert!(flags.contains(CacheFlags::COMPLETE));
        assert!(flags.contains(CacheFlags::PERMANENT));
        assert!(!flags.contains(CacheFlags::PUBLISHED));
    }

    #[test]
    fn test_contains_requires_all_bits() {
        let flags = CacheFlags::COMPLETE;
        assert!(!flags.contains(CacheFlags::COMPLETE | CacheFlags::PERMANENT));
    }

    #[test]
    fn test_from_bits_roundtrip() {
        let flags = CacheFlags::from_bits(0x0e);
        assert!(flags.contains(CacheFlags::COMPLETE));
        assert!(flags.contains(CacheFlags::PERMANENT));
        assert!(flags.contains(CacheFlags::PUBLISHED));
        assert_eq!(flags.bits(), 0x0e);
    }
}
