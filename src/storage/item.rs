//! Stored items and their derived liveness.
//!
//! An [`Item`] never records whether it is alive. Liveness is recomputed from
//! `(expiry, now)` every time it is needed, so an item silently becomes dead
//! when the clock moves past its expiry, with no bookkeeping required.

use crate::clock::Time;
use bytes::Bytes;

/// When an item stops being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The item lives until it is replaced, deleted or flushed
    Never,
    /// The item is dead once the clock reaches this time
    At(Time),
}

impl Expiry {
    /// Builds an expiry `ttl` seconds after `now`.
    ///
    /// A TTL of zero means "never expires". A deadline that would overflow
    /// the clock is treated the same way.
    pub fn after(now: Time, ttl: u64) -> Self {
        if ttl == 0 {
            return Expiry::Never;
        }
        now.checked_add(ttl).map(Expiry::At).unwrap_or(Expiry::Never)
    }
}

/// Liveness of a stored item at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Expired,
}

/// Returns the liveness of `item` at `now`.
///
/// `Live` iff the expiry is [`Expiry::Never`] or `now < expiry`.
#[inline]
pub fn liveness(item: &Item, now: Time) -> Liveness {
    match item.expiry {
        Expiry::Never => Liveness::Live,
        Expiry::At(deadline) if now < deadline => Liveness::Live,
        Expiry::At(_) => Liveness::Expired,
    }
}

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// The key this item is stored under
    pub key: Bytes,
    /// The stored value
    pub value: Bytes,
    /// When the item stops being visible
    pub expiry: Expiry,
    /// Logical time the item was installed (diagnostic only)
    pub stored_at: Time,
}

impl Item {
    pub fn new(key: Bytes, value: Bytes, expiry: Expiry, stored_at: Time) -> Self {
        Self {
            key,
            value,
            expiry,
            stored_at,
        }
    }

    /// Shorthand for `liveness(self, now) == Liveness::Live`.
    #[inline]
    pub fn is_live(&self, now: Time) -> bool {
        liveness(self, now) == Liveness::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(expiry: Expiry) -> Item {
        Item::new(Bytes::from("k"), Bytes::from("0"), expiry, 0)
    }

    #[test]
    fn test_never_expires() {
        let it = item(Expiry::Never);
        assert_eq!(liveness(&it, 0), Liveness::Live);
        assert_eq!(liveness(&it, u64::MAX), Liveness::Live);
    }

    #[test]
    fn test_expiry_boundary() {
        let it = item(Expiry::At(10));
        assert_eq!(liveness(&it, 9), Liveness::Live);
        // Dead exactly at the deadline
        assert_eq!(liveness(&it, 10), Liveness::Expired);
        assert_eq!(liveness(&it, 11), Liveness::Expired);
    }

    #[test]
    fn test_expiry_after() {
        assert_eq!(Expiry::after(5, 0), Expiry::Never);
        assert_eq!(Expiry::after(5, 3), Expiry::At(8));
        assert_eq!(Expiry::after(u64::MAX, 1), Expiry::Never);
    }
}
