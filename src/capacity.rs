//! Growth policy: bucket counts, the load bound and rehash sizing.
//!
//! The load bound is kept in exact integer arithmetic (`len * 10 < buckets * 7`)
//! so that the invariant is strict and independent of float rounding.

use core::fmt;
use core::num::NonZeroUsize;

/// Maximum ratio of elements to buckets, reported for diagnostics.
pub const MAX_LOAD_FACTOR: f64 = 0.7;

const LOAD_NUM: u128 = 7;
const LOAD_DEN: u128 = 10;

const TWO: NonZeroUsize = Capacity::minimum(2).0;

/// Error returned by [`ChainSet::try_reserve`](crate::ChainSet::try_reserve).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReserveError {
    /// The bucket count needed for the requested length does not fit in `usize`.
    CapacityOverflow,
}

impl fmt::Display for ReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReserveError::CapacityOverflow => f.write_str("capacity overflow"),
        }
    }
}

impl std::error::Error for ReserveError {}

/// Number of buckets in a table. Never zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(crate) struct Capacity(NonZeroUsize);

impl Capacity {
    /// Minimum bucket count for a table type; a zero minimum fails const evaluation.
    pub(crate) const fn minimum(n: usize) -> Self {
        match NonZeroUsize::new(n) {
            Some(n) => Capacity(n),
            None => panic!("minimum bucket count must be non-zero"),
        }
    }

    #[inline]
    pub(crate) fn get(self) -> usize {
        self.0.get()
    }

    /// Bucket index for a stored hash.
    #[inline]
    pub(crate) fn bucket_of(self, hash: u64) -> usize {
        // Truncation on 32-bit targets only drops high hash bits.
        (hash as usize) % self.0
    }

    /// Whether `len` elements stay strictly below the load bound.
    #[inline]
    pub(crate) fn holds(self, len: usize) -> bool {
        (len as u128) * LOAD_DEN < (self.get() as u128) * LOAD_NUM
    }

    /// Capacity after doubling until `target` elements fit, or `None` if
    /// `target` already fits.
    pub(crate) fn grown_for(self, target: usize) -> Result<Option<Capacity>, ReserveError> {
        if self.holds(target) {
            return Ok(None);
        }
        let mut n = self.0;
        loop {
            n = n.checked_mul(TWO).ok_or(ReserveError::CapacityOverflow)?;
            let grown = Capacity(n);
            if grown.holds(target) {
                return Ok(Some(grown));
            }
        }
    }

    /// Smallest capacity that keeps `len` elements under the load bound.
    pub(crate) fn fitting(len: usize) -> Result<Capacity, ReserveError> {
        let n = (len as u128) * LOAD_DEN / LOAD_NUM + 1;
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Capacity)
            .ok_or(ReserveError::CapacityOverflow)
    }

    /// Capacity actually used for a rehash request: never below the type's
    /// minimum, the request, or what the current length needs.
    pub(crate) fn for_rehash(
        minimum: Capacity,
        requested: usize,
        len: usize,
    ) -> Result<Capacity, ReserveError> {
        let fitting = Capacity::fitting(len)?;
        let requested = NonZeroUsize::new(requested).map(Capacity).unwrap_or(minimum);
        Ok(minimum.max(requested).max(fitting))
    }

    pub(crate) fn empty_buckets<T: Clone>(self, empty: T) -> Box<[T]> {
        vec![empty; self.get()].into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(n: usize) -> Capacity {
        Capacity::minimum(n)
    }

    /// Invariant: the load bound is strict; 8 of 12 fits, 9 of 12 does not.
    #[test]
    fn holds_is_strict_below_seven_tenths() {
        assert!(cap(12).holds(0));
        assert!(cap(12).holds(8));
        assert!(!cap(12).holds(9));
        // 7 / 10 sits exactly on the bound and must not fit.
        assert!(cap(10).holds(6));
        assert!(!cap(10).holds(7));
    }

    /// Invariant: growth doubles from the current capacity until the target fits.
    #[test]
    fn grown_for_doubles_until_target_fits() {
        assert_eq!(cap(12).grown_for(8).unwrap(), None);
        assert_eq!(cap(12).grown_for(9).unwrap(), Some(cap(24)));
        assert_eq!(cap(12).grown_for(17).unwrap(), Some(cap(48)));
        assert_eq!(cap(12).grown_for(100).unwrap(), Some(cap(192)));
    }

    /// Invariant: doubling past `usize::MAX` reports overflow instead of wrapping.
    #[test]
    fn grown_for_reports_overflow() {
        let huge = cap(usize::MAX / 2 + 1);
        assert_eq!(huge.grown_for(usize::MAX), Err(ReserveError::CapacityOverflow));
    }

    /// Invariant: the fitting capacity is the smallest one that holds `len`.
    #[test]
    fn fitting_is_minimal() {
        for len in 0..200 {
            let c = Capacity::fitting(len).unwrap();
            assert!(c.holds(len), "len {len} must fit in {}", c.get());
            if c.get() > 1 {
                assert!(!cap(c.get() - 1).holds(len), "len {len} not minimal");
            }
        }
    }

    /// Invariant: rehash targets never drop below the minimum, the request, or
    /// what the current length requires.
    #[test]
    fn for_rehash_takes_the_largest_bound() {
        let min = cap(12);
        assert_eq!(Capacity::for_rehash(min, 0, 0).unwrap(), min);
        assert_eq!(Capacity::for_rehash(min, 5, 0).unwrap(), min);
        assert_eq!(Capacity::for_rehash(min, 40, 0).unwrap(), cap(40));
        // 20 elements need 29 buckets even though only 13 were asked for.
        assert_eq!(Capacity::for_rehash(min, 13, 20).unwrap(), cap(29));
        assert!(Capacity::for_rehash(min, 13, 20).unwrap().holds(20));
    }

    /// Invariant: bucket indices always fall inside the table.
    #[test]
    fn bucket_of_stays_in_range() {
        let c = cap(13);
        for h in [0u64, 1, 12, 13, 14, u64::MAX, u64::MAX / 3] {
            assert!(c.bucket_of(h) < 13);
        }
    }

    #[test]
    fn reserve_error_displays() {
        assert_eq!(ReserveError::CapacityOverflow.to_string(), "capacity overflow");
    }
}
