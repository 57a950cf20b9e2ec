use crate::treap::{Error, Result};
use rand::Rng;

/// The inclusive range that automatically assigned priorities are drawn from.
///
/// # Examples
///
/// ```
/// use sift_treap::treap::PriorityRange;
///
/// let range = PriorityRange::new(0, 10).unwrap();
/// assert!(range.contains(10));
/// assert!(!range.contains(11));
///
/// assert!(PriorityRange::new(-1, 10).is_err());
/// assert!(PriorityRange::new(10, 0).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PriorityRange {
    min: i64,
    max: i64,
}

impl PriorityRange {
    /// Constructs a range covering `min..=max`. Returns `Error::InvalidPriority` if `min` is
    /// negative and `Error::InvalidPriorityRange` if `max < min`.
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min < 0 {
            return Err(Error::InvalidPriority(min));
        }
        if max < min {
            return Err(Error::InvalidPriorityRange { min, max });
        }
        Ok(PriorityRange { min, max })
    }

    /// Returns the smallest priority in the range.
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Returns the largest priority in the range.
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Checks if a priority lies inside the range.
    pub fn contains(&self, priority: i64) -> bool {
        self.min <= priority && priority <= self.max
    }

    /// Draws a priority uniformly from the range.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        // the span of a non-negative range always fits in a u64, even for 0..=i64::MAX
        let span = (self.max - self.min) as u64 + 1;
        self.min + rng.gen_range(0, span) as i64
    }
}

impl Default for PriorityRange {
    fn default() -> Self {
        PriorityRange { min: 0, max: 1000 }
    }
}
