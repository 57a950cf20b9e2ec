//! Binary search tree where each node also maintains the max-heap invariant on its priority.

mod node;
mod priority;
mod tree;

pub use self::node::NodeRef;
pub use self::priority::PriorityRange;
pub use self::tree::{Iter, Treap};

use std::result;
use thiserror::Error;

/// Convenience `Result` type for treap operations.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when inserting into or configuring a treap. Every error is detected
/// before the treap is modified.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The key is already present in the treap.
    #[error("key already exists in the treap")]
    DuplicateKey,
    /// An explicit priority was negative.
    #[error("priority {0} is negative")]
    InvalidPriority(i64),
    /// A priority range whose upper bound is below its lower bound.
    #[error("priority range {min}..={max} is empty")]
    InvalidPriorityRange { min: i64, max: i64 },
}
