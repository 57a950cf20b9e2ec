//! A treap: a binary search tree on keys that is also a max-heap on priorities, kept in shape by
//! rotating each newly inserted node upwards.
//!
//! # Examples
//!
//! ```
//! use sift_treap::treap::Treap;
//!
//! let mut t = Treap::new();
//! for key in "ZYXWVQUPSRKJGBFCMDHILANOTE".chars() {
//!     t.insert(key, None).unwrap();
//! }
//!
//! assert_eq!(t.size(), 26);
//! assert!(t.search(&'Q'));
//! assert!(t.is_valid());
//! ```

pub mod arena;
pub mod treap;
