//! Implementation of a priority search trie ([`priority_trie::PriorityTrie`]) over
//! closed integer intervals `[start, last]`. Intervals are placed in a binary
//! trie by the bits of their `start`, and the trie doubles as a max-heap on
//! `last`, so a query for the intervals overlapping `[left, right]` never
//! enters a subtree whose intervals all end before `left`.
//!
//! Endpoints are `u64` values below `2^bits`, where the key width `bits` is
//! chosen once when the trie is built.
//!
//! ```
//! use priority_search_trie::PriorityTrie;
//!
//! let mut trie = PriorityTrie::new(8).unwrap();
//! trie.insert(10, 20).unwrap();
//! trie.insert(30, 40).unwrap();
//! assert_eq!(trie.overlaps(15, 25).collect::<Vec<_>>(), [(10, 20)]);
//! ```
#![forbid(unsafe_code)]

/// Errors reported for rejected arguments.
pub mod error;
/// A priority search trie stored in a dense arena.
pub mod priority_trie;
mod node;
mod tracing_helpers;

pub use error::TrieError;
pub use priority_trie::{Overlap, Overlaps, PriorityTrie};
