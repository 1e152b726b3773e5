use thiserror::Error;

/// Reasons a [`PriorityTrie`](crate::priority_trie::PriorityTrie) rejects its arguments.
///
/// Absence is never an error: deleting a missing interval reports `Ok(false)`
/// and queries that find nothing return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TrieError {
    /// The key width must lie in `1..=64`.
    #[error("invalid key width {bits}: must be between 1 and 64 bits")]
    InvalidKeyWidth { bits: u32 },

    /// An endpoint does not fit in the configured key width.
    #[error("endpoint {value} does not fit in {bits} bits")]
    EndpointOutOfRange { value: u64, bits: u32 },

    /// The interval's start lies after its last point.
    #[error("inverted interval [{start},{last}]: start must not exceed last")]
    InvertedInterval { start: u64, last: u64 },
}
