use thiserror::Error;

/// Error type shared by every fallible container operation.
///
/// Degenerate requests (pop from empty, remove of an absent key, an index
/// past the initialized region) are not errors; they return `None` and leave
/// the container untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Fixed-capacity storage was asked to grow.
    ///
    /// Raised by containers backed by a caller-provided region or
    /// constructed with a `fixed`/`heap_fixed` policy. The container is
    /// unchanged.
    #[error("fixed-capacity storage is full (capacity {capacity})")]
    CapacityExhausted {
        /// The capacity the storage is pinned at.
        capacity: usize,
    },
    /// The system refused an allocation while growing.
    ///
    /// The container keeps its prior capacity and contents.
    #[error("memory allocation of {bytes} bytes failed")]
    AllocFailed {
        /// Size of the denied request in bytes.
        bytes: usize,
    },
}
