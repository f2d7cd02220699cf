//! rwstd: a growable array and a separately chained hash map built on an
//! explicit allocator, with position-valued cursors for traversal.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: two classic containers whose storage management is spelled out
//!   in layers that can each be reasoned about on their own.
//! - Layers:
//!   - Allocator / RawBlock: uninitialized storage for `n` values of `T`,
//!     with allocation and construction as separate steps. `RawBlock` pairs
//!     one allocation with exactly one release and tracks no live values.
//!   - Cursor<P, C>: a `Copy` position into a container `C`. Dereference
//!     and advancement take the owner explicitly, so cursors never borrow.
//!   - Vector<T, A>: contiguous array over a `RawBlock`, growing by doubling.
//!   - ChainedHashMap<K, V, S, A>: an allocator-backed array of chain heads.
//!     Each node is its own allocator block; a generational slab maps
//!     stable node handles to those blocks.
//!
//! Constraints
//! - Storage is requested from the allocator and never assumed zeroed.
//! - Blocks are released through an allocator equal to the one that
//!   produced them; a container's allocator handle never changes.
//! - Strong safety for single-element appends: the new block is obtained
//!   before anything moves, so a failed growth leaves the array intact.
//! - User code (`Clone`, `Default`, closures, iterators) runs before any
//!   elements are shifted; a panic there leaves the container unchanged.
//!
//! Errors
//! - Fallible entry points (`at`, `reserve`, `try_push_back`,
//!   `try_insert`, `rehash`) return `Result<_, Error>`.
//! - Infallible entry points route allocation failure to
//!   `std::alloc::handle_alloc_error` and other errors to a panic.
//! - Contract violations (null or stale cursors, out-of-range insertion
//!   positions, invalid load factors) panic.
//!
//! Hasher and rehashing invariants
//! - Each map node stores its key's full `u64` hash. Bucket selection,
//!   rehashing and cursor advancement reduce the stored hash and never call
//!   `K: Hash` or `K: Eq` after insertion.
//! - Rehashing relinks nodes in place; node handles, and with them map
//!   cursors, stay valid across it.
//!
//! Notes and non-goals
//! - Single-threaded use; containers are `Send`/`Sync` only as their
//!   element and allocator types allow.
//! - No ordered map, no reverse map traversal, no concurrent access.

pub mod alloc;
pub mod chained_map;
mod chained_map_proptest;
pub mod cursor;
pub mod error;
pub mod vector;
mod vector_proptest;

// Public surface
pub use alloc::{Allocator, Global, RawBlock};
pub use chained_map::{ChainedHashMap, MapCursor, NodeKey};
pub use cursor::Cursor;
pub use error::{AllocError, Error};
pub use vector::{ArrayCursor, Vector};

/// Build a [`Vector`] with `vec!`-style syntax.
///
/// ```
/// let v = rwstd::vector![1, 2, 3];
/// assert_eq!(v, [1, 2, 3]);
/// let z = rwstd::vector![0u8; 4];
/// assert_eq!(z.len(), 4);
/// ```
#[macro_export]
macro_rules! vector {
    () => {
        $crate::Vector::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::Vector::from_elem($n, $elem)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::Vector::from([$($x),+])
    };
}
