//! Error kinds surfaced by the allocator and both containers.

use core::alloc::Layout;
use thiserror::Error;

/// Failure to obtain storage from an [`Allocator`](crate::alloc::Allocator).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum AllocError {
    /// `count * elem_size` cannot be described by a `Layout`.
    #[error("allocation of {count} elements of {elem_size} bytes overflows the address space")]
    CapacityOverflow { count: usize, elem_size: usize },
    /// The underlying system allocator could not satisfy the request.
    #[error("memory allocation of {} bytes failed", layout.size())]
    OutOfMemory { layout: Layout },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error("range check: index {index} >= len {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("requested capacity {requested} exceeds the maximum of {max} elements")]
    Length { requested: usize, max: usize },
}

/// Resolve a result from an infallible entry point: out-of-memory goes to
/// `handle_alloc_error`, anything else panics with the error text.
pub(crate) trait OrRaise<T> {
    fn or_raise(self) -> T;
}

impl<T> OrRaise<T> for Result<T, Error> {
    #[inline]
    #[track_caller]
    fn or_raise(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => raise(e),
        }
    }
}

impl<T> OrRaise<T> for Result<T, AllocError> {
    #[inline]
    #[track_caller]
    fn or_raise(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => raise(e.into()),
        }
    }
}

/// Diverge on an error reached through an infallible entry point.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn raise(e: Error) -> ! {
    match e {
        Error::Alloc(AllocError::OutOfMemory { layout }) => std::alloc::handle_alloc_error(layout),
        other => panic!("{other}"),
    }
}
