//! Raw memory provider used by both containers.
//!
//! Allocation and construction are separate steps: `allocate` hands out
//! uninitialized storage, `construct`/`destroy` move a value in or drop it
//! in place, and `deallocate` returns the storage. Containers drive all four
//! explicitly and never assume storage is zeroed.

use crate::error::AllocError;
use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

/// Allocation strategy shared by `Vector` and `ChainedHashMap`.
///
/// Handles are cheap to clone and carry no ownership: two handles of the
/// same concrete type are interchangeable, so storage obtained from one may
/// be released through another.
pub trait Allocator: Clone + PartialEq {
    /// Obtain uninitialized storage for exactly `n` values of `T`.
    ///
    /// Zero-sized requests succeed with a dangling, well-aligned pointer.
    fn allocate<T>(&self, n: usize) -> Result<NonNull<T>, AllocError>;

    /// Release storage obtained from `allocate`.
    ///
    /// # Safety
    /// `ptr` must come from `allocate::<T>(n)` on an equal allocator, with the
    /// same `n`, and must not have been released already. Any values still
    /// living in the block are leaked, not dropped.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, n: usize);

    /// Move `value` into the uninitialized slot at `slot`.
    ///
    /// # Safety
    /// `slot` must be valid for writes and must not hold a live value.
    #[inline]
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        slot.as_ptr().write(value);
    }

    /// Drop the live value at `slot` in place, leaving it uninitialized.
    ///
    /// # Safety
    /// `slot` must hold a live value that nothing else will drop.
    #[inline]
    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        ptr::drop_in_place(slot.as_ptr());
    }

    /// Largest element count `allocate::<T>` can describe.
    #[inline]
    fn max_size<T>(&self) -> usize {
        max_elements::<T>()
    }
}

/// The process-wide system allocator.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Global;

impl Allocator for Global {
    fn allocate<T>(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        let layout = array_layout::<T>(n)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { std::alloc::alloc(layout) };
        NonNull::new(raw.cast::<T>()).ok_or(AllocError::OutOfMemory { layout })
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, n: usize) {
        // A block that was handed out always has a valid layout.
        if let Ok(layout) = Layout::array::<T>(n) {
            if layout.size() != 0 {
                std::alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
            }
        }
    }
}

/// Layout of `n` contiguous `T`, or the overflow that prevents it.
pub fn array_layout<T>(n: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(n).map_err(|_| AllocError::CapacityOverflow {
        count: n,
        elem_size: mem::size_of::<T>(),
    })
}

/// Element count at which `n * size_of::<T>()` would exceed `isize::MAX`.
pub const fn max_elements<T>() -> usize {
    let size = mem::size_of::<T>();
    if size == 0 {
        usize::MAX
    } else {
        isize::MAX as usize / size
    }
}

/// An owned block of `cap` uninitialized slots.
///
/// The block pairs one `allocate` with exactly one `deallocate` (on drop)
/// and never constructs or destroys values itself; whoever tracks which
/// slots are live is responsible for them.
pub struct RawBlock<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

impl<T, A: Allocator> RawBlock<T, A> {
    pub fn allocate_in(cap: usize, alloc: A) -> Result<Self, AllocError> {
        let ptr = alloc.allocate::<T>(cap)?;
        Ok(Self {
            ptr,
            cap,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Slot count; for zero-sized `T` this is the requested count, not a byte size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Pointer to slot `i`.
    ///
    /// # Safety
    /// `i <= capacity()`. Slot `capacity()` is one past the end and may not be
    /// read or written.
    #[inline]
    pub unsafe fn slot(&self, i: usize) -> NonNull<T> {
        debug_assert!(i <= self.cap);
        NonNull::new_unchecked(self.ptr.as_ptr().add(i))
    }
}

impl<T, A: Allocator> Drop for RawBlock<T, A> {
    fn drop(&mut self) {
        // SAFETY: ptr/cap are exactly what allocate returned and were never released.
        unsafe { self.alloc.deallocate(self.ptr, self.cap) }
    }
}

// SAFETY: the block is uniquely owned; sending it sends the slots it owns.
unsafe impl<T: Send, A: Allocator + Send> Send for RawBlock<T, A> {}
// SAFETY: shared access only exposes raw pointers; readers go through the owner.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawBlock<T, A> {}
