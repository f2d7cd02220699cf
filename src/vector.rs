//! Vector: contiguous, amortized-growth sequence over an explicit allocator.
//!
//! Storage is one `RawBlock` of `capacity` slots; slots `[0, len)` are live,
//! the rest are allocated but unconstructed. The capacity never drops below
//! `MIN_CAPACITY`, including after `take`, `clear` and `shrink_to_fit`.
//!
//! Relocation (growth, `reserve`, `shrink_to_fit`) allocates the new block
//! first and only then moves the live values across, so an allocation
//! failure leaves the vector exactly as it was. Moves are bitwise and cannot
//! fail; values built by user code (`Clone`, `Default`, `emplace` closures,
//! iterator items) are built before any live slot is shifted, and a panic
//! while building drops whatever was already built and frees its storage.

use crate::alloc::{Allocator, Global, RawBlock};
use crate::cursor::Cursor;
use crate::error::{Error, OrRaise};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};
use core::ptr;
use core::slice;
use tracing::{debug, trace};

/// Capacity floor for every vector.
pub const MIN_CAPACITY: usize = 2;

/// Random-access cursor into a `Vector<T, _>` (or any `[T]`).
pub type ArrayCursor<T> = Cursor<usize, [T]>;

/// Capacity used when a vector is sized from an element count.
#[inline]
fn sized_capacity(len: usize) -> usize {
    len.saturating_mul(2).max(MIN_CAPACITY)
}

pub struct Vector<T, A: Allocator = Global> {
    block: RawBlock<T, A>,
    len: usize,
}

impl<T> Vector<T> {
    /// Empty vector with capacity `MIN_CAPACITY`.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// `len` default-constructed values, capacity `2 * len`.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    /// `len` clones of `value`, capacity `2 * len`.
    pub fn from_elem(len: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(len, value, Global)
    }
}

impl<T, A: Allocator> Vector<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self::with_capacity_in(MIN_CAPACITY, alloc)
    }

    /// Empty vector with room for at least `capacity` values.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::try_with_capacity_in(capacity, alloc).or_raise()
    }

    fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        let block = RawBlock::allocate_in(capacity.max(MIN_CAPACITY), alloc)?;
        Ok(Self { block, len: 0 })
    }

    pub fn with_len_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut v = Self::with_capacity_in(sized_capacity(len), alloc);
        for _ in 0..len {
            // SAFETY: capacity was sized for `len` values.
            unsafe { v.construct_at_end(T::default()) };
        }
        v
    }

    pub fn from_elem_in(len: usize, value: T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(sized_capacity(len), alloc);
        if len > 0 {
            for _ in 1..len {
                // SAFETY: capacity was sized for `len` values.
                unsafe { v.construct_at_end(value.clone()) };
            }
            // SAFETY: as above; the last slot takes the original.
            unsafe { v.construct_at_end(value) };
        }
        v
    }

    /// Construct `value` in slot `len`.
    ///
    /// # Safety
    /// `len < capacity`.
    #[inline]
    unsafe fn construct_at_end(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        self.block
            .allocator()
            .construct(self.block.slot(self.len), value);
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Largest element count the allocator can provide storage for.
    pub fn max_size(&self) -> usize {
        self.block.allocator().max_size::<T>()
    }

    pub fn allocator(&self) -> &A {
        self.block.allocator()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots [0, len) are live and the pointer is aligned and non-null.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, with exclusive access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.block.as_ptr(), self.len) }
    }

    /// Pointer to the first slot; valid until the next relocation.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.block.as_ptr()
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T, Error> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    #[inline]
    pub fn begin(&self) -> ArrayCursor<T> {
        Cursor::new(0)
    }

    #[inline]
    pub fn end(&self) -> ArrayCursor<T> {
        Cursor::new(self.len)
    }

    /// Same as `begin`: whether access is shared or exclusive is decided by
    /// the borrow handed to `Cursor::get`/`get_mut`.
    #[inline]
    pub fn cbegin(&self) -> ArrayCursor<T> {
        self.begin()
    }

    #[inline]
    pub fn cend(&self) -> ArrayCursor<T> {
        self.end()
    }

    /// Index named by an insertion cursor. Panics on null or beyond `len`.
    #[track_caller]
    fn insertion_index(&self, pos: ArrayCursor<T>) -> usize {
        match pos.position() {
            Some(i) if i <= self.len => i,
            Some(i) => panic!("insertion cursor {i} is beyond len {}", self.len),
            None => panic!("insertion through a null cursor"),
        }
    }

    /// Grow to at least `capacity` slots. No-op when already large enough.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), Error> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        let max = self.max_size();
        if capacity > max {
            return Err(Error::Length {
                requested: capacity,
                max,
            });
        }
        self.relocate(capacity)
    }

    /// Make room for `additional` more values, doubling the capacity as often
    /// as needed.
    fn grow_for(&mut self, additional: usize) -> Result<(), Error> {
        let max = self.max_size();
        let needed = match self.len.checked_add(additional) {
            Some(n) if n <= max => n,
            _ => {
                return Err(Error::Length {
                    requested: self.len.saturating_add(additional),
                    max,
                })
            }
        };
        if needed <= self.capacity() {
            return Ok(());
        }
        let mut cap = self.capacity().max(MIN_CAPACITY);
        while cap < needed {
            cap = cap.saturating_mul(2);
        }
        self.relocate(cap.min(max))
    }

    /// Move every live value into a fresh block of exactly `new_cap` slots.
    ///
    /// The new block is obtained before anything moves; on failure the
    /// vector is untouched.
    fn relocate(&mut self, new_cap: usize) -> Result<(), Error> {
        debug_assert!(new_cap >= self.len && new_cap >= MIN_CAPACITY);
        let fresh = RawBlock::allocate_in(new_cap, self.block.allocator().clone())?;
        // SAFETY: both blocks hold at least `len` slots and do not overlap.
        // The old slots are left moved-from; releasing the old block below
        // frees their storage without dropping anything.
        unsafe {
            ptr::copy_nonoverlapping(self.block.as_ptr(), fresh.as_ptr(), self.len);
        }
        let old = mem::replace(&mut self.block, fresh);
        trace!(
            from = old.capacity(),
            to = new_cap,
            len = self.len,
            "vector relocated"
        );
        drop(old);
        Ok(())
    }

    /// Reallocate down to `max(len, MIN_CAPACITY)` slots. Idempotent.
    pub fn shrink_to_fit(&mut self) {
        let target = self.len.max(MIN_CAPACITY);
        if target == self.capacity() {
            return;
        }
        debug!(from = self.capacity(), to = target, "vector shrink_to_fit");
        self.relocate(target).or_raise();
    }

    pub fn try_push_back(&mut self, value: T) -> Result<(), Error> {
        self.grow_for(1)?;
        // SAFETY: grow_for guarantees len < capacity.
        unsafe { self.construct_at_end(value) };
        Ok(())
    }

    #[track_caller]
    pub fn push_back(&mut self, value: T) {
        self.try_push_back(value).or_raise()
    }

    /// Construct the new last element from `make` and return it.
    ///
    /// Capacity is secured before `make` runs; if `make` panics, the contents
    /// are unchanged.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.grow_for(1).or_raise();
        let value = make();
        // SAFETY: grow_for guarantees len < capacity; slot len - 1 is live afterwards.
        unsafe {
            self.construct_at_end(value);
            &mut *self.block.as_ptr().add(self.len - 1)
        }
    }

    /// Remove and return the last element; `None` (and no change) when empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot len was live and is now outside the live range.
        Some(unsafe { ptr::read(self.block.as_ptr().add(self.len)) })
    }

    /// Insert `value` before `pos`, returning a cursor to it.
    #[track_caller]
    pub fn try_insert(&mut self, pos: ArrayCursor<T>, value: T) -> Result<ArrayCursor<T>, Error> {
        let idx = self.insertion_index(pos);
        self.grow_for(1)?;
        // SAFETY: idx <= len < capacity. The tail [idx, len) shifts one slot to
        // the right into allocated space, leaving slot idx vacated for `value`.
        unsafe {
            let at = self.block.slot(idx);
            ptr::copy(at.as_ptr(), at.as_ptr().add(1), self.len - idx);
            self.block.allocator().construct(at, value);
        }
        self.len += 1;
        Ok(Cursor::new(idx))
    }

    #[track_caller]
    pub fn insert(&mut self, pos: ArrayCursor<T>, value: T) -> ArrayCursor<T> {
        self.try_insert(pos, value).or_raise()
    }

    /// Build a value with `make` and insert it before `pos`.
    ///
    /// The value is built into a temporary before any element moves.
    #[track_caller]
    pub fn emplace<F>(&mut self, pos: ArrayCursor<T>, make: F) -> ArrayCursor<T>
    where
        F: FnOnce() -> T,
    {
        let idx = self.insertion_index(pos);
        let value = make();
        self.insert(Cursor::new(idx), value)
    }

    /// Insert `count` copies of `value` before `pos`.
    #[track_caller]
    pub fn insert_n(&mut self, pos: ArrayCursor<T>, count: usize, value: T) -> ArrayCursor<T>
    where
        T: Clone,
    {
        let idx = self.insertion_index(pos);
        let staged = Self::from_elem_in(count, value, self.block.allocator().clone());
        self.splice_staged(idx, staged)
    }

    /// Insert every item of `items`, in order, before `pos`.
    #[track_caller]
    pub fn insert_iter<I>(&mut self, pos: ArrayCursor<T>, items: I) -> ArrayCursor<T>
    where
        I: IntoIterator<Item = T>,
    {
        let idx = self.insertion_index(pos);
        let mut staged = Self::new_in(self.block.allocator().clone());
        staged.extend(items);
        self.splice_staged(idx, staged)
    }

    #[track_caller]
    pub fn insert_slice(&mut self, pos: ArrayCursor<T>, items: &[T]) -> ArrayCursor<T>
    where
        T: Clone,
    {
        self.insert_iter(pos, items.iter().cloned())
    }

    /// Move all values of `staged` into the gap opened at `idx`.
    fn splice_staged(&mut self, idx: usize, mut staged: Self) -> ArrayCursor<T> {
        let count = staged.len;
        if count == 0 {
            return Cursor::new(idx);
        }
        self.grow_for(count).or_raise();
        // SAFETY: idx <= len and len + count <= capacity. The tail moves right
        // by `count`; the staged values are moved into the gap and `staged`
        // gives up ownership of them before it is dropped.
        unsafe {
            let at = self.block.as_ptr().add(idx);
            ptr::copy(at, at.add(count), self.len - idx);
            ptr::copy_nonoverlapping(staged.block.as_ptr(), at, count);
            staged.len = 0;
        }
        self.len += count;
        Cursor::new(idx)
    }

    /// Remove the element at `pos`; returns a cursor to the element that
    /// followed it (now at the same position).
    #[track_caller]
    pub fn erase(&mut self, pos: ArrayCursor<T>) -> ArrayCursor<T> {
        let idx = match pos.position() {
            Some(i) if i < self.len => i,
            _ => panic!("erase cursor {:?} does not name an element (len {})", pos, self.len),
        };
        // SAFETY: idx < len. The value is moved out, the tail closes the gap,
        // and only then is the value dropped, so a panicking Drop sees a
        // consistent vector.
        let removed = unsafe {
            let at = self.block.as_ptr().add(idx);
            let removed = ptr::read(at);
            ptr::copy(at.add(1), at, self.len - idx - 1);
            removed
        };
        self.len -= 1;
        drop(removed);
        Cursor::new(idx)
    }

    /// Remove `[first, last)`; returns a cursor to the element that followed.
    #[track_caller]
    pub fn erase_range(&mut self, first: ArrayCursor<T>, last: ArrayCursor<T>) -> ArrayCursor<T> {
        let i = self.insertion_index(first);
        let j = self.insertion_index(last);
        assert!(i <= j, "erase range is reversed: {i} > {j}");
        let old_len = self.len;
        // Values past `i` are unreachable until the tail is moved back; if a
        // destructor panics they leak rather than being dropped twice.
        self.len = i;
        // SAFETY: [i, j) are live and dropped exactly once; [j, old_len) are
        // live and move down to start at i.
        unsafe {
            for k in i..j {
                self.block.allocator().destroy(self.block.slot(k));
            }
            let base = self.block.as_ptr();
            ptr::copy(base.add(j), base.add(i), old_len - j);
        }
        self.len = i + (old_len - j);
        Cursor::new(i)
    }

    /// Drop every element. The current block is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let old_len = mem::replace(&mut self.len, new_len);
        for k in new_len..old_len {
            // SAFETY: slot k was live and is now outside the live range.
            unsafe { self.block.allocator().destroy(self.block.slot(k)) };
        }
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move the contents out, leaving `self` empty with a fresh minimal block.
    pub fn take(&mut self) -> Self {
        let fresh = Self::new_in(self.block.allocator().clone());
        mem::replace(self, fresh)
    }
}

impl<T, A: Allocator> Drop for Vector<T, A> {
    fn drop(&mut self) {
        self.truncate(0);
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Deref for Vector<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for Vector<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, A: Allocator> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_capacity_in(sized_capacity(self.len), self.block.allocator().clone());
        for item in self.as_slice() {
            // SAFETY: capacity was sized for `len` values.
            unsafe { out.construct_at_end(item.clone()) };
        }
        out
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq<U>, U, A: Allocator, B: Allocator> PartialEq<Vector<U, B>> for Vector<T, A> {
    fn eq(&self, other: &Vector<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: Allocator> Eq for Vector<T, A> {}

impl<T: PartialEq<U>, U, A: Allocator, const N: usize> PartialEq<[U; N]> for Vector<T, A> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: Hash, A: Allocator> Hash for Vector<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, A: Allocator> Extend<T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.grow_for(lower).or_raise();
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, A: Allocator> IntoIterator for Vector<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let me = ManuallyDrop::new(self);
        // SAFETY: `me` is never dropped, so the block has exactly one owner.
        let block = unsafe { ptr::read(&me.block) };
        IntoIter {
            block,
            start: 0,
            end: me.len,
        }
    }
}

/// Owning iterator; drops whatever it has not yielded.
pub struct IntoIter<T, A: Allocator = Global> {
    block: RawBlock<T, A>,
    start: usize,
    end: usize,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: slots [start, end) are live; start leaves the live range.
        let item = unsafe { ptr::read(self.block.as_ptr().add(self.start)) };
        self.start += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot end was live and has left the live range.
        Some(unsafe { ptr::read(self.block.as_ptr().add(self.end)) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        while self.start < self.end {
            let k = self.start;
            self.start += 1;
            // SAFETY: slot k was live and has left the live range.
            unsafe { self.block.allocator().destroy(self.block.slot(k)) };
        }
    }
}
