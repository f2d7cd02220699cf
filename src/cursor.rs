//! Cursors: position values that traverse a container without borrowing it.
//!
//! A `Cursor<P, C>` wraps one raw position `P` belonging to a container of
//! type `C`. It is `Copy`, compares by position, and never touches the
//! container on its own: dereferencing and advancing take the owner as an
//! argument, so holding a cursor does not prevent mutating the container.
//! The owner decides what a position means via [`Resolve`] and, for
//! forward-only traversal, [`Successor`].
//!
//! The null cursor (`Cursor::null()`, also `Default`) is the singular value.
//! For forward cursors it doubles as the universal end-marker, so end
//! cursors obtained from different maps compare equal. Dereferencing a null,
//! past-the-end, or stale cursor panics.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// Maps a position to the element stored there.
pub trait Resolve<P> {
    /// Shared view of the element at a position.
    type Ref<'a>
    where
        Self: 'a;

    /// Exclusive view of the element at a position.
    type Mut<'a>
    where
        Self: 'a;

    /// `None` when `pos` does not name a live element.
    fn resolve(&self, pos: P) -> Option<Self::Ref<'_>>;

    fn resolve_mut(&mut self, pos: P) -> Option<Self::Mut<'_>>;
}

/// Forward-only traversal order over live positions.
pub trait Successor<P>: Resolve<P> {
    /// The position after `pos`, or `None` once the sequence is exhausted.
    ///
    /// Panics if `pos` does not name a live element.
    fn successor(&self, pos: P) -> Option<P>;
}

impl<T> Resolve<usize> for [T] {
    type Ref<'a>
        = &'a T
    where
        Self: 'a;
    type Mut<'a>
        = &'a mut T
    where
        Self: 'a;

    #[inline]
    fn resolve(&self, pos: usize) -> Option<&T> {
        self.get(pos)
    }

    #[inline]
    fn resolve_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.get_mut(pos)
    }
}

pub struct Cursor<P, C: ?Sized> {
    pos: Option<P>,
    _owner: PhantomData<fn() -> *const C>,
}

impl<P: Copy, C: ?Sized> Cursor<P, C> {
    /// The singular cursor. Usable for assignment and comparison only.
    #[inline]
    pub const fn null() -> Self {
        Self {
            pos: None,
            _owner: PhantomData,
        }
    }

    #[inline]
    pub(crate) const fn new(pos: P) -> Self {
        Self {
            pos: Some(pos),
            _owner: PhantomData,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.pos.is_none()
    }

    /// The wrapped raw position, if any.
    #[inline]
    pub fn position(&self) -> Option<P> {
        self.pos
    }
}

impl<P: Copy, C: ?Sized + Resolve<P>> Cursor<P, C> {
    /// Element under the cursor, or `None` for null, past-the-end and stale cursors.
    #[inline]
    pub fn try_get<'a>(&self, owner: &'a C) -> Option<C::Ref<'a>> {
        owner.resolve(self.pos?)
    }

    /// Element under the cursor.
    ///
    /// Panics when the cursor does not name a live element of `owner`.
    #[inline]
    #[track_caller]
    pub fn get<'a>(&self, owner: &'a C) -> C::Ref<'a> {
        match self.try_get(owner) {
            Some(r) => r,
            None => invalid_deref(),
        }
    }

    #[inline]
    #[track_caller]
    pub fn get_mut<'a>(&self, owner: &'a mut C) -> C::Mut<'a> {
        let resolved = match self.pos {
            Some(p) => owner.resolve_mut(p),
            None => None,
        };
        match resolved {
            Some(r) => r,
            None => invalid_deref(),
        }
    }
}

impl<P: Copy, C: ?Sized + Successor<P>> Cursor<P, C> {
    /// Pre-increment: step to the next live position (or the end-marker).
    #[track_caller]
    pub fn advance(&mut self, owner: &C) -> &mut Self {
        match self.pos {
            Some(p) => self.pos = owner.successor(p),
            None => panic!("advanced a null cursor"),
        }
        self
    }

    /// Post-increment: step forward and return the cursor as it was.
    #[track_caller]
    pub fn post_advance(&mut self, owner: &C) -> Self {
        let old = *self;
        self.advance(owner);
        old
    }
}

// Random access over index positions.
impl<C: ?Sized> Cursor<usize, C> {
    #[inline]
    #[track_caller]
    fn index(&self) -> usize {
        match self.pos {
            Some(i) => i,
            None => panic!("arithmetic on a null cursor"),
        }
    }

    /// Cursor `delta` positions away. Panics if that leaves `0..=usize::MAX`.
    #[inline]
    #[track_caller]
    pub fn offset(self, delta: isize) -> Self {
        let i = self.index();
        match i.checked_add_signed(delta) {
            Some(j) => Self::new(j),
            None => panic!("cursor offset {delta} from position {i} leaves the addressable range"),
        }
    }

    #[inline]
    #[track_caller]
    pub fn inc(&mut self) -> &mut Self {
        *self = self.offset(1);
        self
    }

    #[inline]
    #[track_caller]
    pub fn dec(&mut self) -> &mut Self {
        *self = self.offset(-1);
        self
    }

    #[inline]
    #[track_caller]
    pub fn post_inc(&mut self) -> Self {
        let old = *self;
        self.inc();
        old
    }

    #[inline]
    #[track_caller]
    pub fn post_dec(&mut self) -> Self {
        let old = *self;
        self.dec();
        old
    }

    /// Signed distance `self - origin`.
    #[inline]
    #[track_caller]
    pub fn distance_from(self, origin: Self) -> isize {
        self.index().wrapping_sub(origin.index()) as isize
    }

    /// Indexed offset-dereference: the element `n` positions away.
    #[inline]
    #[track_caller]
    pub fn nth<'a>(&self, owner: &'a C, n: isize) -> C::Ref<'a>
    where
        C: Resolve<usize>,
    {
        self.offset(n).get(owner)
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn invalid_deref() -> ! {
    panic!("dereferenced a cursor that does not name a live element")
}

impl<C: ?Sized> Add<isize> for Cursor<usize, C> {
    type Output = Self;
    #[track_caller]
    fn add(self, rhs: isize) -> Self {
        self.offset(rhs)
    }
}

impl<C: ?Sized> Sub<isize> for Cursor<usize, C> {
    type Output = Self;
    #[track_caller]
    fn sub(self, rhs: isize) -> Self {
        match rhs.checked_neg() {
            Some(neg) => self.offset(neg),
            None => panic!("cursor offset overflow"),
        }
    }
}

impl<C: ?Sized> AddAssign<isize> for Cursor<usize, C> {
    #[track_caller]
    fn add_assign(&mut self, rhs: isize) {
        *self = *self + rhs;
    }
}

impl<C: ?Sized> SubAssign<isize> for Cursor<usize, C> {
    #[track_caller]
    fn sub_assign(&mut self, rhs: isize) {
        *self = *self - rhs;
    }
}

impl<C: ?Sized> Sub for Cursor<usize, C> {
    type Output = isize;
    #[track_caller]
    fn sub(self, rhs: Self) -> isize {
        self.distance_from(rhs)
    }
}

impl<C: ?Sized> PartialOrd for Cursor<usize, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: ?Sized> Ord for Cursor<usize, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pos.cmp(&other.pos)
    }
}

impl<P: Copy, C: ?Sized> Clone for Cursor<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Copy, C: ?Sized> Copy for Cursor<P, C> {}

impl<P: PartialEq, C: ?Sized> PartialEq for Cursor<P, C> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl<P: Eq, C: ?Sized> Eq for Cursor<P, C> {}

impl<P: Hash, C: ?Sized> Hash for Cursor<P, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pos.hash(state);
    }
}

impl<P: Copy, C: ?Sized> Default for Cursor<P, C> {
    fn default() -> Self {
        Self::null()
    }
}

impl<P: fmt::Debug, C: ?Sized> fmt::Debug for Cursor<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(p) => f.debug_tuple("Cursor").field(p).finish(),
            None => f.write_str("Cursor(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type SliceCursor = Cursor<usize, [i32]>;

    /// Invariant: Stepping, offsetting and distance agree with slice positions.
    #[test]
    fn random_access_arithmetic() {
        let data = [10, 20, 30, 40];
        let begin = SliceCursor::new(0);
        let end = SliceCursor::new(data.len());

        assert_eq!(end - begin, 4);
        assert_eq!(begin - end, -4);
        assert_eq!(*(begin + 2).get(&data[..]), 30);
        assert_eq!(*begin.nth(&data[..], 3), 40);

        let mut c = begin;
        assert_eq!(c.post_inc(), begin);
        assert_eq!(*c.get(&data[..]), 20);
        c.inc();
        c += 1;
        assert_eq!(*c.get(&data[..]), 40);
        c -= 2;
        assert_eq!(*c.get(&data[..]), 20);
        assert_eq!(*c.post_dec().get(&data[..]), 20);
        assert_eq!(c, begin);
        assert_eq!(end.offset(-1), SliceCursor::new(3));
    }

    /// Invariant: Ordering follows position order; null sorts first.
    #[test]
    fn ordering_follows_positions() {
        let a = SliceCursor::new(1);
        let b = SliceCursor::new(2);
        assert!(a < b && a <= b && b > a && b >= a && a != b);
        assert!(a <= a && a >= a);
        assert!(SliceCursor::null() < a);
    }

    /// Invariant: Mutation through a cursor writes the addressed slot only.
    #[test]
    fn get_mut_writes_in_place() {
        let mut data = [1, 2, 3];
        let c = SliceCursor::new(1);
        *c.get_mut(&mut data[..]) = 9;
        assert_eq!(data, [1, 9, 3]);
    }

    /// Invariant: Default cursors are null and compare equal to each other.
    #[test]
    fn default_is_null() {
        let c = SliceCursor::default();
        assert!(c.is_null());
        assert_eq!(c, SliceCursor::null());
        assert_eq!(c.position(), None);
        assert_eq!(format!("{:?}", c), "Cursor(null)");
        assert_eq!(format!("{:?}", SliceCursor::new(4)), "Cursor(4)");
    }

    /// Invariant: Past-the-end cursors resolve to nothing via `try_get`.
    #[test]
    fn past_the_end_does_not_resolve() {
        let data = [1, 2, 3];
        assert!(SliceCursor::new(3).try_get(&data[..]).is_none());
        assert!(SliceCursor::null().try_get(&data[..]).is_none());
    }

    #[test]
    #[should_panic(expected = "does not name a live element")]
    fn deref_null_panics() {
        let data = [1, 2, 3];
        let _ = SliceCursor::null().get(&data[..]);
    }

    #[test]
    #[should_panic(expected = "does not name a live element")]
    fn deref_past_the_end_panics() {
        let data = [1, 2, 3];
        let _ = SliceCursor::new(3).get(&data[..]);
    }

    #[test]
    #[should_panic(expected = "null cursor")]
    fn arithmetic_on_null_panics() {
        let _ = SliceCursor::null() + 1;
    }

    #[test]
    #[should_panic(expected = "leaves the addressable range")]
    fn stepping_before_start_panics() {
        let mut c = SliceCursor::new(0);
        c.dec();
    }
}
