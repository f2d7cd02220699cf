// Vector integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Growth: capacity doubles from a floor of 2 and is always >= len.
// - Positional edits: insert/erase shift the tail and keep order.
// - Independence: clones own their storage.
// - Panic safety: a panic while building new values leaves the vector
//   unchanged and drops exactly what was built.
use rwstd::{vector, ArrayCursor, Error, Vector};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

// Test: literal construction, caller-side sort, then positional insert.
// Assumes: Vector derefs to a mutable slice.
// Verifies: {5,4,3,2,1} sorts to {1,2,3,4,5}; inserting 20 at index 2
// yields {1,2,20,3,4,5} with len 6.
#[test]
fn sort_then_insert_in_the_middle() {
    let mut v = vector![5, 4, 3, 2, 1];
    v.sort();
    assert_eq!(v, [1, 2, 3, 4, 5]);

    let c = v.insert(v.begin() + 2, 20);
    assert_eq!(v, [1, 2, 20, 3, 4, 5]);
    assert_eq!(v.len(), 6);
    assert_eq!(*c.get(&v), 20);
}

// Test: push_back growth sequence.
// Verifies: len == N after N pushes; capacity is 2 * 2^k, >= len, never below 2.
#[test]
fn capacity_is_power_of_two_scaled() {
    let mut v = Vector::new();
    for n in 1..=1000usize {
        v.push_back(n);
        assert_eq!(v.len(), n);
        let cap = v.capacity();
        assert!(cap >= n && cap >= 2);
        assert!(cap.is_power_of_two(), "capacity {cap} is not a doubling of 2");
    }
}

// Test: boundary behavior of `at` and `pop_back`.
// Verifies: `at(len)` reports index and len; `at(len - 1)` succeeds;
// popping an empty vector is a no-op.
#[test]
fn range_checks_and_empty_pop() {
    let v = vector![10, 20, 30];
    assert_eq!(v.at(2), Ok(&30));
    match v.at(3) {
        Err(Error::OutOfRange { index, len }) => assert_eq!((index, len), (3, 3)),
        other => panic!("expected OutOfRange, got {other:?}"),
    }

    let mut empty: Vector<i32> = Vector::new();
    assert_eq!(empty.pop_back(), None);
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.capacity(), 2);
}

// Test: copies are deep.
// Verifies: mutating, growing or clearing a clone never changes the original.
#[test]
fn clone_then_mutate_leaves_original() {
    let original: Vector<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let mut copy = original.clone();
    copy[0].push('!');
    copy.push_back("d".to_string());
    copy.erase(copy.begin());
    assert_eq!(original, ["a", "b", "c"].map(String::from));
    copy.clear();
    assert_eq!(original.len(), 3);
}

// Test: shrink_to_fit idempotence.
// Verifies: two consecutive calls leave the same capacity.
#[test]
fn shrink_to_fit_twice_is_stable() {
    let mut v: Vector<u8> = (0..100).collect();
    v.erase_range(v.begin() + 10, v.end());
    v.shrink_to_fit();
    let first = v.capacity();
    v.shrink_to_fit();
    assert_eq!(v.capacity(), first);
    assert_eq!(first, 10);
}

// Test: cursor traversal in both directions.
// Verifies: the [begin, end) walk visits elements in order and the reverse
// walk visits them backwards.
#[test]
fn cursor_walks_forward_and_back() {
    let v = vector!['a', 'b', 'c', 'd'];
    let mut forward = Vec::new();
    let mut c = v.begin();
    while c != v.end() {
        forward.push(*c.post_inc().get(&v));
    }
    assert_eq!(forward, ['a', 'b', 'c', 'd']);

    let mut backward = Vec::new();
    let mut c = v.end();
    while c != v.begin() {
        backward.push(*c.dec().get(&v));
    }
    assert_eq!(backward, ['d', 'c', 'b', 'a']);
    assert_eq!(v.end() - v.begin(), 4);
    assert_eq!(*v.begin().nth(&v, 2), 'c');
}

// Test: mutation through cursors.
// Verifies: writes through get_mut are visible to slice access.
#[test]
fn cursor_writes_are_visible() {
    let mut v = vector![1, 2, 3];
    let mut c: ArrayCursor<i32> = v.begin();
    while c != v.end() {
        *c.get_mut(&mut v) *= 10;
        c += 1;
    }
    assert_eq!(v.as_slice(), &[10, 20, 30]);
}

// Test: a reserve request beyond max_size.
// Verifies: LengthError is returned and the vector is unchanged.
#[test]
fn reserve_past_max_size_is_rejected() {
    let mut v = vector![1u64, 2, 3];
    let cap = v.capacity();
    let too_many = v.max_size() + 1;
    match v.reserve(too_many) {
        Err(Error::Length { requested, max }) => {
            assert_eq!(requested, too_many);
            assert_eq!(max, v.max_size());
        }
        other => panic!("expected LengthError, got {other:?}"),
    }
    assert_eq!(v, [1, 2, 3]);
    assert_eq!(v.capacity(), cap);
}

struct Bomb {
    value: u32,
    clones_left: Rc<Cell<u32>>,
    alive: Rc<Cell<usize>>,
}

impl Bomb {
    fn new(value: u32, clones_left: &Rc<Cell<u32>>, alive: &Rc<Cell<usize>>) -> Self {
        alive.set(alive.get() + 1);
        Self {
            value,
            clones_left: clones_left.clone(),
            alive: alive.clone(),
        }
    }
}

impl Clone for Bomb {
    fn clone(&self) -> Self {
        let left = self.clones_left.get();
        if left == 0 {
            panic!("clone budget exhausted");
        }
        self.clones_left.set(left - 1);
        Self::new(self.value, &self.clones_left, &self.alive)
    }
}

impl Drop for Bomb {
    fn drop(&mut self) {
        self.alive.set(self.alive.get() - 1);
    }
}

// Test: panic while cloning the values for insert_n.
// Assumes: values are staged before any element shifts.
// Verifies: the vector is unchanged and every staged clone is dropped.
#[test]
fn panicking_clone_during_insert_n_leaves_vector_intact() {
    let budget = Rc::new(Cell::new(u32::MAX));
    let alive = Rc::new(Cell::new(0));
    let mut v: Vector<Bomb> = Vector::new();
    for i in 0..4 {
        v.push_back(Bomb::new(i, &budget, &alive));
    }
    let cap = v.capacity();

    budget.set(2);
    let result = catch_unwind(AssertUnwindSafe(|| {
        v.insert_n(v.begin() + 1, 5, Bomb::new(99, &budget, &alive));
    }));
    assert!(result.is_err());
    assert_eq!(alive.get(), 4, "staged clones and the template are dropped");
    let values: Vec<u32> = v.iter().map(|b| b.value).collect();
    assert_eq!(values, [0, 1, 2, 3]);
    assert_eq!(v.capacity(), cap);
}

// Test: panic while cloning the whole vector.
// Verifies: the partial copy is dropped and the source is untouched.
#[test]
fn panicking_clone_of_vector_drops_partial_copy() {
    let budget = Rc::new(Cell::new(u32::MAX));
    let alive = Rc::new(Cell::new(0));
    let v: Vector<Bomb> = (0..6).map(|i| Bomb::new(i, &budget, &alive)).collect();

    budget.set(3);
    let result = catch_unwind(AssertUnwindSafe(|| v.clone()));
    assert!(result.is_err());
    assert_eq!(alive.get(), 6);
    drop(v);
    assert_eq!(alive.get(), 0);
}

// Test: panic inside an emplace closure.
// Verifies: the vector is unchanged.
#[test]
fn panicking_emplace_leaves_vector_intact() {
    let mut v = vector![1, 2, 3];
    let result = catch_unwind(AssertUnwindSafe(|| {
        v.emplace(v.begin() + 1, || panic!("no value today"));
    }));
    assert!(result.is_err());
    assert_eq!(v, [1, 2, 3]);
}

// Test: owned iteration.
// Verifies: into_iter yields in order from both ends; dropping a partially
// consumed iterator drops the rest.
#[test]
fn into_iter_drains_and_drops_remainder() {
    let budget = Rc::new(Cell::new(u32::MAX));
    let alive = Rc::new(Cell::new(0));
    let v: Vector<Bomb> = (0..5).map(|i| Bomb::new(i, &budget, &alive)).collect();
    let mut it = v.into_iter();
    assert_eq!(it.len(), 5);
    assert_eq!(it.next().map(|b| b.value), Some(0));
    assert_eq!(it.next_back().map(|b| b.value), Some(4));
    assert_eq!(alive.get(), 3);
    drop(it);
    assert_eq!(alive.get(), 0);
}

// Test: swap and take exchange storage, not elements.
#[test]
fn swap_and_take() {
    let mut a = vector![1, 2, 3];
    let mut b = vector![9];
    a.swap(&mut b);
    assert_eq!(a, [9]);
    assert_eq!(b, [1, 2, 3]);

    let taken = b.take();
    assert_eq!(taken, [1, 2, 3]);
    assert!(b.is_empty());
    assert_eq!(b.capacity(), 2);
}
