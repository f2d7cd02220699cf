#![cfg(test)]

// Property tests for Vector against std::vec::Vec.

use crate::vector::{Vector, MIN_CAPACITY};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::rc::Rc;

// Positions are drawn unbounded and reduced modulo the live length at use,
// so shrinking never produces an out-of-range position.
#[derive(Clone, Debug)]
enum Op {
    PushBack(i32),
    PopBack,
    Insert(usize, i32),
    InsertN(usize, u8, i32),
    InsertSlice(usize, Vec<i32>),
    Erase(usize),
    EraseRange(usize, usize),
    Reserve(u16),
    ShrinkToFit,
    Clear,
    At(usize),
    Set(usize, i32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::PushBack),
        1 => Just(Op::PopBack),
        2 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        1 => (any::<usize>(), 0u8..6, any::<i32>()).prop_map(|(i, n, v)| Op::InsertN(i, n, v)),
        1 => (any::<usize>(), proptest::collection::vec(any::<i32>(), 0..5))
            .prop_map(|(i, s)| Op::InsertSlice(i, s)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => (0u16..200).prop_map(Op::Reserve),
        1 => Just(Op::ShrinkToFit),
        1 => Just(Op::Clear),
        1 => any::<usize>().prop_map(Op::At),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(arb_op(), 1..120)
}

// Property: Vector tracks Vec through arbitrary edit sequences.
// Invariants exercised after every op:
// - Contents and length equal the model's.
// - `len <= capacity` and `capacity >= MIN_CAPACITY`.
// - Positional inserts return a cursor to the first inserted element; erase
//   returns a cursor to the element that followed the erased range.
// - `at` is range-checked exactly at `len`.
// - Capacity only changes on growth, `reserve` and `shrink_to_fit`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_std_vec(ops in arb_ops()) {
        let mut sut: Vector<i32> = Vector::new();
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            let cap_before = sut.capacity();
            match op {
                Op::PushBack(v) => {
                    sut.push_back(v);
                    model.push(v);
                    if model.len() <= cap_before {
                        prop_assert_eq!(sut.capacity(), cap_before, "no growth while room remains");
                    } else {
                        prop_assert_eq!(sut.capacity(), cap_before * 2, "growth doubles");
                    }
                }
                Op::PopBack => {
                    prop_assert_eq!(sut.pop_back(), model.pop());
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                Op::Insert(i, v) => {
                    let i = i % (model.len() + 1);
                    let c = sut.insert(sut.begin() + i as isize, v);
                    model.insert(i, v);
                    prop_assert_eq!(c.position(), Some(i));
                    prop_assert_eq!(*c.get(&sut), v);
                }
                Op::InsertN(i, n, v) => {
                    let i = i % (model.len() + 1);
                    let c = sut.insert_n(sut.begin() + i as isize, n as usize, v);
                    model.splice(i..i, std::iter::repeat(v).take(n as usize));
                    prop_assert_eq!(c.position(), Some(i));
                }
                Op::InsertSlice(i, items) => {
                    let i = i % (model.len() + 1);
                    let c = sut.insert_slice(sut.begin() + i as isize, &items);
                    model.splice(i..i, items.iter().copied());
                    prop_assert_eq!(c.position(), Some(i));
                }
                Op::Erase(i) => {
                    if !model.is_empty() {
                        let i = i % model.len();
                        let c = sut.erase(sut.begin() + i as isize);
                        model.remove(i);
                        prop_assert_eq!(c.position(), Some(i));
                        prop_assert_eq!(c.try_get(&sut), model.get(i));
                    }
                }
                Op::EraseRange(a, b) => {
                    let a = a % (model.len() + 1);
                    let b = b % (model.len() + 1);
                    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                    let c = sut.erase_range(sut.begin() + lo as isize, sut.begin() + hi as isize);
                    model.drain(lo..hi);
                    prop_assert_eq!(c.position(), Some(lo));
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                Op::Reserve(n) => {
                    sut.reserve(n as usize).map_err(|e| TestCaseError::fail(e.to_string()))?;
                    prop_assert!(sut.capacity() >= n as usize);
                    if (n as usize) <= cap_before {
                        prop_assert_eq!(sut.capacity(), cap_before, "reserve never shrinks");
                    }
                }
                Op::ShrinkToFit => {
                    sut.shrink_to_fit();
                    prop_assert_eq!(sut.capacity(), model.len().max(MIN_CAPACITY));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                Op::At(i) => {
                    let i = i % (model.len() + 1);
                    match model.get(i) {
                        Some(v) => prop_assert_eq!(sut.at(i).ok(), Some(v)),
                        None => prop_assert!(sut.at(i).is_err()),
                    }
                }
                Op::Set(i, v) => {
                    if !model.is_empty() {
                        let i = i % model.len();
                        *sut.at_mut(i).map_err(|e| TestCaseError::fail(e.to_string()))? = v;
                        model[i] = v;
                    }
                }
            }

            prop_assert_eq!(sut.as_slice(), model.as_slice());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.len() <= sut.capacity());
            prop_assert!(sut.capacity() >= MIN_CAPACITY);
            prop_assert_eq!(sut.end() - sut.begin(), model.len() as isize);
        }
    }
}

// Element that counts how many of its kind are alive.
#[derive(Debug)]
struct Tracked {
    value: i32,
    alive: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(value: i32, alive: &Rc<Cell<usize>>) -> Self {
        alive.set(alive.get() + 1);
        Self {
            value,
            alive: alive.clone(),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.alive)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.alive.set(self.alive.get() - 1);
    }
}

// Property: Every constructed element is dropped exactly once. The live count
// equals `len` after each op (plus whatever the test itself still holds), and
// reaches zero once the vector is gone.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_drop_accounting(ops in arb_ops()) {
        let alive = Rc::new(Cell::new(0usize));
        {
            let mut sut: Vector<Tracked> = Vector::new();
            for op in ops {
                match op {
                    Op::PushBack(v) => sut.push_back(Tracked::new(v, &alive)),
                    Op::PopBack => drop(sut.pop_back()),
                    Op::Insert(i, v) => {
                        let i = i % (sut.len() + 1);
                        sut.insert(sut.begin() + i as isize, Tracked::new(v, &alive));
                    }
                    Op::InsertN(i, n, v) => {
                        let i = i % (sut.len() + 1);
                        sut.insert_n(sut.begin() + i as isize, n as usize, Tracked::new(v, &alive));
                    }
                    Op::InsertSlice(i, items) => {
                        let i = i % (sut.len() + 1);
                        let staged: Vec<Tracked> = items.into_iter().map(|v| Tracked::new(v, &alive)).collect();
                        sut.insert_slice(sut.begin() + i as isize, &staged);
                    }
                    Op::Erase(i) => {
                        if !sut.is_empty() {
                            let i = i % sut.len();
                            sut.erase(sut.begin() + i as isize);
                        }
                    }
                    Op::EraseRange(a, b) => {
                        let a = a % (sut.len() + 1);
                        let b = b % (sut.len() + 1);
                        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                        sut.erase_range(sut.begin() + lo as isize, sut.begin() + hi as isize);
                    }
                    Op::Reserve(n) => {
                        sut.reserve(n as usize).map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                    Op::ShrinkToFit => sut.shrink_to_fit(),
                    Op::Clear => sut.clear(),
                    Op::At(_) | Op::Set(..) => {
                        let copy = sut.clone();
                        prop_assert_eq!(alive.get(), 2 * sut.len());
                        prop_assert!(copy.iter().map(|t| t.value).eq(sut.iter().map(|t| t.value)));
                        drop(copy);
                    }
                }
                prop_assert_eq!(alive.get(), sut.len());
            }
        }
        prop_assert_eq!(alive.get(), 0);
    }
}
