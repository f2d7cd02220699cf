//! ChainedHashMap: separate chaining over an allocator-backed bucket index.
//!
//! Every node is allocated and constructed through the map's allocator, one
//! block per node, and destroyed and deallocated through it when erased. A
//! generational slab maps `NodeKey`s to node blocks; chains link nodes by
//! key. Each bucket holds the head of its chain; new nodes become the head
//! (most recent first). Every node stores its key's full hash, so rehashing
//! and cursor advancement reduce the stored hash modulo the bucket count and
//! never call back into `Hash` or `Eq`.
//!
//! Node handles are stable: rehashing relinks nodes without moving or
//! copying them, and only the bucket index is ever reallocated. A cursor to
//! an erased node stops resolving and never aliases a node inserted later.

use crate::alloc::{Allocator, Global, RawBlock};
use crate::cursor::{Cursor, Resolve, Successor};
use crate::error::{Error, OrRaise};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::ops::Index;
use core::ptr::NonNull;
use core::slice;
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;
use tracing::{debug, trace};

/// Bucket count of a default-constructed map.
pub const DEFAULT_BUCKET_COUNT: usize = 11;

/// Threshold on `len / bucket_count` that triggers growth on insert.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

new_key_type! {
    /// Stable handle of one chain node.
    pub struct NodeKey;
}

/// Forward-only cursor into a `ChainedHashMap`.
pub type MapCursor<K, V, S = RandomState, A = Global> = Cursor<NodeKey, ChainedHashMap<K, V, S, A>>;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<NodeKey>,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;

/// Destroy a node and return its block.
///
/// # Safety
/// `slot` came from `link_new` with an equal allocator and is no longer
/// reachable from any slab or chain.
unsafe fn free_node<K, V, A: Allocator>(alloc: &A, slot: NodePtr<K, V>) {
    alloc.destroy(slot);
    alloc.deallocate(slot, 1);
}

/// Move a node out of its block and return the block.
///
/// # Safety
/// As for `free_node`.
unsafe fn take_node<K, V, A: Allocator>(alloc: &A, slot: NodePtr<K, V>) -> Node<K, V> {
    let node = slot.as_ptr().read();
    alloc.deallocate(slot, 1);
    node
}

/// Fixed-size array of chain heads. Every slot is initialized.
struct Buckets<A: Allocator> {
    block: RawBlock<Option<NodeKey>, A>,
}

impl<A: Allocator> Buckets<A> {
    fn allocate_in(count: usize, alloc: A) -> Result<Self, Error> {
        let block = RawBlock::allocate_in(count, alloc)?;
        for i in 0..count {
            // SAFETY: i < count; slots start uninitialized and hold no drop glue.
            unsafe { block.allocator().construct(block.slot(i), None) };
        }
        Ok(Self { block })
    }

    #[inline]
    fn len(&self) -> usize {
        self.block.capacity()
    }

    #[inline]
    fn as_slice(&self) -> &[Option<NodeKey>] {
        // SAFETY: all `len` slots were initialized at allocation.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len()) }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [Option<NodeKey>] {
        // SAFETY: as above, with exclusive access.
        unsafe { slice::from_raw_parts_mut(self.block.as_ptr(), self.len()) }
    }

    #[inline]
    fn index_of(&self, hash: u64) -> usize {
        (hash % self.len() as u64) as usize
    }
}

pub struct ChainedHashMap<K, V, S = RandomState, A: Allocator = Global> {
    hasher: S,
    buckets: Buckets<A>,
    nodes: SlotMap<NodeKey, NodePtr<K, V>>,
    max_load_factor: f32,
    _owns: PhantomData<Node<K, V>>,
}

// SAFETY: the map uniquely owns every node block it points to.
unsafe impl<K: Send, V: Send, S: Send, A: Allocator + Send> Send for ChainedHashMap<K, V, S, A> {}
// SAFETY: shared access only hands out shared references into nodes.
unsafe impl<K: Sync, V: Sync, S: Sync, A: Allocator + Sync> Sync for ChainedHashMap<K, V, S, A> {}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with `DEFAULT_BUCKET_COUNT` buckets.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_buckets(count: usize) -> Self {
        Self::with_buckets_and_hasher_in(count, Default::default(), Global)
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher_in(DEFAULT_BUCKET_COUNT, hasher, Global)
    }
}

impl<K, V, S, A> Default for ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: Allocator + Default,
{
    fn default() -> Self {
        Self::with_buckets_and_hasher_in(DEFAULT_BUCKET_COUNT, S::default(), A::default())
    }
}

/// Iterator over entries in bucket order (the order cursors visit them).
pub struct Iter<'a, K, V> {
    buckets: &'a [Option<NodeKey>],
    nodes: &'a SlotMap<NodeKey, NodePtr<K, V>>,
    next_bucket: usize,
    cur: Option<NodeKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                // SAFETY: slab entries name live nodes for as long as the map is borrowed.
                let node: &'a Node<K, V> = unsafe { self.nodes[k].as_ref() };
                self.cur = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            let head = *self.buckets.get(self.next_bucket)?;
            self.next_bucket += 1;
            self.cur = head;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

// SAFETY: `Iter` only reads nodes, like `&ChainedHashMap`.
unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

/// Iterator over mutable entries in unspecified order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeKey, NodePtr<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, p)| {
            // SAFETY: each slab entry is yielded once, under the map's unique borrow.
            let node = unsafe { p.as_mut() };
            (&node.key, &mut node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator in unspecified order. Entries not consumed are dropped
/// with the iterator.
pub struct IntoIter<K, V, A: Allocator = Global> {
    it: slotmap::basic::IntoIter<NodeKey, NodePtr<K, V>>,
    alloc: A,
    _owns: PhantomData<Node<K, V>>,
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let (_, slot) = self.it.next()?;
        // SAFETY: the slab was moved out of the map, so this is the only reference.
        let node = unsafe { take_node(&self.alloc, slot) };
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}

impl<K, V, A: Allocator> Drop for IntoIter<K, V, A> {
    fn drop(&mut self) {
        for (_, slot) in self.it.by_ref() {
            // SAFETY: as in `next`.
            unsafe { free_node(&self.alloc, slot) };
        }
    }
}

// SAFETY: the iterator uniquely owns the remaining node blocks.
unsafe impl<K: Send, V: Send, A: Allocator + Send> Send for IntoIter<K, V, A> {}

// Structural operations: never call into `Hash`/`Eq`.
impl<K, V, S, A: Allocator> ChainedHashMap<K, V, S, A> {
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Set the insert-time growth threshold. Takes effect on the next insert.
    ///
    /// Panics unless `factor` is finite and positive.
    #[track_caller]
    pub fn set_max_load_factor(&mut self, factor: f32) {
        assert!(
            factor.is_finite() && factor > 0.0,
            "max load factor must be finite and positive, got {factor}"
        );
        self.max_load_factor = factor;
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn allocator(&self) -> &A {
        self.buckets.block.allocator()
    }

    /// Smallest bucket count that holds `len` entries under the load factor.
    fn min_buckets_for(&self, len: usize) -> usize {
        (len as f64 / f64::from(self.max_load_factor)).ceil() as usize
    }

    /// Whether `len` entries over `buckets` buckets exceed the load factor.
    fn exceeds_load(&self, len: usize, buckets: usize) -> bool {
        len as f64 > buckets as f64 * f64::from(self.max_load_factor)
    }

    #[inline]
    fn node(&self, k: NodeKey) -> &Node<K, V> {
        // SAFETY: slab entries name live nodes owned by this map.
        unsafe { self.nodes[k].as_ref() }
    }

    #[inline]
    fn node_mut(&mut self, k: NodeKey) -> &mut Node<K, V> {
        // SAFETY: as above, with exclusive access.
        unsafe { self.nodes[k].as_mut() }
    }

    #[inline]
    fn get_node(&self, k: NodeKey) -> Option<&Node<K, V>> {
        // SAFETY: as in `node`.
        self.nodes.get(k).map(|p| unsafe { p.as_ref() })
    }

    #[inline]
    fn get_node_mut(&mut self, k: NodeKey) -> Option<&mut Node<K, V>> {
        // SAFETY: as in `node_mut`.
        self.nodes.get_mut(k).map(|p| unsafe { p.as_mut() })
    }

    /// Cursor to the first entry in bucket order, or `end()` when empty.
    pub fn begin(&self) -> MapCursor<K, V, S, A> {
        match self.first_from_bucket(0) {
            Some(k) => Cursor::new(k),
            None => Cursor::null(),
        }
    }

    /// The end-marker. Equal to the end-marker of every other map.
    #[inline]
    pub fn end(&self) -> MapCursor<K, V, S, A> {
        Cursor::null()
    }

    #[inline]
    pub fn cbegin(&self) -> MapCursor<K, V, S, A> {
        self.begin()
    }

    #[inline]
    pub fn cend(&self) -> MapCursor<K, V, S, A> {
        self.end()
    }

    fn first_from_bucket(&self, start: usize) -> Option<NodeKey> {
        self.buckets
            .as_slice()
            .get(start..)?
            .iter()
            .find_map(|head| *head)
    }

    /// Chain successor, else the head of the next non-empty bucket.
    fn successor_of(&self, node: &Node<K, V>) -> Option<NodeKey> {
        node.next
            .or_else(|| self.first_from_bucket(self.buckets.index_of(node.hash) + 1))
    }

    /// Unlink `k` from its chain. The node stays in the slab.
    fn unlink(&mut self, k: NodeKey) {
        let (hash, after) = {
            let node = self.node(k);
            (node.hash, node.next)
        };
        let idx = self.buckets.index_of(hash);
        let heads = self.buckets.as_mut_slice();
        if heads[idx] == Some(k) {
            heads[idx] = after;
            return;
        }
        let mut cur = heads[idx];
        while let Some(c) = cur {
            let node = self.node_mut(c);
            if node.next == Some(k) {
                node.next = after;
                return;
            }
            cur = node.next;
        }
        debug_assert!(false, "node missing from its chain");
    }

    /// Allocate and construct `node`, then make it the head of its bucket.
    fn link_new(&mut self, mut node: Node<K, V>) -> NodeKey {
        let idx = self.buckets.index_of(node.hash);
        node.next = self.buckets.as_slice()[idx];
        let alloc = self.buckets.block.allocator();
        let slot = alloc.allocate::<Node<K, V>>(1).or_raise();
        // SAFETY: fresh storage for exactly one node.
        unsafe { alloc.construct(slot, node) };
        let k = self.nodes.insert(slot);
        self.buckets.as_mut_slice()[idx] = Some(k);
        k
    }

    /// Destroy and deallocate every node. Chain heads are left untouched.
    fn free_nodes(&mut self) {
        let alloc = self.buckets.block.allocator();
        for (_, slot) in self.nodes.drain() {
            // SAFETY: drained out of the slab, so nothing refers to it anymore.
            unsafe { free_node(alloc, slot) };
        }
    }

    /// Rebuild the index with `count` buckets.
    ///
    /// No-op when `count` does not exceed the current bucket count or is too
    /// small for the current size at the configured load factor. Nodes are
    /// relinked in place; the new index is allocated before anything changes.
    pub fn rehash(&mut self, count: usize) -> Result<(), Error> {
        let current = self.bucket_count();
        if count <= current {
            return Ok(());
        }
        let min = self.min_buckets_for(self.len());
        if count < min {
            debug!(requested = count, min, len = self.len(), "rehash request ignored");
            return Ok(());
        }
        let mut fresh = Buckets::allocate_in(count, self.allocator().clone())?;
        for i in 0..current {
            let mut cur = self.buckets.as_slice()[i];
            while let Some(k) = cur {
                let node = self.node_mut(k);
                cur = node.next;
                let j = fresh.index_of(node.hash);
                node.next = fresh.as_slice()[j];
                fresh.as_mut_slice()[j] = Some(k);
            }
        }
        self.buckets = fresh;
        trace!(from = current, to = count, len = self.len(), "map rehashed");
        Ok(())
    }

    /// Rehash so that `len` entries fit under the configured load factor.
    pub fn reserve(&mut self, len: usize) -> Result<(), Error> {
        self.rehash(self.min_buckets_for(len))
    }

    /// Grow the index if one more entry would exceed the load factor.
    fn grow_for_insert(&mut self) -> Result<(), Error> {
        let n = self.bucket_count();
        let after = self.len() + 1;
        if self.exceeds_load(after, n) {
            let target = n.saturating_mul(2).max(self.min_buckets_for(after));
            self.rehash(target)?;
        }
        Ok(())
    }

    /// Remove the entry at `pos` and return a cursor to the entry after it.
    ///
    /// Erasing `end()` returns `end()`. Panics on a stale cursor.
    #[track_caller]
    pub fn erase(&mut self, pos: MapCursor<K, V, S, A>) -> MapCursor<K, V, S, A> {
        let Some(k) = pos.position() else {
            return Cursor::null();
        };
        let next = match self.get_node(k) {
            Some(node) => self.successor_of(node),
            None => panic!("erase through a cursor whose entry is gone"),
        };
        self.unlink(k);
        // Destroyed after the map is consistent again.
        if let Some(slot) = self.nodes.remove(k) {
            // SAFETY: unlinked and out of the slab.
            unsafe { free_node(self.allocator(), slot) };
        }
        match next {
            Some(n) => Cursor::new(n),
            None => Cursor::null(),
        }
    }

    /// Drop every entry; the bucket count is kept.
    pub fn clear(&mut self) {
        for head in self.buckets.as_mut_slice() {
            *head = None;
        }
        self.free_nodes();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.as_slice(),
            nodes: &self.nodes,
            next_bucket: 0,
            cur: None,
            remaining: self.nodes.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.nodes.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S, A> ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    /// Empty map with `count` buckets (at least one).
    pub fn with_buckets_and_hasher_in(count: usize, hasher: S, alloc: A) -> Self {
        Self {
            hasher,
            buckets: Buckets::allocate_in(count.max(1), alloc).or_raise(),
            nodes: SlotMap::with_key(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            _owns: PhantomData,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Linear scan of the chain that `hash` selects.
    fn find_in_chain<Q>(&self, hash: u64, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.buckets.as_slice()[self.buckets.index_of(hash)];
        while let Some(k) = cur {
            let node = self.node(k);
            if node.hash == hash && node.key.borrow() == q {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    fn find_node<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_in_chain(self.make_hash(q), q)
    }

    /// Cursor to the entry for `q`, or `end()`.
    pub fn find<Q>(&self, q: &Q) -> MapCursor<K, V, S, A>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find_node(q) {
            Some(k) => Cursor::new(k),
            None => Cursor::null(),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find_node(q)?;
        Some(&self.node(k).value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find_node(q)?;
        Some(&mut self.node_mut(k).value)
    }

    fn insert_node<F>(&mut self, key: K, make_value: F) -> (NodeKey, bool)
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        if let Some(existing) = self.find_in_chain(hash, &key) {
            return (existing, false);
        }
        self.grow_for_insert().or_raise();
        let value = make_value();
        let k = self.link_new(Node {
            key,
            value,
            hash,
            next: None,
        });
        (k, true)
    }

    /// Insert `key -> value` unless `key` is present.
    ///
    /// Returns a cursor to the entry for `key` and whether it was inserted. A
    /// duplicate leaves the map unchanged and drops `value`.
    pub fn insert(&mut self, key: K, value: V) -> (MapCursor<K, V, S, A>, bool) {
        self.insert_with(key, move || value)
    }

    /// Like `insert`, but only builds the value when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, make_value: F) -> (MapCursor<K, V, S, A>, bool)
    where
        F: FnOnce() -> V,
    {
        let (k, inserted) = self.insert_node(key, make_value);
        (Cursor::new(k), inserted)
    }

    /// Build the whole entry with `make`, then insert it unless its key is present.
    ///
    /// The candidate node is built before the duplicate scan, so `make` runs
    /// even when the key turns out to be present; the candidate is then
    /// dropped and the map is unchanged. Use `insert_with` to skip building
    /// the value for present keys.
    pub fn emplace<F>(&mut self, make: F) -> (MapCursor<K, V, S, A>, bool)
    where
        F: FnOnce() -> (K, V),
    {
        let (key, value) = make();
        let hash = self.make_hash(&key);
        let candidate = Node {
            key,
            value,
            hash,
            next: None,
        };
        if let Some(existing) = self.find_in_chain(hash, &candidate.key) {
            drop(candidate);
            return (Cursor::new(existing), false);
        }
        self.grow_for_insert().or_raise();
        (Cursor::new(self.link_new(candidate)), true)
    }

    /// Subscript-style access: the value for `key`, inserting `V::default()`
    /// first when absent.
    pub fn value_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (k, _) = self.insert_node(key, V::default);
        &mut self.node_mut(k).value
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find_node(q)?;
        self.unlink(k);
        let slot = self.nodes.remove(k)?;
        // SAFETY: unlinked and out of the slab.
        let node = unsafe { take_node(self.allocator(), slot) };
        Some((node.key, node.value))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Erase the entry for `q`; returns how many entries were removed (0 or 1).
    pub fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.remove_entry(q).is_some())
    }

    /// Move the contents out, leaving an empty default-sized map behind.
    pub fn take(&mut self) -> Self
    where
        S: Clone,
    {
        let fresh = Self::with_buckets_and_hasher_in(
            DEFAULT_BUCKET_COUNT,
            self.hasher.clone(),
            self.allocator().clone(),
        );
        mem::replace(self, fresh)
    }
}

impl<K, V, S, A: Allocator> Resolve<NodeKey> for ChainedHashMap<K, V, S, A> {
    type Ref<'a>
        = (&'a K, &'a V)
    where
        Self: 'a;
    type Mut<'a>
        = (&'a K, &'a mut V)
    where
        Self: 'a;

    fn resolve(&self, pos: NodeKey) -> Option<(&K, &V)> {
        self.get_node(pos).map(|n| (&n.key, &n.value))
    }

    fn resolve_mut(&mut self, pos: NodeKey) -> Option<(&K, &mut V)> {
        self.get_node_mut(pos).map(|n| (&n.key, &mut n.value))
    }
}

impl<K, V, S, A: Allocator> Successor<NodeKey> for ChainedHashMap<K, V, S, A> {
    fn successor(&self, pos: NodeKey) -> Option<NodeKey> {
        match self.get_node(pos) {
            Some(node) => self.successor_of(node),
            None => panic!("advanced a cursor whose entry is gone"),
        }
    }
}

impl<K, V, S, A> Clone for ChainedHashMap<K, V, S, A>
where
    K: Clone,
    V: Clone,
    S: Clone,
    A: Allocator,
{
    /// Deep copy with the same bucket count and chain layout. Every node is
    /// allocated anew through the copy's allocator.
    fn clone(&self) -> Self {
        let mut copy = Self {
            hasher: self.hasher.clone(),
            buckets: Buckets::allocate_in(self.bucket_count(), self.allocator().clone()).or_raise(),
            nodes: SlotMap::with_capacity_and_key(self.len()),
            max_load_factor: self.max_load_factor,
            _owns: PhantomData,
        };
        let mut chain = Vec::new();
        for &head in self.buckets.as_slice() {
            chain.clear();
            let mut cur = head;
            while let Some(k) = cur {
                let node = self.node(k);
                chain.push(node);
                cur = node.next;
            }
            // Linking tail first rebuilds the chain in the same order.
            for node in chain.iter().rev() {
                copy.link_new(Node {
                    key: node.key.clone(),
                    value: node.value.clone(),
                    hash: node.hash,
                    next: None,
                });
            }
        }
        copy
    }
}

impl<K, V, S, A: Allocator> Drop for ChainedHashMap<K, V, S, A> {
    fn drop(&mut self) {
        self.free_nodes();
    }
}

impl<K, V, S, A> fmt::Debug for ChainedHashMap<K, V, S, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, A> PartialEq for ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| v == ov))
    }
}

impl<K, V, S, A> Eq for ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    A: Allocator,
{
}

impl<K, Q, V, S, A> Index<&Q> for ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    type Output = V;

    #[track_caller]
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not present in map"),
        }
    }
}

impl<K, V, S, A> Extend<(K, V)> for ChainedHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V, S, A: Allocator> IntoIterator for &'a ChainedHashMap<K, V, S, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, A: Allocator> IntoIterator for &'a mut ChainedHashMap<K, V, S, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, A: Allocator> IntoIterator for ChainedHashMap<K, V, S, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(mut self) -> IntoIter<K, V, A> {
        // The emptied map still releases its bucket index on drop.
        let nodes = mem::replace(&mut self.nodes, SlotMap::with_key());
        IntoIter {
            it: nodes.into_iter(),
            alloc: self.allocator().clone(),
            _owns: PhantomData,
        }
    }
}
