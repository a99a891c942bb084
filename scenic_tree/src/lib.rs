// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenic Tree: an ordered n-ary tree of opaque node identities.
//!
//! [`Tree`] is generic over the node identity type `N` the same way
//! `understory_dirty`'s dirty-tracking types are generic over a key type:
//! the tree itself never allocates identities, it only orders and parents
//! whatever `Copy + Eq + Hash` handle the host already uses (an item index,
//! a generational id, a pointer-sized handle, ...).
//!
//! A node with no parent is a root, represented internally with the `None`
//! sentinel exactly as `gaphas.tree.Tree` uses `None` as the root's parent
//! key. Sibling order is an explicit small-vector per parent (inline for the
//! common case of a handful of children, following `understory_property`'s
//! inline-storage convention), so insertion order is stable across
//! non-mutating reads and `order` is a total function on the current tree
//! (items not present are omitted, never erroring).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Inline capacity for a node's sibling list before it spills to the heap;
/// most scene items have only a handful of children.
const INLINE_SIBLINGS: usize = 4;

type Siblings<N> = SmallVec<[N; INLINE_SIBLINGS]>;

/// Error returned by [`Tree::move_node`] when the requested move would
/// create a cycle (moving a node to be its own descendant).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleError;

impl core::fmt::Display for CycleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("move would make a node its own ancestor")
    }
}

impl core::error::Error for CycleError {}

/// An ordered n-ary tree of opaque node identities `N`.
#[derive(Debug)]
pub struct Tree<N>
where
    N: Copy + Eq + Hash,
{
    parents: HashMap<N, Option<N>>,
    children: HashMap<Option<N>, Siblings<N>>,
}

impl<N> Default for Tree<N>
where
    N: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Tree<N>
where
    N: Copy + Eq + Hash,
{
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parents: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Whether `node` is currently present in the tree.
    #[must_use]
    pub fn contains(&self, node: N) -> bool {
        self.parents.contains_key(&node)
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Insert `node` under `parent` (or as a root if `parent` is `None`) at
    /// `index` (or at the end if `index` is `None`).
    ///
    /// O(1) amortized (the sibling-list insert is O(children of parent)).
    pub fn add(&mut self, node: N, parent: Option<N>, index: Option<usize>) {
        self.parents.insert(node, parent);
        self.children.entry(node).or_default();
        let siblings = self.children.entry(parent).or_default();
        let index = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, node);
    }

    /// Remove `node` and all of its descendants.
    ///
    /// Descendants are removed deepest-first so that an observer watching
    /// each individual removal always sees a valid tree.
    pub fn remove(&mut self, node: N) {
        let mut order = Vec::new();
        self.collect_pre_order(Some(node), &mut order);
        for &n in order.iter().rev() {
            self.unlink(n);
        }
    }

    /// Reparent `node` under `new_parent` at `index`, preserving the node's
    /// own subtree intact. Equivalent to `remove` + `add` except that the
    /// subtree rooted at `node` is not disturbed.
    pub fn move_node(
        &mut self,
        node: N,
        new_parent: Option<N>,
        index: Option<usize>,
    ) -> Result<(), CycleError> {
        if let Some(new_parent) = new_parent {
            if new_parent == node || self.ancestors(new_parent).any(|a| a == node) {
                return Err(CycleError);
            }
        }
        self.unlink_from_siblings(node);
        self.parents.insert(node, new_parent);
        let siblings = self.children.entry(new_parent).or_default();
        let index = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, node);
        Ok(())
    }

    /// The parent of `node`, or `None` if it is a root (or absent).
    #[must_use]
    pub fn get_parent(&self, node: N) -> Option<N> {
        self.parents.get(&node).copied().flatten()
    }

    /// The ordered children of `node` (or the roots, if `node` is `None`).
    #[must_use]
    pub fn get_children(&self, node: Option<N>) -> &[N] {
        self.children.get(&node).map_or(&[], Siblings::as_slice)
    }

    /// The ordered siblings of `node`, including `node` itself.
    #[must_use]
    pub fn get_siblings(&self, node: N) -> &[N] {
        let parent = self.get_parent(node);
        self.get_children(parent)
    }

    /// Iterate the ancestors of `node`, nearest first, excluding `node`
    /// itself.
    pub fn get_ancestors(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.ancestors(node)
    }

    fn ancestors(&self, node: N) -> Ancestors<'_, N> {
        Ancestors {
            tree: self,
            current: self.get_parent(node),
        }
    }

    /// All descendants of `node` (or of the forest root, if `node` is
    /// `None`) in depth-first pre-order. Does not include `node` itself.
    #[must_use]
    pub fn get_all_children(&self, node: Option<N>) -> Vec<N> {
        let mut out = Vec::new();
        for &child in self.get_children(node) {
            self.collect_pre_order(Some(child), &mut out);
        }
        out
    }

    /// Sort `iterable` by depth-first pre-order position in the current
    /// tree. Items not present in the tree are omitted. Total on the
    /// current tree: every live node has a well-defined position.
    #[must_use]
    pub fn order<I>(&self, iterable: I) -> Vec<N>
    where
        I: IntoIterator<Item = N>,
    {
        let mut full_order = Vec::new();
        self.collect_pre_order(None, &mut full_order);
        let mut positions = HashMap::with_capacity(full_order.len());
        for (i, n) in full_order.into_iter().enumerate() {
            positions.insert(n, i);
        }
        let mut out: Vec<N> = iterable
            .into_iter()
            .filter(|n| positions.contains_key(n))
            .collect();
        out.sort_by_key(|n| positions[n]);
        out
    }

    /// Depth-first pre-order collection rooted at `node` (inclusive when
    /// `node` is `Some`, or over the whole forest when `node` is `None`).
    fn collect_pre_order(&self, node: Option<N>, out: &mut Vec<N>) {
        if let Some(n) = node {
            out.push(n);
        }
        for &child in self.get_children(node) {
            self.collect_pre_order(Some(child), out);
        }
    }

    fn unlink_from_siblings(&mut self, node: N) {
        let parent = self.get_parent(node);
        if let Some(siblings) = self.children.get_mut(&parent) {
            if let Some(pos) = siblings.iter().position(|&n| n == node) {
                siblings.remove(pos);
            }
        }
    }

    fn unlink(&mut self, node: N) {
        self.unlink_from_siblings(node);
        self.parents.remove(&node);
        self.children.remove(&Some(node));
    }
}

struct Ancestors<'a, N>
where
    N: Copy + Eq + Hash,
{
    tree: &'a Tree<N>,
    current: Option<N>,
}

impl<'a, N> Iterator for Ancestors<'a, N>
where
    N: Copy + Eq + Hash,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.current?;
        self.current = self.tree.get_parent(node);
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_query_a_tree() {
        let mut tree = Tree::<u32>::new();
        tree.add(1, None, None); // A
        tree.add(2, Some(1), None); // B child of A
        tree.add(3, Some(2), None); // C child of B

        assert_eq!(tree.get_ancestors(3).collect::<Vec<_>>(), [2, 1]);
        assert_eq!(tree.get_all_children(Some(1)), [2, 3]);
        assert_eq!(tree.get_parent(1), None);
    }

    #[test]
    fn remove_drops_descendants_deepest_first() {
        let mut tree = Tree::<u32>::new();
        tree.add(1, None, None);
        tree.add(2, Some(1), None);
        tree.add(3, Some(2), None);

        tree.remove(1);
        assert!(!tree.contains(1));
        assert!(!tree.contains(2));
        assert!(!tree.contains(3));
    }

    #[test]
    fn move_preserves_subtree_and_rejects_cycles() {
        let mut tree = Tree::<u32>::new();
        tree.add(1, None, None);
        tree.add(2, None, None);
        tree.add(3, Some(1), None);

        tree.move_node(1, Some(2), None).unwrap();
        assert_eq!(tree.get_parent(1), Some(2));
        assert_eq!(tree.get_all_children(Some(1)), [3]);

        assert_eq!(tree.move_node(2, Some(1), None), Err(CycleError));
    }

    #[test]
    fn order_sorts_by_pre_order_and_omits_absent() {
        let mut tree = Tree::<u32>::new();
        tree.add(1, None, None);
        tree.add(2, Some(1), None);
        tree.add(3, Some(1), None);

        let ordered = tree.order([3, 2, 1, 99]);
        assert_eq!(ordered, [1, 2, 3]);
    }

    #[test]
    fn explicit_index_is_preserved_on_reparent() {
        let mut tree = Tree::<u32>::new();
        tree.add(1, None, None);
        tree.add(2, Some(1), None);
        tree.add(3, Some(1), None);
        tree.add(4, None, None);

        tree.move_node(3, Some(4), Some(0)).unwrap();
        assert_eq!(tree.get_children(Some(4)), [3]);
        assert_eq!(tree.get_children(Some(1)), [2]);
    }
}
