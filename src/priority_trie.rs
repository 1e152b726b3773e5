use crate::error::TrieError;
use crate::node::{outranks, Interval, Node, NodeId, Subtree};
use crate::tracing_helpers::{debug_log, trace_log};
use std::fmt;
use std::iter::FusedIterator;

/// A priority search trie over closed intervals `[start, last]`.
///
/// Intervals are routed through a binary trie by the bits of `start`, most
/// significant first, while along every root-to-leaf path `last` never
/// increases (ties: `start` never decreases). The second ordering lets overlap
/// queries skip every subtree whose root already ends before the query begins.
///
/// Two tries compare equal when their node layouts are identical, not merely
/// when they hold the same intervals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriorityTrie {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    bits: u32,
}

/// A stored interval found by [`PriorityTrie::first_overlap`] or
/// [`PriorityTrie::next_overlap`].
///
/// It borrows the trie, so the trie cannot change while a search is in flight.
#[derive(Clone, Copy)]
pub struct Overlap<'a> {
    trie: &'a PriorityTrie,
    id: NodeId,
}

impl<'a> Overlap<'a> {
    fn node(&self) -> &'a Node {
        &self.trie.nodes[self.id.index()]
    }

    pub fn start(&self) -> u64 {
        self.node().start
    }

    pub fn last(&self) -> u64 {
        self.node().last
    }

    /// The interval as a `(start, last)` pair.
    pub fn interval(&self) -> (u64, u64) {
        self.node().interval()
    }
}

impl fmt::Debug for Overlap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Overlap")
            .field("start", &self.start())
            .field("last", &self.last())
            .finish()
    }
}

/// Iterator over the intervals overlapping a query, see [`PriorityTrie::overlaps`].
#[derive(Debug, Clone)]
pub struct Overlaps<'a> {
    trie: &'a PriorityTrie,
    left: u64,
    right: u64,
    cursor: Option<Overlap<'a>>,
    started: bool,
}

impl Iterator for Overlaps<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let found = if self.started {
            let cursor = self.cursor?;
            self.trie.next_overlap(self.left, self.right, &cursor)
        } else {
            self.started = true;
            self.trie.first_overlap(self.left, self.right)
        };
        self.cursor = found;
        found.map(|overlap| overlap.interval())
    }
}

impl FusedIterator for Overlaps<'_> {}

impl PriorityTrie {
    /// Creates an empty trie whose endpoints must fit in `bits` bits.
    ///
    /// # Examples
    /// ```
    /// use priority_search_trie::{PriorityTrie, TrieError};
    ///
    /// let trie = PriorityTrie::new(3).unwrap();
    /// assert_eq!(trie.max_endpoint(), 7);
    /// assert_eq!(PriorityTrie::new(0), Err(TrieError::InvalidKeyWidth { bits: 0 }));
    /// ```
    pub fn new(bits: u32) -> Result<PriorityTrie, TrieError> {
        PriorityTrie::with_capacity(bits, 0)
    }

    /// Like [`PriorityTrie::new`], with room for `capacity` intervals before reallocating.
    pub fn with_capacity(bits: u32, capacity: usize) -> Result<PriorityTrie, TrieError> {
        if bits == 0 || bits > u64::BITS {
            return Err(TrieError::InvalidKeyWidth { bits });
        }

        Ok(PriorityTrie {
            nodes: Vec::with_capacity(capacity),
            root: None,
            bits,
        })
    }

    /// The key width fixed at construction.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The largest endpoint the trie accepts, `2^bits - 1`.
    pub fn max_endpoint(&self) -> u64 {
        u64::MAX >> (u64::BITS - self.bits)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every interval, keeping the key width.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Number of levels in the trie; an empty trie has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[id.index()];
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        height
    }

    /// Inserts `[left, right]`. Inserting an interval that is already stored
    /// changes nothing.
    ///
    /// # Examples
    /// ```
    /// use priority_search_trie::{PriorityTrie, TrieError};
    ///
    /// let mut trie = PriorityTrie::new(3).unwrap();
    /// trie.insert(2, 4).unwrap();
    /// trie.insert(2, 4).unwrap();
    /// assert_eq!(trie.len(), 1);
    /// assert_eq!(
    ///     trie.insert(2, 8),
    ///     Err(TrieError::EndpointOutOfRange { value: 8, bits: 3 })
    /// );
    /// ```
    pub fn insert(&mut self, left: u64, right: u64) -> Result<(), TrieError> {
        self.check(left, right)?;
        trace_log!(start = left, last = right, "insert");

        let Some(mut cur) = self.root else {
            self.root = Some(self.push(Node::new((left, right), None)));
            return Ok(());
        };

        let mut candidate = (left, right);
        let mut depth = 0;
        loop {
            let node = &mut self.nodes[cur.index()];
            if node.interval() == candidate {
                trace_log!(start = left, last = right, "already stored");
                return Ok(());
            }

            if outranks(candidate, node.interval()) {
                let displaced = node.interval();
                (node.start, node.last) = candidate;
                trace_log!(
                    start = displaced.0,
                    last = displaced.1,
                    depth,
                    "displaced"
                );
                candidate = displaced;
            }

            let go_right = self.routes_right(candidate.0, depth);
            match self.nodes[cur.index()].child(go_right) {
                Some(next) => {
                    cur = next;
                    depth += 1;
                }
                None => {
                    let leaf = self.push(Node::new(candidate, Some(cur)));
                    *self.nodes[cur.index()].child_mut(go_right) = Some(leaf);
                    debug_log!(
                        start = candidate.0,
                        last = candidate.1,
                        depth = depth + 1,
                        "new leaf"
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Removes exactly `[left, right]`, returning whether it was stored.
    ///
    /// # Examples
    /// ```
    /// use priority_search_trie::PriorityTrie;
    ///
    /// let mut trie = PriorityTrie::new(3).unwrap();
    /// trie.insert(0, 5).unwrap();
    /// assert_eq!(trie.delete(0, 3), Ok(false));
    /// assert_eq!(trie.delete(0, 5), Ok(true));
    /// assert!(trie.is_empty());
    /// ```
    pub fn delete(&mut self, left: u64, right: u64) -> Result<bool, TrieError> {
        self.check(left, right)?;

        match self.find(left, right) {
            Some(hole) => {
                debug_log!(start = left, last = right, "delete");
                self.fill_hole(hole);
                Ok(true)
            }
            None => {
                trace_log!(start = left, last = right, "delete: not stored");
                Ok(false)
            }
        }
    }

    /// Whether exactly `[left, right]` is stored.
    pub fn contains(&self, left: u64, right: u64) -> bool {
        self.find(left, right).is_some()
    }

    /// Returns some stored interval overlapping `[left, right]`, the starting
    /// point for [`PriorityTrie::next_overlap`].
    ///
    /// An inverted query (`left > right`) overlaps nothing.
    pub fn first_overlap(&self, left: u64, right: u64) -> Option<Overlap<'_>> {
        if left > right {
            return None;
        }

        let mut cur = self.root?;
        loop {
            let node = &self.nodes[cur.index()];
            if node.overlaps(left, right) {
                return Some(self.handle(cur));
            }
            cur = self
                .admissible(node.left, left)
                .or_else(|| self.admissible(node.right, left))?;
        }
    }

    /// Returns the overlap of `[left, right]` that follows `cur` in a
    /// depth-first walk of the trie, or `None` once the walk is exhausted.
    ///
    /// Starting from [`PriorityTrie::first_overlap`], every stored interval
    /// overlapping the query is returned exactly once. The order follows the
    /// trie layout and carries no other meaning.
    ///
    /// # Examples
    /// ```
    /// use priority_search_trie::PriorityTrie;
    ///
    /// let mut trie = PriorityTrie::new(3).unwrap();
    /// for (start, last) in [(2, 4), (0, 5), (3, 6), (4, 5), (0, 7)] {
    ///     trie.insert(start, last).unwrap();
    /// }
    ///
    /// let mut found = vec![];
    /// let mut cur = trie.first_overlap(1, 5);
    /// while let Some(overlap) = cur {
    ///     found.push(overlap.interval());
    ///     cur = trie.next_overlap(1, 5, &overlap);
    /// }
    /// assert_eq!(found, [(0, 7), (3, 6), (0, 5), (2, 4), (4, 5)]);
    /// ```
    pub fn next_overlap(&self, left: u64, right: u64, cur: &Overlap<'_>) -> Option<Overlap<'_>> {
        debug_assert!(
            std::ptr::eq(cur.trie, self),
            "cursor belongs to another trie"
        );
        if left > right {
            return None;
        }

        let mut cur = cur.id;
        loop {
            while let Some(next) = self.admissible(self.nodes[cur.index()].left, left) {
                cur = next;
                if self.nodes[cur.index()].overlaps(left, right) {
                    return Some(self.handle(cur));
                }
            }

            cur = self.step_right(cur, left)?;
            if self.nodes[cur.index()].overlaps(left, right) {
                return Some(self.handle(cur));
            }
        }
    }

    /// Iterates over the `(start, last)` pairs overlapping `[left, right]`.
    ///
    /// # Examples
    /// ```
    /// use priority_search_trie::PriorityTrie;
    ///
    /// let mut trie = PriorityTrie::new(4).unwrap();
    /// trie.insert(1, 3).unwrap();
    /// trie.insert(6, 9).unwrap();
    /// trie.insert(12, 15).unwrap();
    ///
    /// let mut found: Vec<_> = trie.overlaps(3, 6).collect();
    /// found.sort();
    /// assert_eq!(found, [(1, 3), (6, 9)]);
    /// ```
    pub fn overlaps(&self, left: u64, right: u64) -> Overlaps<'_> {
        Overlaps {
            trie: self,
            left,
            right,
            cursor: None,
            started: false,
        }
    }

    /// Iterates over every stored interval, in trie order.
    pub fn iter(&self) -> Overlaps<'_> {
        self.overlaps(0, self.max_endpoint())
    }

    fn check(&self, start: u64, last: u64) -> Result<(), TrieError> {
        if start > last {
            return Err(TrieError::InvertedInterval { start, last });
        }
        // `last` bounds `start`, so only it can overflow the key width.
        if last > self.max_endpoint() {
            return Err(TrieError::EndpointOutOfRange {
                value: last,
                bits: self.bits,
            });
        }
        Ok(())
    }

    /// Branch taken at `depth` by an interval starting at `value`. Once the
    /// key bits run out, intervals sharing a start chain to the left.
    fn routes_right(&self, value: u64, depth: usize) -> bool {
        let bits = self.bits as usize;
        depth < bits && (value >> (bits - 1 - depth)) & 1 == 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn handle(&self, id: NodeId) -> Overlap<'_> {
        Overlap { trie: self, id }
    }

    fn admissible(&self, child: Option<NodeId>, left: u64) -> Option<NodeId> {
        child.filter(|child| self.nodes[child.index()].admits(left))
    }

    fn find(&self, left: u64, right: u64) -> Option<NodeId> {
        let target = (left, right);
        let mut cur = self.root?;
        let mut depth = 0;
        loop {
            let node = &self.nodes[cur.index()];
            if node.interval() == target {
                return Some(cur);
            }
            // Nothing below a node may outrank it.
            if outranks(target, node.interval()) {
                return None;
            }
            cur = node.child(self.routes_right(left, depth))?;
            depth += 1;
        }
    }

    /// Next right descent of the walk after the subtree under `cur` is
    /// finished, climbing over every node entered through its right edge.
    fn step_right(&self, mut cur: NodeId, left: u64) -> Option<NodeId> {
        loop {
            if let Some(next) = self.admissible(self.nodes[cur.index()].right, left) {
                return Some(next);
            }

            loop {
                let parent = self.nodes[cur.index()].parent?;
                let from_left = self.nodes[parent.index()].left == Some(cur);
                cur = parent;
                if from_left {
                    break;
                }
            }
        }
    }

    /// Refills `hole` from its higher-ranked child, level by level, until a
    /// leaf is vacated and can be released.
    fn fill_hole(&mut self, mut hole: NodeId) {
        loop {
            let node = &self.nodes[hole.index()];
            let donor = match (node.left, node.right) {
                (None, None) => break,
                (Some(only), None) | (None, Some(only)) => only,
                (Some(left), Some(right)) => {
                    let left_interval = self.nodes[left.index()].interval();
                    if outranks(self.nodes[right.index()].interval(), left_interval) {
                        right
                    } else {
                        left
                    }
                }
            };

            let promoted: Interval = self.nodes[donor.index()].interval();
            let node = &mut self.nodes[hole.index()];
            (node.start, node.last) = promoted;
            hole = donor;
        }

        match self.nodes[hole.index()].parent {
            Some(parent) => {
                let parent = &mut self.nodes[parent.index()];
                if parent.left == Some(hole) {
                    parent.left = None;
                } else {
                    parent.right = None;
                }
            }
            None => self.root = None,
        }
        self.release(hole);
    }

    /// Frees a detached leaf's slot. The last node of the arena moves into it.
    fn release(&mut self, id: NodeId) {
        let moved = NodeId::new(self.nodes.len() - 1);
        self.nodes.swap_remove(id.index());
        if moved == id {
            return;
        }
        trace_log!(from = moved.index(), to = id.index(), "slot reused");

        let node = &self.nodes[id.index()];
        let (parent, left, right) = (node.parent, node.left, node.right);
        match parent {
            Some(parent) => {
                let parent = &mut self.nodes[parent.index()];
                if parent.left == Some(moved) {
                    parent.left = Some(id);
                } else {
                    parent.right = Some(id);
                }
            }
            None => self.root = Some(id),
        }
        for child in [left, right].into_iter().flatten() {
            self.nodes[child.index()].parent = Some(id);
        }
    }
}

impl<'a> IntoIterator for &'a PriorityTrie {
    type Item = (u64, u64);
    type IntoIter = Overlaps<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PriorityTrie {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.root {
            Some(root) => write!(
                f,
                "{}",
                Subtree {
                    nodes: &self.nodes,
                    id: root,
                }
            ),
            None => write!(f, " {{ }} "),
        }
    }
}
