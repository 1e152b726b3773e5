use std::fmt;

/// A closed interval `(start, last)`.
pub(crate) type Interval = (u64, u64);

/// Position of a node inside the trie's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> NodeId {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Node {
    pub start: u64,
    pub last: u64,
    pub parent: Option<NodeId>, // Back-reference only, never owning.
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

/// Whether `a` ranks above `b`: larger `last` wins, ties go to the smaller `start`.
pub(crate) fn outranks(a: Interval, b: Interval) -> bool {
    a.1 > b.1 || (a.1 == b.1 && a.0 < b.0)
}

impl Node {
    pub fn new((start, last): Interval, parent: Option<NodeId>) -> Node {
        Node {
            start,
            last,
            parent,
            left: None,
            right: None,
        }
    }

    pub fn interval(&self) -> Interval {
        (self.start, self.last)
    }

    pub fn overlaps(&self, left: u64, right: u64) -> bool {
        self.start <= right && self.last >= left
    }

    /// `last` bounds every descendant's `last`, so a subtree whose root ends
    /// before `left` cannot hold an overlap.
    pub fn admits(&self, left: u64) -> bool {
        self.last >= left
    }

    pub fn child(&self, go_right: bool) -> Option<NodeId> {
        if go_right {
            self.right
        } else {
            self.left
        }
    }

    pub fn child_mut(&mut self, go_right: bool) -> &mut Option<NodeId> {
        if go_right {
            &mut self.right
        } else {
            &mut self.left
        }
    }
}

/// Renders the subtree rooted at `id` as nested `{ [start,last] left:… right:… }` groups.
pub(crate) struct Subtree<'a> {
    pub nodes: &'a [Node],
    pub id: NodeId,
}

impl<'a> Subtree<'a> {
    fn child(&self, id: Option<NodeId>) -> Option<Subtree<'a>> {
        id.map(|id| Subtree {
            nodes: self.nodes,
            id,
        })
    }
}

impl fmt::Display for Subtree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let node = &self.nodes[self.id.index()];
        match (self.child(node.left), self.child(node.right)) {
            (None, None) => write!(f, " {{ [{},{}] }} ", node.start, node.last),
            (None, Some(right)) => write!(
                f,
                " {{ [{},{}] right:{}}} ",
                node.start, node.last, right
            ),
            (Some(left), None) => write!(
                f,
                " {{ [{},{}] left:{}}} ",
                node.start, node.last, left
            ),
            (Some(left), Some(right)) => write!(
                f,
                " {{ [{},{}] left:{}right:{}}} ",
                node.start, node.last, left, right
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_last_outranks() {
        assert!(outranks((5, 9), (0, 8)));
        assert!(!outranks((0, 8), (5, 9)));
    }

    #[test]
    fn equal_last_prefers_smaller_start() {
        assert!(outranks((1, 6), (3, 6)));
        assert!(!outranks((3, 6), (1, 6)));
        assert!(!outranks((3, 6), (3, 6)));
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        let node = Node::new((2, 4), None);
        assert!(node.overlaps(4, 10));
        assert!(node.overlaps(0, 2));
        assert!(node.overlaps(3, 3));
        assert!(!node.overlaps(5, 10));
        assert!(!node.overlaps(0, 1));
    }

    #[test]
    fn admits_uses_last_as_bound() {
        let node = Node::new((2, 4), None);
        assert!(node.admits(4));
        assert!(!node.admits(5));
    }

    #[test]
    fn display_nested() {
        let mut root = Node::new((0, 5), None);
        root.left = Some(NodeId::new(1));
        root.right = Some(NodeId::new(2));
        let nodes = vec![
            root,
            Node::new((2, 4), Some(NodeId::new(0))),
            Node::new((4, 5), Some(NodeId::new(0))),
        ];
        let rendered = Subtree {
            nodes: &nodes,
            id: NodeId::new(0),
        }
        .to_string();
        assert_eq!(rendered, " { [0,5] left: { [2,4] } right: { [4,5] } } ");
    }
}
