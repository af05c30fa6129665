//! Augmented AVL interval tree for point-containment queries.
//!
//! Nodes are keyed by interval start and carry the maximum end of their subtree,
//! so a point query only descends into subtrees that can still contain the point.
//! Insert and query are O(log n) (plus the size of the result).

/// A stored interval `[start, end]` (both inclusive) with its payload
#[derive(Debug)]
struct Node<T> {
    start: i64,
    end: i64,
    payload: T,
    /// Largest `end` in this subtree
    max_end: i64,
    height: i32,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn leaf(start: i64, end: i64, payload: T) -> Box<Self> {
        Box::new(Self {
            start,
            end,
            payload,
            max_end: end,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
        self.max_end = self
            .end
            .max(max_end(&self.left))
            .max(max_end(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height<T>(node: &Option<Box<Node<T>>>) -> i32 {
    node.as_ref().map_or(0, |n| n.height)
}

fn max_end<T>(node: &Option<Box<Node<T>>>) -> i64 {
    node.as_ref().map_or(i64::MIN, |n| n.max_end)
}

fn rotate_right<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update();
    pivot.right = Some(node);
    pivot.update();
    pivot
}

fn rotate_left<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update();
    pivot.left = Some(node);
    pivot.update();
    pivot
}

fn rebalance<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    node.update();
    let bf = node.balance_factor();
    if bf > 1 {
        if let Some(left) = node.left.take() {
            node.left = Some(if left.balance_factor() < 0 {
                rotate_left(left)
            } else {
                left
            });
        }
        return rotate_right(node);
    }
    if bf < -1 {
        if let Some(right) = node.right.take() {
            node.right = Some(if right.balance_factor() > 0 {
                rotate_right(right)
            } else {
                right
            });
        }
        return rotate_left(node);
    }
    node
}

fn insert_into<T>(node: Option<Box<Node<T>>>, new: Box<Node<T>>) -> Box<Node<T>> {
    match node {
        None => new,
        Some(mut n) => {
            // Equal starts go right so insertion order is kept among ties
            if new.start < n.start {
                n.left = Some(insert_into(n.left.take(), new));
            } else {
                n.right = Some(insert_into(n.right.take(), new));
            }
            rebalance(n)
        }
    }
}

fn collect_point<'a, T>(node: &'a Option<Box<Node<T>>>, point: i64, out: &mut Vec<&'a T>) {
    let Some(n) = node else { return };
    if n.max_end < point {
        return;
    }
    collect_point(&n.left, point, out);
    if n.start <= point {
        if point <= n.end {
            out.push(&n.payload);
        }
        collect_point(&n.right, point, out);
    }
}

/// Interval index supporting insertion and "which intervals contain this point"
#[derive(Debug)]
pub struct IntervalTree<T> {
    root: Option<Box<Node<T>>>,
    len: usize,
}

impl<T> IntervalTree<T> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Insert `[start, end]`; a reversed interval is stored with its ends swapped
    pub fn insert(&mut self, start: i64, end: i64, payload: T) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.root = Some(insert_into(self.root.take(), Node::leaf(start, end, payload)));
        self.len += 1;
    }

    /// Payloads of every stored interval with `start <= point <= end`, ordered by start
    pub fn query_point(&self, point: i64) -> Vec<&T> {
        let mut out = Vec::new();
        collect_point(&self.root, point, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    fn height(&self) -> i32 {
        height(&self.root)
    }
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
