//! Singly linked record store.
//!
//! Nodes live in one arena vector and link to each other by index. Head and
//! tail indices give O(1) appends; reads are traversals only, and the length
//! is not cached. Sorts relink indices and never move nodes.

use crate::bench::{measure, ScanOutcome, TraversalOutcome};
use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{Record, StoreKind, TypeKey};
use std::cmp::Ordering;
use std::hint::black_box;
use std::mem;

struct Node {
    key: TypeKey,
    record: Record,
    next: Link,
}

/// Arena index of the next node, if any.
type Link = Option<usize>;

/// Singly linked, tail-appendable record store.
#[derive(Default)]
pub struct ChainStore {
    nodes: Vec<Node>,
    head: Link,
    /// Last node reachable from `head`; `None` iff `head` is `None`.
    tail: Link,
}

impl ChainStore {
    /// Bytes charged per node on top of the record itself.
    pub const NODE_OVERHEAD: usize = mem::size_of::<Node>() - mem::size_of::<Record>();

    /// Bytes charged per record value.
    pub const RECORD_COST: usize = mem::size_of::<Record>();

    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail in O(1).
    pub fn append(&mut self, record: Record) {
        let index = self.nodes.len();
        self.nodes.push(Node {
            key: record.type_key(),
            record,
            next: None,
        });

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    /// Node count, by traversal.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Records in chain order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
        }
    }

    /// Merge sort on `location`.
    ///
    /// Equal locations keep the left half's record first at every merge.
    pub fn sort_by_location(&mut self) {
        self.merge_sort(|left, right| left.record.location <= right.record.location);
    }

    /// Merge sort on the case-insensitive transaction type.
    pub fn sort_by_type(&mut self) {
        self.merge_sort(|left, right| left.key <= right.key);
    }

    fn merge_sort<F>(&mut self, in_order: F)
    where
        F: Fn(&Node, &Node) -> bool,
    {
        let head = self.head.take();
        self.head = merge_sort(&mut self.nodes, head, &in_order);
        self.relink_tail();
    }

    fn relink_tail(&mut self) {
        let mut tail = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            tail = Some(index);
            cursor = self.nodes[index].next;
        }
        self.tail = tail;
    }

    /// All records whose type equals `query`, ignoring case.
    ///
    /// The chain must already be sorted by type; on an unsorted chain the
    /// result is unspecified. Jumps `floor(sqrt(n))` nodes at a time until a
    /// block starts at or past the query, then scans forward from the last
    /// block boundary that was still below it.
    pub fn jump_search_by_type(&self, query: &str) -> Vec<&Record> {
        let key = TypeKey::new(query);
        let count = self.len();
        if count == 0 {
            return Vec::new();
        }
        let step = isqrt(count).max(1);

        let mut boundary: Link = None;
        let mut block = self.head;
        while let Some(index) = block {
            if self.nodes[index].key >= key {
                break;
            }
            boundary = Some(index);
            block = self.advance(index, step);
        }

        let mut matches = Vec::new();
        let mut cursor = boundary.or(self.head);
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            match node.key.cmp(&key) {
                Ordering::Less => {}
                Ordering::Equal => matches.push(&node.record),
                Ordering::Greater => break,
            }
            cursor = node.next;
        }
        matches
    }

    fn advance(&self, index: usize, steps: usize) -> Link {
        let mut cursor = Some(index);
        for _ in 0..steps {
            cursor = self.nodes[cursor?].next;
        }
        cursor
    }

    /// Visit every record, touching `amount` on type matches.
    pub fn benchmark_scan(&self, query: &str) -> ScanOutcome {
        let key = TypeKey::new(query);
        let ((visited, matched), elapsed) = measure(|| {
            let mut visited = 0;
            let mut matched = 0;
            let mut cursor = self.head;
            while let Some(index) = cursor {
                let node = &self.nodes[index];
                visited += 1;
                if node.key == key {
                    black_box(node.record.amount);
                    matched += 1;
                }
                cursor = node.next;
            }
            (visited, matched)
        });
        ScanOutcome {
            visited,
            matched,
            elapsed,
        }
    }

    /// Visit every record, touching `amount * 2.0`.
    pub fn benchmark_traversal(&self) -> TraversalOutcome {
        let (visited, elapsed) = measure(|| {
            let mut visited = 0;
            let mut cursor = self.head;
            while let Some(index) = cursor {
                let node = &self.nodes[index];
                black_box(node.record.amount * 2.0);
                visited += 1;
                cursor = node.next;
            }
            visited
        });
        TraversalOutcome { visited, elapsed }
    }

    /// Estimated footprint: node count × (node overhead + record cost).
    pub fn estimate_memory(&self) -> usize {
        self.len() * (Self::NODE_OVERHEAD + Self::RECORD_COST)
    }
}

impl FromIterator<Record> for ChainStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut chain = ChainStore::new();
        for record in iter {
            chain.append(record);
        }
        chain
    }
}

impl RecordStore for ChainStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Chain
    }

    fn len(&self) -> usize {
        ChainStore::len(self)
    }

    fn append(&mut self, record: Record) -> Result<()> {
        ChainStore::append(self, record);
        Ok(())
    }

    fn sort_by_location(&mut self) {
        ChainStore::sort_by_location(self)
    }

    fn sort_by_type(&mut self) {
        ChainStore::sort_by_type(self)
    }

    fn search_by_type(&self, query: &str) -> Vec<&Record> {
        self.jump_search_by_type(query)
    }

    fn benchmark_scan(&self, query: &str) -> ScanOutcome {
        ChainStore::benchmark_scan(self, query)
    }

    fn benchmark_traversal(&self) -> TraversalOutcome {
        ChainStore::benchmark_traversal(self)
    }

    fn estimate_memory(&self) -> usize {
        ChainStore::estimate_memory(self)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_> {
        Box::new(self.iter())
    }
}

/// Iterator over the records of a chain.
pub struct Iter<'a> {
    nodes: &'a [Node],
    next: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.next?];
        self.next = node.next;
        Some(&node.record)
    }
}

fn isqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Top-down merge sort over the chain starting at `head`.
///
/// Recursion depth is log2(n); merging is iterative.
fn merge_sort<F>(nodes: &mut [Node], head: Link, in_order: &F) -> Link
where
    F: Fn(&Node, &Node) -> bool,
{
    let front = head?;
    if nodes[front].next.is_none() {
        return Some(front);
    }
    let back = split(nodes, front);
    let front = merge_sort(nodes, Some(front), in_order);
    let back = merge_sort(nodes, back, in_order);
    merge(nodes, front, back, in_order)
}

/// Detach the second half of a chain of two or more nodes.
///
/// A fast cursor moves two nodes for every one the slow cursor moves, so on
/// odd lengths the front half keeps the extra node.
fn split(nodes: &mut [Node], head: usize) -> Link {
    let mut slow = head;
    let mut fast = nodes[head].next;
    while let Some(index) = fast {
        fast = nodes[index].next;
        if let Some(index) = fast {
            if let Some(next) = nodes[slow].next {
                slow = next;
            }
            fast = nodes[index].next;
        }
    }
    nodes[slow].next.take()
}

/// Relink two sorted chains into one, taking from `left` while `in_order`.
fn merge<F>(nodes: &mut [Node], mut left: Link, mut right: Link, in_order: &F) -> Link
where
    F: Fn(&Node, &Node) -> bool,
{
    let mut head: Link = None;
    let mut tail: Link = None;
    while let (Some(l), Some(r)) = (left, right) {
        let taken = if in_order(&nodes[l], &nodes[r]) {
            left = nodes[l].next;
            l
        } else {
            right = nodes[r].next;
            r
        };
        match tail {
            Some(t) => nodes[t].next = Some(taken),
            None => head = Some(taken),
        }
        tail = Some(taken);
    }

    let rest = left.or(right);
    match tail {
        Some(t) => nodes[t].next = rest,
        None => head = rest,
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, transaction_type: &str, location: &str) -> Record {
        Record {
            transaction_id: id.into(),
            transaction_type: transaction_type.into(),
            location: location.into(),
            amount: 2.5,
            ..Default::default()
        }
    }

    fn chain_of(rows: &[(&str, &str, &str)]) -> ChainStore {
        rows.iter()
            .map(|(id, ty, loc)| record(id, ty, loc))
            .collect()
    }

    fn ids(chain: &ChainStore) -> Vec<String> {
        chain.iter().map(|r| r.transaction_id.clone()).collect()
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut chain = ChainStore::new();
        assert!(chain.is_empty());
        chain.append(record("T1", "card", "NYC"));
        chain.append(record("T2", "wire", "LA"));
        chain.append(record("T3", "ach", "Boston"));

        assert_eq!(ids(&chain), vec!["T1", "T2", "T3"]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_sort_by_location() {
        let mut chain = chain_of(&[
            ("T1", "card", "NYC"),
            ("T2", "wire", "LA"),
            ("T3", "card", "Boston"),
            ("T4", "ach", "Austin"),
            ("T5", "upi", "Denver"),
        ]);
        chain.sort_by_location();

        let locations: Vec<_> = chain.iter().map(|r| r.location.clone()).collect();
        assert_eq!(locations, vec!["Austin", "Boston", "Denver", "LA", "NYC"]);
    }

    #[test]
    fn test_append_after_sort_uses_new_tail() {
        let mut chain = chain_of(&[("T1", "card", "NYC"), ("T2", "wire", "LA")]);
        chain.sort_by_location();
        chain.append(record("T3", "ach", "Austin"));
        assert_eq!(ids(&chain), vec!["T2", "T1", "T3"]);
    }

    #[test]
    fn test_equal_keys_keep_left_first() {
        let mut chain = chain_of(&[
            ("T1", "card", "LA"),
            ("T2", "card", "LA"),
            ("T3", "card", "LA"),
            ("T4", "card", "LA"),
            ("T5", "card", "LA"),
        ]);
        chain.sort_by_location();
        assert_eq!(ids(&chain), vec!["T1", "T2", "T3", "T4", "T5"]);
    }

    #[test]
    fn test_split_gives_front_the_extra_node() {
        let mut chain = chain_of(&[("T1", "a", "x"), ("T2", "a", "x"), ("T3", "a", "x")]);
        let head = chain.head.unwrap();

        let back = split(&mut chain.nodes, head).unwrap();
        assert_eq!(chain.nodes[back].record.transaction_id, "T3");
        assert!(chain.nodes[back].next.is_none());

        let second = chain.nodes[head].next.unwrap();
        assert_eq!(chain.nodes[second].record.transaction_id, "T2");
        assert!(chain.nodes[second].next.is_none());
    }

    #[test]
    fn test_sort_relinks_without_moving_nodes() {
        let mut chain = chain_of(&[("T1", "card", "NYC"), ("T2", "wire", "LA")]);
        chain.sort_by_location();

        assert_eq!(chain.head, Some(1));
        assert_eq!(chain.tail, Some(0));
        assert_eq!(chain.nodes[0].record.transaction_id, "T1");
        assert!(chain.nodes[0].next.is_none());
    }

    #[test]
    fn test_append_after_move() {
        let mut chain = ChainStore::new();
        chain.append(record("T1", "card", "NYC"));
        let mut moved = Box::new(chain);
        moved.append(record("T2", "wire", "LA"));
        let mut holder = vec![*moved];
        holder[0].append(record("T3", "ach", "Austin"));
        assert_eq!(ids(&holder[0]), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_jump_search_after_type_sort() {
        let mut chain = chain_of(&[
            ("T1", "Card", "NYC"),
            ("T2", "wire", "LA"),
            ("T3", "CARD", "Boston"),
            ("T4", "ach", "NYC"),
            ("T5", "card", "Austin"),
            ("T6", "upi", "Austin"),
            ("T7", "ach", "LA"),
        ]);
        chain.sort_by_type();

        let found: Vec<_> = chain
            .jump_search_by_type("card")
            .iter()
            .map(|r| r.transaction_id.clone())
            .collect();
        assert_eq!(found, vec!["T1", "T3", "T5"]);

        assert_eq!(chain.jump_search_by_type("ACH").len(), 2);
        assert_eq!(chain.jump_search_by_type("WIRE").len(), 1);
        assert!(chain.jump_search_by_type("aaa").is_empty());
        assert!(chain.jump_search_by_type("zzz").is_empty());
        assert!(chain.jump_search_by_type("bank").is_empty());
    }

    #[test]
    fn test_jump_search_match_at_head() {
        let mut chain = chain_of(&[("T1", "ach", "NYC"), ("T2", "card", "LA")]);
        chain.sort_by_type();
        let found = chain.jump_search_by_type("ach");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].transaction_id, "T1");
    }

    #[test]
    fn test_empty_chain() {
        let mut chain = ChainStore::new();
        chain.sort_by_location();
        chain.sort_by_type();
        assert!(chain.jump_search_by_type("card").is_empty());
        assert_eq!(chain.estimate_memory(), 0);
        assert_eq!(chain.benchmark_scan("card").visited, 0);
    }

    #[test]
    fn test_benchmark_scan_counts() {
        let chain = chain_of(&[("T1", "card", "NYC"), ("T2", "wire", "LA"), ("T3", "Card", "LA")]);
        let outcome = chain.benchmark_scan("CARD");
        assert_eq!(outcome.visited, 3);
        assert_eq!(outcome.matched, 2);
        assert_eq!(chain.benchmark_traversal().visited, 3);
    }

    #[test]
    fn test_memory_estimate() {
        let chain = chain_of(&[("T1", "card", "NYC"), ("T2", "wire", "LA")]);
        assert_eq!(
            chain.estimate_memory(),
            2 * (ChainStore::NODE_OVERHEAD + ChainStore::RECORD_COST)
        );
        assert!(ChainStore::NODE_OVERHEAD > 0);
    }

    #[test]
    fn test_long_chain_sorts_and_drops() {
        let mut chain: ChainStore = (0..200_000u64)
            .map(|i| record("T", "card", &format!("L{:06}", (i * 7919) % 200_000)))
            .collect();
        chain.sort_by_location();

        let mut previous: Option<String> = None;
        for r in chain.iter() {
            if let Some(prev) = &previous {
                assert!(prev <= &r.location);
            }
            previous = Some(r.location.clone());
        }
        drop(chain);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(8), 2);
        assert_eq!(isqrt(9), 3);
        assert_eq!(isqrt(50_000), 223);
    }
}
