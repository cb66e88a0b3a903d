//! Contiguous record store.
//!
//! Records live in one index-addressable vector bounded by a fixed capacity.
//! Each slot carries the record's normalized type key next to the record so
//! type sorts and searches never re-lowercase.

use crate::bench::{measure, ScanOutcome, TraversalOutcome};
use crate::error::{Result, StoreError};
use crate::store::RecordStore;
use crate::types::{Record, StoreKind, TypeKey};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hint::black_box;
use std::mem;

struct Slot {
    key: TypeKey,
    record: Record,
}

impl Slot {
    fn new(record: Record) -> Self {
        Self {
            key: record.type_key(),
            record,
        }
    }
}

/// Contiguous, append-only record store.
pub struct SequenceStore {
    slots: Vec<Slot>,
    capacity: usize,
}

impl SequenceStore {
    /// Bytes charged per slot on top of the record itself.
    pub const SLOT_OVERHEAD: usize = mem::size_of::<Slot>() - mem::size_of::<Record>();

    /// Bytes charged per record value.
    pub const RECORD_COST: usize = mem::size_of::<Record>();

    /// Create an empty store holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    /// Append a record at the end.
    ///
    /// Fails with `StoreError::CapacityExceeded` once `capacity` records are held.
    pub fn append(&mut self, record: Record) -> Result<()> {
        if self.slots.len() >= self.capacity {
            return Err(StoreError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.slots.push(Slot::new(record));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.slots.get(index).map(|slot| &slot.record)
    }

    /// Records in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.slots.iter().map(|slot| &slot.record)
    }

    /// Records in `range`, clamped to the store length.
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = &Record> + '_ {
        let end = end.min(self.slots.len());
        let start = start.min(end);
        self.slots[start..end].iter().map(|slot| &slot.record)
    }

    /// In-place quicksort on `location`.
    ///
    /// Middle-element pivot with a Hoare partition. Not stable, and quadratic
    /// on adversarial input.
    pub fn sort_by_location(&mut self) {
        quicksort_by_location(&mut self.slots);
    }

    /// Sort on the case-insensitive transaction type.
    pub fn sort_by_type(&mut self) {
        self.slots.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// All records whose type equals `query`, ignoring case.
    ///
    /// The store must already be sorted by type; on an unsorted store the
    /// result is unspecified. Binary search finds one match, then the run of
    /// equal keys is widened in both directions.
    pub fn binary_search_by_type(&self, query: &str) -> Vec<&Record> {
        let key = TypeKey::new(query);

        let mut low = 0;
        let mut high = self.slots.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.slots[mid].key.cmp(&key) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => {
                    let mut start = mid;
                    while start > 0 && self.slots[start - 1].key == key {
                        start -= 1;
                    }
                    let mut end = mid + 1;
                    while end < self.slots.len() && self.slots[end].key == key {
                        end += 1;
                    }
                    return self.range(start, end).collect();
                }
            }
        }

        Vec::new()
    }

    /// Visit every record, touching `amount` on type matches.
    pub fn benchmark_scan(&self, query: &str) -> ScanOutcome {
        let key = TypeKey::new(query);
        let ((visited, matched), elapsed) = measure(|| {
            let mut visited = 0;
            let mut matched = 0;
            for slot in &self.slots {
                visited += 1;
                if slot.key == key {
                    black_box(slot.record.amount);
                    matched += 1;
                }
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
            for slot in &self.slots {
                black_box(slot.record.amount * 2.0);
                visited += 1;
            }
            visited
        });
        TraversalOutcome { visited, elapsed }
    }

    /// Estimated footprint: len × (slot overhead + record cost).
    pub fn estimate_memory(&self) -> usize {
        self.slots.len() * (Self::SLOT_OVERHEAD + Self::RECORD_COST)
    }

    /// Distinct normalized types, ascending.
    pub fn distinct_types(&self) -> Vec<TypeKey> {
        self.slots
            .iter()
            .map(|slot| slot.key.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl RecordStore for SequenceStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Sequence
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn append(&mut self, record: Record) -> Result<()> {
        SequenceStore::append(self, record)
    }

    fn sort_by_location(&mut self) {
        SequenceStore::sort_by_location(self)
    }

    fn sort_by_type(&mut self) {
        SequenceStore::sort_by_type(self)
    }

    fn search_by_type(&self, query: &str) -> Vec<&Record> {
        self.binary_search_by_type(query)
    }

    fn benchmark_scan(&self, query: &str) -> ScanOutcome {
        SequenceStore::benchmark_scan(self, query)
    }

    fn benchmark_traversal(&self) -> TraversalOutcome {
        SequenceStore::benchmark_traversal(self)
    }

    fn estimate_memory(&self) -> usize {
        SequenceStore::estimate_memory(self)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_> {
        Box::new(self.iter())
    }
}

/// Hoare-partition quicksort keyed on location.
///
/// Recurses into the smaller partition and loops on the larger one, which
/// keeps stack depth logarithmic without changing which elements are
/// compared or swapped.
fn quicksort_by_location(slots: &mut [Slot]) {
    let mut slots = slots;
    while slots.len() > 1 {
        let (left_len, right_start) = partition(slots);
        let (left, right) = mem::take(&mut slots).split_at_mut(right_start);
        let left = &mut left[..left_len];
        if left.len() < right.len() {
            quicksort_by_location(left);
            slots = right;
        } else {
            quicksort_by_location(right);
            slots = left;
        }
    }
}

/// Partition around the middle element.
///
/// Returns `(left_len, right_start)`: `slots[..left_len]` holds locations
/// `<=` the pivot, `slots[right_start..]` holds locations `>=` it.
fn partition(slots: &mut [Slot]) -> (usize, usize) {
    let last = slots.len() as isize - 1;
    let pivot = slots[(last / 2) as usize].record.location.clone();

    let mut i: isize = 0;
    let mut j: isize = last;
    while i <= j {
        while slots[i as usize].record.location < pivot {
            i += 1;
        }
        while slots[j as usize].record.location > pivot {
            j -= 1;
        }
        if i <= j {
            slots.swap(i as usize, j as usize);
            i += 1;
            j -= 1;
        }
    }

    ((j + 1) as usize, i as usize)
}
