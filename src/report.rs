//! Store-vs-store comparison.

use crate::bench::{BenchmarkRun, Measurement};
use crate::error::{Result, StoreError};
use std::cmp::Ordering;
use std::fmt;

/// Outcome on one axis; "first" is the sequence store, "second" the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// First is faster or smaller.
    First,
    /// Second is faster or smaller.
    Second,
    Tie,
}

impl Verdict {
    /// Lower wins.
    pub fn between<T: Ord>(first: T, second: T) -> Self {
        match first.cmp(&second) {
            Ordering::Less => Verdict::First,
            Ordering::Greater => Verdict::Second,
            Ordering::Equal => Verdict::Tie,
        }
    }
}

/// Comparison of sort time, search time and memory for the two stores.
///
/// Times are compared at their reported resolution, so durations that round
/// to the same figure tie.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonReport {
    pub sequence_sort: Measurement,
    pub chain_sort: Measurement,
    pub sequence_search: Measurement,
    pub chain_search: Measurement,
    pub sequence_bytes: usize,
    pub chain_bytes: usize,
    pub sort: Verdict,
    pub search: Verdict,
    pub memory: Verdict,
}

impl ComparisonReport {
    pub fn from_figures(
        sequence_sort: Measurement,
        chain_sort: Measurement,
        sequence_search: Measurement,
        chain_search: Measurement,
        sequence_bytes: usize,
        chain_bytes: usize,
    ) -> Self {
        Self {
            sort: Verdict::between(sequence_sort.value(), chain_sort.value()),
            search: Verdict::between(sequence_search.value(), chain_search.value()),
            memory: Verdict::between(sequence_bytes, chain_bytes),
            sequence_sort,
            chain_sort,
            sequence_search,
            chain_search,
            sequence_bytes,
            chain_bytes,
        }
    }

    /// Build a report from the last benchmark run.
    ///
    /// Fails with `StoreError::NotReady` when no run has been made yet.
    pub fn compare(
        run: Option<&BenchmarkRun>,
        sequence_bytes: usize,
        chain_bytes: usize,
    ) -> Result<Self> {
        let run = run.ok_or_else(|| {
            StoreError::NotReady("run the benchmark before comparing stores".into())
        })?;
        Ok(Self::from_figures(
            run.sequence_sort,
            run.chain_sort,
            run.sequence_search,
            run.chain_search,
            sequence_bytes,
            chain_bytes,
        ))
    }

    /// Human-readable status lines.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("[ SEQUENCE ] sort (location): {}", self.sequence_sort),
            format!("[ SEQUENCE ] search (all types): {}", self.sequence_search),
            format!("[ CHAIN ] sort (location): {}", self.chain_sort),
            format!("[ CHAIN ] search (all types): {}", self.chain_search),
            format!("SORTING: {}", Axis::Sort.describe(self.sort)),
            format!("SEARCHING: {}", Axis::Search.describe(self.search)),
            format!(
                "MEMORY: sequence {} bytes, chain {} bytes; {}",
                self.sequence_bytes,
                self.chain_bytes,
                Axis::Memory.describe(self.memory)
            ),
        ]
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Sort,
    Search,
    Memory,
}

impl Axis {
    fn describe(self, verdict: Verdict) -> &'static str {
        match (self, verdict) {
            (Axis::Sort, Verdict::First) => "sequence store is faster for sorting by location",
            (Axis::Sort, Verdict::Second) => "chain store is faster for sorting by location",
            (Axis::Sort, Verdict::Tie) => "both are equally fast for sorting",
            (Axis::Search, Verdict::First) => "sequence store is faster for searching types",
            (Axis::Search, Verdict::Second) => "chain store is faster for searching types",
            (Axis::Search, Verdict::Tie) => "both are equally fast for searching",
            (Axis::Memory, Verdict::First) => "sequence store uses less memory",
            (Axis::Memory, Verdict::Second) => "chain store uses less memory",
            (Axis::Memory, Verdict::Tie) => "both use equal memory",
        }
    }
}
