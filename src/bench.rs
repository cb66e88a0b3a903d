//! Benchmark harness.
//!
//! Wraps synchronous operations with a monotonic clock. Sorts are reported
//! in milliseconds, scans in nanoseconds, traversals in microseconds.

use crate::chain::ChainStore;
use crate::sequence::SequenceStore;
use crate::store::RecordStore;
use crate::types::TypeKey;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Unit a measurement is reported and compared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Millis,
    Micros,
    Nanos,
}

impl Resolution {
    /// Whole units of `elapsed` at this resolution.
    pub fn count(self, elapsed: Duration) -> u128 {
        match self {
            Resolution::Millis => elapsed.as_millis(),
            Resolution::Micros => elapsed.as_micros(),
            Resolution::Nanos => elapsed.as_nanos(),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Resolution::Millis => "ms",
            Resolution::Micros => "µs",
            Resolution::Nanos => "ns",
        }
    }
}

/// An elapsed duration plus the resolution it is reported at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub elapsed: Duration,
    pub resolution: Resolution,
}

impl Measurement {
    pub fn new(elapsed: Duration, resolution: Resolution) -> Self {
        Self {
            elapsed,
            resolution,
        }
    }

    /// Reported figure in whole units.
    pub fn value(&self) -> u128 {
        self.resolution.count(self.elapsed)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value(), self.resolution.unit())
    }
}

/// Result of one exhaustive type scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Records visited; always the store length.
    pub visited: usize,
    /// Records whose type matched the query.
    pub matched: usize,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.elapsed, Resolution::Nanos)
    }
}

/// Result of one full traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalOutcome {
    pub visited: usize,
    pub elapsed: Duration,
}

impl TraversalOutcome {
    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.elapsed, Resolution::Micros)
    }
}

/// Run `op` between two monotonic clock reads.
pub fn measure<R>(op: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let result = op();
    (result, start.elapsed())
}

/// Run `op` and report its duration at `resolution`.
pub fn time<R>(resolution: Resolution, op: impl FnOnce() -> R) -> (R, Measurement) {
    let (result, elapsed) = measure(op);
    (result, Measurement::new(elapsed, resolution))
}

/// Sum of `benchmark_scan` durations over `types`.
pub fn total_scan_time<S>(store: &S, types: &[TypeKey]) -> Measurement
where
    S: RecordStore + ?Sized,
{
    let elapsed = types
        .iter()
        .map(|key| {
            let outcome = store.benchmark_scan(key.as_str());
            debug!(
                store = %store.kind(),
                transaction_type = %key,
                matched = outcome.matched,
                nanos = outcome.elapsed.as_nanos() as u64,
                "Scan finished"
            );
            outcome.elapsed
        })
        .sum();
    Measurement::new(elapsed, Resolution::Nanos)
}

/// Timings from one full store-vs-store benchmark.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkRun {
    pub sequence_sort: Measurement,
    pub chain_sort: Measurement,
    pub sequence_search: Measurement,
    pub chain_search: Measurement,
    /// Types scanned, as observed in the sequence store.
    pub types: Vec<TypeKey>,
}

/// Sort both stores by location, then scan both for every observed type.
///
/// Both stores are left sorted by location. Every call measures afresh.
pub fn run_benchmark(sequence: &mut SequenceStore, chain: &mut ChainStore) -> BenchmarkRun {
    let ((), sequence_sort) = time(Resolution::Millis, || sequence.sort_by_location());
    let ((), chain_sort) = time(Resolution::Millis, || chain.sort_by_location());

    let types = sequence.distinct_types();
    let sequence_search = total_scan_time(&*sequence, &types);
    let chain_search = total_scan_time(&*chain, &types);

    info!(
        sequence_sort = %sequence_sort,
        chain_sort = %chain_sort,
        sequence_search = %sequence_search,
        chain_search = %chain_search,
        types = types.len(),
        "Benchmark run complete"
    );

    BenchmarkRun {
        sequence_sort,
        chain_sort,
        sequence_search,
        chain_search,
        types,
    }
}
