//! # Dual Store
//!
//! Transaction records held twice: once in a contiguous, capacity-bounded
//! sequence and once in a singly linked chain, with the same sort, search
//! and benchmark operations on both so their costs can be compared.
//!
//! ## Core Concepts
//!
//! - **Sequence store**: index-addressable records, quicksort by location,
//!   binary search by type
//! - **Chain store**: linked records, merge sort by location or type, jump
//!   search by type
//! - **Channel chains**: per-payment-channel sub-chains filled on load
//! - **Benchmarks**: timed sorts, scans and traversals feeding a comparison
//!   report
//!
//! ## Example
//!
//! ```ignore
//! use dualstore::{Ledger, LedgerConfig, StoreKind};
//!
//! let (mut ledger, summary) = Ledger::load(LedgerConfig::default(), "transactions.csv")?;
//! println!("{}", summary);
//!
//! let cards = ledger.search_by_type(StoreKind::Chain, "card");
//! println!("{} card transactions", cards.len());
//!
//! let run = ledger.run_benchmark();
//! println!("{}", ledger.compare(Some(&run))?);
//! ```

pub mod bench;
pub mod chain;
pub mod error;
pub mod ingest;
pub mod records;
pub mod report;
pub mod sequence;
pub mod store;
pub mod types;

// Re-exports
pub use bench::{
    measure, run_benchmark, time, total_scan_time, BenchmarkRun, Measurement, Resolution,
    ScanOutcome, TraversalOutcome,
};
pub use chain::ChainStore;
pub use error::{Result, StoreError};
pub use ingest::{ingest, IngestSummary, OverflowPolicy};
pub use records::{export_json, parse_line, read_json, RecordReader};
pub use report::{ComparisonReport, Verdict};
pub use sequence::SequenceStore;
pub use store::{ExportSelection, ExportSummary, Ledger, LedgerConfig, RecordStore};
pub use types::*;
