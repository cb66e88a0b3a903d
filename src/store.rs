//! Main Ledger struct tying all components together.

use crate::bench::{self, BenchmarkRun, ScanOutcome, TraversalOutcome};
use crate::chain::ChainStore;
use crate::error::Result;
use crate::ingest::{self, IngestSummary, OverflowPolicy};
use crate::records::{export_json, RecordReader, DEFAULT_DELIMITER};
use crate::report::ComparisonReport;
use crate::sequence::SequenceStore;
use crate::types::{LedgerStats, PaymentChannel, Record, StoreKind};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::info;

/// Operations both representations provide.
///
/// Searches assume the store was sorted by type first; on an unsorted store
/// their result is unspecified.
pub trait RecordStore {
    fn kind(&self) -> StoreKind;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&mut self, record: Record) -> Result<()>;

    fn sort_by_location(&mut self);

    fn sort_by_type(&mut self);

    /// Binary search on the sequence store, jump search on the chain.
    fn search_by_type(&self, query: &str) -> Vec<&Record>;

    fn benchmark_scan(&self, query: &str) -> ScanOutcome;

    fn benchmark_traversal(&self) -> TraversalOutcome;

    fn estimate_memory(&self) -> usize;

    /// Records in store order.
    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_>;

    /// First `limit` records as one-line summaries.
    fn preview(&self, limit: usize) -> Vec<String> {
        self.records()
            .take(limit)
            .map(Record::summary_line)
            .collect()
    }
}

/// Ledger configuration.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Maximum records held; shared by ingestion and the sequence store.
    pub capacity: usize,

    /// What to do when a load exceeds `capacity`.
    pub on_capacity_exceeded: OverflowPolicy,

    /// Input field delimiter.
    pub delimiter: char,

    /// Rows shown by previews.
    pub preview_limit: usize,

    /// Log progress every N input rows (0 = never).
    pub progress_every: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: 50_000,
            on_capacity_exceeded: OverflowPolicy::Abort,
            delimiter: DEFAULT_DELIMITER,
            preview_limit: 20,
            progress_every: 100_000,
        }
    }
}

/// What to export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportSelection {
    /// The sequence store in its current order.
    Full,
    /// Sort the chosen store by location, then export it.
    SortedByLocation(StoreKind),
    /// Sort the chosen store by type, then export that store's search result.
    MatchingType { store: StoreKind, query: String },
}

/// Where an export went and how many records it wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub count: usize,
}

/// Both store representations plus the per-channel chains.
///
/// Every store owns its own copy of each record.
pub struct Ledger {
    config: LedgerConfig,
    pub(crate) sequence: SequenceStore,
    pub(crate) chain: ChainStore,
    pub(crate) channels: BTreeMap<PaymentChannel, ChainStore>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        let channels = PaymentChannel::ALL
            .iter()
            .map(|&channel| (channel, ChainStore::new()))
            .collect();
        Self {
            sequence: SequenceStore::new(config.capacity),
            chain: ChainStore::new(),
            channels,
            config,
        }
    }

    /// Load a delimited file.
    pub fn load(config: LedgerConfig, path: impl AsRef<Path>) -> Result<(Self, IngestSummary)> {
        let path = path.as_ref();
        let reader = RecordReader::open(path)?.with_delimiter(config.delimiter);
        info!(path = %path.display(), capacity = config.capacity, "Loading records");
        ingest::ingest(&config, reader)
    }

    /// Load delimited rows from any buffered reader.
    pub fn from_reader<R: BufRead>(config: LedgerConfig, reader: R) -> Result<(Self, IngestSummary)> {
        let reader = RecordReader::new(reader, config.delimiter);
        ingest::ingest(&config, reader)
    }

    /// Copy `record` into every store it belongs to.
    ///
    /// The sequence store is filled first so a capacity failure leaves all
    /// stores the same length.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.sequence.append(record.clone())?;
        if let Some(channel) = record.channel() {
            if let Some(chain) = self.channels.get_mut(&channel) {
                chain.append(record.clone());
            }
        }
        self.chain.append(record);
        Ok(())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn sequence(&self) -> &SequenceStore {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut SequenceStore {
        &mut self.sequence
    }

    pub fn chain(&self) -> &ChainStore {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut ChainStore {
        &mut self.chain
    }

    /// Sub-chain for one payment channel.
    pub fn channel(&self, channel: PaymentChannel) -> &ChainStore {
        &self.channels[&channel]
    }

    pub fn channels(&self) -> impl Iterator<Item = (PaymentChannel, &ChainStore)> + '_ {
        self.channels.iter().map(|(channel, chain)| (*channel, chain))
    }

    pub fn store(&self, kind: StoreKind) -> &dyn RecordStore {
        match kind {
            StoreKind::Sequence => &self.sequence,
            StoreKind::Chain => &self.chain,
        }
    }

    pub fn store_mut(&mut self, kind: StoreKind) -> &mut dyn RecordStore {
        match kind {
            StoreKind::Sequence => &mut self.sequence,
            StoreKind::Chain => &mut self.chain,
        }
    }

    /// Sort `kind` by location.
    pub fn sort_by_location(&mut self, kind: StoreKind) {
        let ((), took) = bench::time(bench::Resolution::Millis, || {
            self.store_mut(kind).sort_by_location()
        });
        info!(store = %kind, took = %took, "Sorted by location");
    }

    /// Sort `kind` by type and search it.
    pub fn search_by_type(&mut self, kind: StoreKind, query: &str) -> Vec<&Record> {
        self.store_mut(kind).sort_by_type();
        let matches = self.store(kind).search_by_type(query);
        info!(store = %kind, query, matches = matches.len(), "Searched by type");
        matches
    }

    /// Previews of the sequence store, the full chain and each channel chain.
    pub fn previews(&self) -> Vec<(String, Vec<String>)> {
        let limit = self.config.preview_limit;
        let mut sections = vec![
            ("Sequence store".to_string(), self.sequence.preview(limit)),
            ("Full chain".to_string(), self.chain.preview(limit)),
        ];
        for (channel, chain) in self.channels() {
            sections.push((format!("{} chain", channel), chain.preview(limit)));
        }
        sections
    }

    /// Traversal timings for the sequence store and each channel chain.
    pub fn traversals(&self) -> Vec<(String, TraversalOutcome)> {
        let mut timings = vec![("Sequence store".to_string(), self.sequence.benchmark_traversal())];
        for (channel, chain) in self.channels() {
            timings.push((format!("{} chain", channel), chain.benchmark_traversal()));
        }
        timings
    }

    /// Run the full sort and search benchmark on both stores.
    pub fn run_benchmark(&mut self) -> BenchmarkRun {
        bench::run_benchmark(&mut self.sequence, &mut self.chain)
    }

    /// Compare the stores using `run` and current memory estimates.
    pub fn compare(&self, run: Option<&BenchmarkRun>) -> Result<ComparisonReport> {
        ComparisonReport::compare(
            run,
            self.sequence.estimate_memory(),
            self.chain.estimate_memory(),
        )
    }

    /// Write `selection` as JSON to `name` (`.json` appended when missing).
    pub fn export(&mut self, selection: &ExportSelection, name: &str) -> Result<ExportSummary> {
        let (path, count) = match selection {
            ExportSelection::Full => export_json(name, self.sequence.iter())?,
            ExportSelection::SortedByLocation(kind) => {
                let store = self.store_mut(*kind);
                store.sort_by_location();
                export_json(name, store.records())?
            }
            ExportSelection::MatchingType { store, query } => {
                export_json(name, self.search_by_type(*store, query))?
            }
        };
        info!(path = %path.display(), count, "Exported records");
        Ok(ExportSummary { path, count })
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            sequence_len: self.sequence.len(),
            chain_len: self.chain.len(),
            channel_lens: self
                .channels()
                .map(|(channel, chain)| (channel, chain.len()))
                .collect(),
            sequence_bytes: self.sequence.estimate_memory(),
            chain_bytes: self.chain.estimate_memory(),
        }
    }
}
