//! Single-pass ingestion into every store.

use crate::error::{Result, StoreError};
use crate::store::{Ledger, LedgerConfig};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What ingestion does when the sequence store is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fail the whole load with `StoreError::CapacityExceeded`.
    #[default]
    Abort,
    /// Stop adding records but keep counting rows seen.
    Drop,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(OverflowPolicy::Abort),
            "drop" => Ok(OverflowPolicy::Drop),
            other => Err(format!(
                "unknown overflow policy {:?} (expected \"abort\" or \"drop\")",
                other
            )),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Abort => f.write_str("abort"),
            OverflowPolicy::Drop => f.write_str("drop"),
        }
    }
}

/// Counts from one ingestion pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records appended to the stores.
    pub loaded: usize,
    /// Malformed lines skipped.
    pub skipped: usize,
    /// Well-formed rows read, loaded or not.
    pub seen: usize,
    /// Well-formed rows not stored because capacity was reached.
    pub dropped: usize,
    pub elapsed: Duration,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loaded: {}, Skipped: {}, Seen: {}, Dropped: {}, Time: {} ms",
            self.loaded,
            self.skipped,
            self.seen,
            self.dropped,
            self.elapsed.as_millis()
        )
    }
}

/// Build a ledger from a stream of parsed rows.
///
/// Every record is copied into the sequence store, the full chain and, when
/// its payment channel has one, a channel chain. Malformed rows are counted
/// and skipped. Capacity overflow follows `config.on_capacity_exceeded`; with
/// `Abort` the partially built ledger is discarded and the error returned.
pub fn ingest<I>(config: &LedgerConfig, rows: I) -> Result<(Ledger, IngestSummary)>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let start = Instant::now();
    let mut ledger = Ledger::new(config.clone());
    let mut summary = IngestSummary::default();

    for row in rows {
        match row {
            Ok(record) => {
                summary.seen += 1;
                match ledger.insert(record) {
                    Ok(()) => summary.loaded += 1,
                    Err(StoreError::CapacityExceeded { capacity })
                        if config.on_capacity_exceeded == OverflowPolicy::Drop =>
                    {
                        if summary.dropped == 0 {
                            warn!(capacity, "Store capacity reached, dropping further rows");
                        }
                        summary.dropped += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, seen = summary.seen, "Aborting load");
                        return Err(e);
                    }
                }
            }
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Skipping malformed row");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }

        let processed = summary.seen + summary.skipped;
        if config.progress_every > 0 && processed % config.progress_every == 0 {
            info!(processed, "Processing rows");
        }
    }

    summary.elapsed = start.elapsed();
    if summary.skipped > 0 {
        warn!(skipped = summary.skipped, "Skipped malformed rows");
    }
    info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        dropped = summary.dropped,
        millis = summary.elapsed.as_millis() as u64,
        "Load complete"
    );

    Ok((ledger, summary))
}
