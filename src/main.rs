//! dualstore CLI tool
//!
//! Interactive runner: load transaction rows, then sort, search, benchmark,
//! compare and export the two stores from a numbered menu.

use anyhow::{Context, Result};
use clap::Parser;
use dualstore::{
    BenchmarkRun, ExportSelection, Ledger, LedgerConfig, OverflowPolicy, StoreKind,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dualstore")]
#[command(about = "Compare a contiguous and a linked store of transaction records")]
struct Args {
    /// Input file (prompted for when omitted)
    input: Option<PathBuf>,

    /// Maximum number of records held
    #[arg(long, env = "DUALSTORE_CAPACITY", default_value_t = 50_000)]
    capacity: usize,

    /// What to do when the input has more rows than the capacity: abort or drop
    #[arg(long = "on-overflow", default_value_t = OverflowPolicy::Abort)]
    on_overflow: OverflowPolicy,

    /// Field delimiter of the input file
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Rows shown by previews and search listings
    #[arg(long, default_value_t = 20)]
    preview: usize,
}

impl Args {
    fn config(&self) -> LedgerConfig {
        LedgerConfig {
            capacity: self.capacity,
            on_capacity_exceeded: self.on_overflow,
            delimiter: self.delimiter,
            preview_limit: self.preview,
            ..Default::default()
        }
    }
}

const MENU: &str = "
==== Dual Store ====
 1. Load transactions
 2. Preview stores
 3. Traversal benchmark
 4. Full benchmark (sort + search)
 5. Sort sequence store by location
 6. Sort chain store by location
 7. Search sequence store by type
 8. Search chain store by type
 9. Compare stores
10. Export to JSON
 0. Exit";

const EXPORT_MENU: &str = "
 1. Full dataset
 2. Sequence store sorted by location
 3. Chain store sorted by location
 4. Sequence store search by type
 5. Chain store search by type";

/// Line-oriented prompt over stdin.
struct Console<R> {
    input: R,
}

impl<R: BufRead> Console<R> {
    /// Print `label` and read one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// State carried between menu choices.
struct Session {
    config: LedgerConfig,
    ledger: Option<Ledger>,
    last_run: Option<BenchmarkRun>,
}

impl Session {
    fn load(&mut self, path: &Path) -> Result<()> {
        let (ledger, summary) = Ledger::load(self.config.clone(), path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        println!("{}", summary);

        let stats = ledger.stats();
        println!(
            "Sequence store: {} records, chain store: {} records",
            stats.sequence_len, stats.chain_len
        );
        for (channel, len) in &stats.channel_lens {
            println!("  {} chain: {} records", channel, len);
        }

        self.ledger = Some(ledger);
        self.last_run = None;
        Ok(())
    }

    fn ledger(&mut self) -> Option<&mut Ledger> {
        if self.ledger.is_none() {
            println!("No data loaded. Choose 1 first.");
        }
        self.ledger.as_mut()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut session = Session {
        config: args.config(),
        ledger: None,
        last_run: None,
    };

    if let Some(path) = &args.input {
        session.load(path)?;
    }

    let stdin = io::stdin();
    let mut console = Console {
        input: stdin.lock(),
    };

    loop {
        println!("{}", MENU);
        let choice = match console.prompt("Choice: ")? {
            Some(choice) => choice,
            None => break,
        };

        match choice.as_str() {
            "1" => {
                let Some(name) = console.prompt("Input file: ")? else {
                    break;
                };
                if let Err(e) = session.load(Path::new(&name)) {
                    println!("Error: {:#}", e);
                }
            }
            "2" => {
                if let Some(ledger) = session.ledger() {
                    for (title, lines) in ledger.previews() {
                        println!("-- {} --", title);
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                }
            }
            "3" => {
                if let Some(ledger) = session.ledger() {
                    for (title, outcome) in ledger.traversals() {
                        println!(
                            "{}: visited {} records in {}",
                            title,
                            outcome.visited,
                            outcome.measurement()
                        );
                    }
                }
            }
            "4" => {
                if let Some(ledger) = session.ledger() {
                    let run = ledger.run_benchmark();
                    println!("[ SEQUENCE ] quicksort (location): {}", run.sequence_sort);
                    println!("[ CHAIN ] merge sort (location): {}", run.chain_sort);
                    println!(
                        "[ SEQUENCE ] scan over {} types: {}",
                        run.types.len(),
                        run.sequence_search
                    );
                    println!(
                        "[ CHAIN ] scan over {} types: {}",
                        run.types.len(),
                        run.chain_search
                    );
                    session.last_run = Some(run);
                }
            }
            "5" | "6" => {
                let kind = if choice == "5" {
                    StoreKind::Sequence
                } else {
                    StoreKind::Chain
                };
                if let Some(ledger) = session.ledger() {
                    ledger.sort_by_location(kind);
                    let limit = ledger.config().preview_limit;
                    for line in ledger.store(kind).preview(limit) {
                        println!("{}", line);
                    }
                }
            }
            "7" | "8" => {
                let kind = if choice == "7" {
                    StoreKind::Sequence
                } else {
                    StoreKind::Chain
                };
                if session.ledger().is_none() {
                    continue;
                }
                let Some(query) = console.prompt("Transaction type: ")? else {
                    break;
                };
                if let Some(ledger) = session.ledger.as_mut() {
                    let limit = ledger.config().preview_limit;
                    let matches = ledger.search_by_type(kind, &query);
                    println!("Found {} {} transactions in the {} store", matches.len(), query, kind);
                    for record in matches.iter().take(limit) {
                        println!("{}", record.summary_line());
                    }
                }
            }
            "9" => {
                if let Some(ledger) = session.ledger.as_ref() {
                    match ledger.compare(session.last_run.as_ref()) {
                        Ok(report) => print!("{}", report),
                        Err(e) => println!("Error: {}", e),
                    }
                } else {
                    println!("No data loaded. Choose 1 first.");
                }
            }
            "10" => {
                if session.ledger().is_none() {
                    continue;
                }
                println!("{}", EXPORT_MENU);
                let Some(selection) = console.prompt("Export: ")? else {
                    break;
                };
                let selection = match selection.as_str() {
                    "1" => ExportSelection::Full,
                    "2" => ExportSelection::SortedByLocation(StoreKind::Sequence),
                    "3" => ExportSelection::SortedByLocation(StoreKind::Chain),
                    "4" | "5" => {
                        let store = if selection == "4" {
                            StoreKind::Sequence
                        } else {
                            StoreKind::Chain
                        };
                        let Some(query) = console.prompt("Transaction type: ")? else {
                            break;
                        };
                        ExportSelection::MatchingType { store, query }
                    }
                    other => {
                        println!("Unknown export choice {:?}", other);
                        continue;
                    }
                };
                let Some(name) = console.prompt("Output file: ")? else {
                    break;
                };
                if let Some(ledger) = session.ledger.as_mut() {
                    match ledger.export(&selection, &name) {
                        Ok(summary) => println!(
                            "Exported {} records to {}",
                            summary.count,
                            summary.path.display()
                        ),
                        Err(e) => println!("Error: {}", e),
                    }
                }
            }
            "0" => break,
            other => println!("Unknown choice {:?}", other),
        }
    }

    Ok(())
}
