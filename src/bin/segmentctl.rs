//! Interactive shell over a segment store.
//!
//! Loads configuration from (in precedence order): defaults, config file, environment
//! variables (`SEGMENTCTL_*`), and CLI flags. Then reads one command per line from
//! stdin until `quit` or end of input. Results go to stdout, errors to stderr; a failed
//! command never ends the session.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::{Config, Environment, File};
use segment_index::telemetry::noop_event_listener;
use segment_index::{SegmentStore, StoreConfig, StoreError, StoreEvent, StoreEventListener, Value};

// ---------- CLI ----------

/// Range max/min/average queries over per-segment vehicle counts.
#[derive(Parser, Debug)]
#[command(name = "segmentctl", version, about)]
pub struct Cli {
    /// Path to config file (TOML). If omitted, `segmentctl.toml` is loaded when present.
    #[arg(long, env = "SEGMENTCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of segments the store can track.
    #[arg(long, env = "SEGMENTCTL_CAPACITY")]
    pub capacity: Option<usize>,

    /// Live length at or above which the interval table is rebuilt in parallel.
    #[arg(long, env = "SEGMENTCTL_PARALLEL_REBUILD_THRESHOLD")]
    pub parallel_rebuild_threshold: Option<usize>,

    /// Do not load any config file; use defaults + env + CLI only.
    #[arg(long, default_value_t = false)]
    pub no_config: bool,

    /// Load and validate config (file + env + CLI), print the effective values, then exit.
    #[arg(long, default_value_t = false)]
    pub validate_config: bool,

    /// Log store events to stderr.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

// ---------- File/env config (all optional for partial config) ----------

#[derive(Debug, Default, serde::Deserialize)]
pub struct FileConfig {
    pub capacity: Option<usize>,
    pub parallel_rebuild_threshold: Option<usize>,
    pub verbose: Option<bool>,
}

/// Load merged config. CLI overrides file/env.
fn load_config(cli: &Cli) -> Result<(StoreConfig, bool), String> {
    let mut builder = Config::builder();

    if !cli.no_config {
        if let Some(ref path) = cli.config {
            if !path.exists() {
                return Err(format!("config file not found: {}", path.display()));
            }
            builder = builder.add_source(File::from(path.as_path()).required(true));
        } else {
            let default_path = PathBuf::from("segmentctl.toml");
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path.as_path()).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("SEGMENTCTL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .ignore_empty(true),
    );

    let merged = builder.build().map_err(|e| e.to_string())?;
    let partial: FileConfig = merged.try_deserialize().map_err(|e| e.to_string())?;

    let mut store_config = StoreConfig::default();
    if let Some(n) = partial.capacity {
        store_config.capacity = n;
    }
    if let Some(n) = partial.parallel_rebuild_threshold {
        store_config.parallel_rebuild_threshold = n;
    }
    if let Some(n) = cli.capacity {
        store_config.capacity = n;
    }
    if let Some(n) = cli.parallel_rebuild_threshold {
        store_config.parallel_rebuild_threshold = n;
    }
    if store_config.capacity == 0 {
        return Err("capacity must be a positive integer".to_string());
    }

    let verbose = cli.verbose || partial.verbose.unwrap_or(false);
    Ok((store_config, verbose))
}

// ---------- Event logging ----------

#[derive(Debug)]
struct StderrEventListener;

impl StoreEventListener for StderrEventListener {
    fn on_event(&self, event: StoreEvent) {
        match event {
            StoreEvent::IndexRebuilt {
                len,
                levels,
                parallel,
                elapsed,
            } => eprintln!(
                "[segmentctl] index rebuilt: len={} levels={} parallel={} elapsed={:?}",
                len, levels, parallel, elapsed
            ),
            other => eprintln!("[segmentctl] {:?}", other),
        }
    }
}

// ---------- Commands ----------

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
commands:
  add ID [COUNT]      track a new segment (count defaults to 0)
  remove ID           stop tracking a segment
  update ID COUNT     set the vehicle count of a segment
  get ID              print the vehicle count of a segment
  list                print all segments in position order
  max L R             maximum count over positions L..=R (1-based)
  min L R             minimum count over positions L..=R
  avg L R             average count over positions L..=R
  total               sum of counts over all segments
  ranked              segments by descending count
  find [PREFIX]       segment ids starting with PREFIX, sorted
  label ID [TEXT...]  set (or print) a segment's label
  help                this text
  quit                exit";

fn arg<'a>(args: &[&'a str], i: usize, what: &str) -> Result<&'a str, CommandError> {
    args.get(i)
        .copied()
        .ok_or_else(|| CommandError::Usage(format!("missing {}", what)))
}

fn parse_count(s: &str) -> Result<Value, CommandError> {
    s.parse::<Value>()
        .map_err(|e| CommandError::Usage(format!("invalid count {:?}: {}", s, e)))
}

fn parse_position(s: &str) -> Result<usize, CommandError> {
    s.parse::<usize>()
        .map_err(|e| CommandError::Usage(format!("invalid position {:?}: {}", s, e)))
}

fn parse_range(args: &[&str]) -> Result<(usize, usize), CommandError> {
    Ok((
        parse_position(arg(args, 1, "L")?)?,
        parse_position(arg(args, 2, "R")?)?,
    ))
}

fn execute(store: &mut SegmentStore, line: &str, out: &mut impl Write) -> Result<Flow, CommandError> {
    let args: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = args.first() else {
        return Ok(Flow::Continue);
    };

    match cmd {
        "add" => {
            let id = arg(&args, 1, "ID")?;
            let count = match args.get(2) {
                Some(s) => parse_count(s)?,
                None => 0,
            };
            let pos = store.add_entry(id, count)?;
            writeln!(out, "added {} at position {}", id, pos)?;
        }
        "remove" => {
            let id = arg(&args, 1, "ID")?;
            let was = store.remove_entry(id)?;
            writeln!(out, "removed {} (was {})", id, was)?;
        }
        "update" => {
            let id = arg(&args, 1, "ID")?;
            let count = parse_count(arg(&args, 2, "COUNT")?)?;
            let old = store.update_value(id, count)?;
            writeln!(out, "updated {}: {} -> {}", id, old, count)?;
        }
        "get" => {
            let id = arg(&args, 1, "ID")?;
            writeln!(out, "{}", store.get_value(id)?)?;
        }
        "list" => {
            if store.is_empty() {
                writeln!(out, "(empty)")?;
            }
            for (pos, (id, value)) in store.entries().enumerate() {
                writeln!(out, "{} {} {}", pos + 1, id, value)?;
            }
        }
        "max" => {
            let (l, r) = parse_range(&args)?;
            writeln!(out, "{}", store.query_max(l, r)?)?;
        }
        "min" => {
            let (l, r) = parse_range(&args)?;
            writeln!(out, "{}", store.query_min(l, r)?)?;
        }
        "avg" => {
            let (l, r) = parse_range(&args)?;
            writeln!(out, "{:.2}", store.query_average(l, r)?)?;
        }
        "total" => {
            writeln!(out, "{}", store.query_total())?;
        }
        "ranked" => {
            for (id, value) in store.ranked_view() {
                writeln!(out, "{} {}", id, value)?;
            }
        }
        "find" => {
            let prefix = args.get(1).copied().unwrap_or("");
            for id in store.ids_with_prefix(prefix) {
                writeln!(out, "{}", id)?;
            }
        }
        "label" => {
            let id = arg(&args, 1, "ID")?;
            if args.len() > 2 {
                store.set_label(id, args[2..].join(" "))?;
                writeln!(out, "ok")?;
            } else {
                writeln!(out, "{}", store.label(id)?.unwrap_or("(none)"))?;
            }
        }
        "help" => writeln!(out, "{}", HELP)?,
        "quit" | "exit" => return Ok(Flow::Quit),
        other => {
            return Err(CommandError::Usage(format!(
                "unknown command {:?} (try `help`)",
                other
            )))
        }
    }
    Ok(Flow::Continue)
}

// ---------- Main ----------

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let (mut store_config, verbose) = load_config(&cli).map_err(|e| {
        eprintln!("config error: {}", e);
        e
    })?;

    if cli.validate_config {
        println!("capacity={}", store_config.capacity);
        println!(
            "parallel_rebuild_threshold={}",
            store_config.parallel_rebuild_threshold
        );
        println!("verbose={}", verbose);
        return Ok(());
    }

    store_config.event_listener = if verbose {
        Arc::new(StderrEventListener)
    } else {
        noop_event_listener()
    };
    let mut store = SegmentStore::with_config(store_config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        match execute(&mut store, &line, &mut out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("error: {}", e),
        }
        out.flush()?;
    }
    Ok(())
}
