use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use bytebits::config::WidgetConfig;
use bytebits::render::{self, DisplayMode, RowView};
use bytebits::{Session, ValueSyncEngine};

mod host;
mod script;

use host::TerminalHost;

/// bytebits CLI — show bytes as bit rows and keep them in sync with a URL fragment
#[derive(Parser)]
#[command(name = "bytebits", version)]
struct Cli {
    /// TOML widget config (rows, values, show_bits)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Number of rows (overrides the config)
    #[arg(short, long, global = true)]
    rows: Option<usize>,

    /// Suppress progress output on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a fragment and print every row
    Show {
        /// Fragment such as "5,200" (a leading '#' is accepted)
        fragment: Option<String>,
        /// Print the 0/1 text inside each box
        #[arg(long)]
        bits: bool,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Set one row from raw input and print the new fragment
    Set {
        row: usize,
        /// Raw input; clamped to 0-255, unparseable text becomes 0
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Starting fragment
        #[arg(short, long)]
        fragment: Option<String>,
    },
    /// Flip one bit (0 = MSB) of a row and print the new fragment
    Toggle {
        row: usize,
        bit: usize,
        /// Starting fragment
        #[arg(short, long)]
        fragment: Option<String>,
    },
    /// Replay an event script (stdin when no file is given)
    Replay {
        script: Option<String>,
        /// Starting fragment
        #[arg(short, long)]
        fragment: Option<String>,
    },
}

#[derive(Serialize)]
struct OutputState {
    fragment: String,
    mode: DisplayMode,
    rows: Vec<OutputRow>,
}

#[derive(Serialize)]
struct OutputRow {
    index: usize,
    value: u8,
    binary: String,
    bits: Vec<u8>,
}

fn output_row(row: &RowView) -> OutputRow {
    OutputRow {
        index: row.index,
        value: row.value,
        binary: row.bits.to_string(),
        bits: row.bits.iter().map(u8::from).collect(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = build_engine(&cli)?;

    match cli.command {
        Command::Show {
            fragment,
            bits,
            json,
            pretty,
        } => cmd_show(engine, fragment.as_deref(), bits, json, pretty),
        Command::Set {
            row,
            value,
            fragment,
        } => {
            let mut engine = with_fragment(engine, fragment.as_deref());
            check_row(&engine, row)?;
            if !engine.set_value(row, value.as_str()) && !cli.quiet {
                eprintln!("row {row} already holds {}", engine.value(row).unwrap_or(0));
            }
            println!("{}", engine.serialize_to_fragment());
            Ok(())
        }
        Command::Toggle {
            row,
            bit,
            fragment,
        } => {
            let mut engine = with_fragment(engine, fragment.as_deref());
            check_row(&engine, row)?;
            anyhow::ensure!(bit < 8, "bit {} out of range (0-7)", bit);
            engine.toggle_bit(row, bit);
            println!("{}", engine.serialize_to_fragment());
            Ok(())
        }
        Command::Replay { script, fragment } => {
            cmd_replay(engine, script.as_deref(), fragment.as_deref(), cli.quiet)
        }
    }
}

/// Engine from `--config` and `--rows`, falling back to the defaults.
fn build_engine(cli: &Cli) -> Result<ValueSyncEngine> {
    let config = match &cli.config {
        Some(path) => {
            let toml_str =
                std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            let config =
                WidgetConfig::from_toml(&toml_str).with_context(|| format!("parsing {path}"))?;
            debug!(path = path.as_str(), rows = config.rows, "loaded widget config");
            config
        }
        None => WidgetConfig::default(),
    };
    engine_from_config(config, cli.rows)
}

/// Apply a `--rows` override; values past the new last row are dropped.
fn engine_from_config(mut config: WidgetConfig, rows: Option<usize>) -> Result<ValueSyncEngine> {
    if let Some(rows) = rows {
        config.rows = rows;
        config.values.truncate(rows);
    }
    Ok(config.into_engine()?)
}

fn with_fragment(mut engine: ValueSyncEngine, fragment: Option<&str>) -> ValueSyncEngine {
    if let Some(f) = fragment {
        engine.load_from_fragment(f);
    }
    engine
}

fn check_row(engine: &ValueSyncEngine, row: usize) -> Result<()> {
    anyhow::ensure!(
        row < engine.len(),
        "row {} out of range (widget has {} rows)",
        row,
        engine.len()
    );
    Ok(())
}

fn cmd_show(
    engine: ValueSyncEngine,
    fragment: Option<&str>,
    bits: bool,
    json: bool,
    pretty: bool,
) -> Result<()> {
    let mut engine = with_fragment(engine, fragment);
    if bits {
        engine.set_display_mode(DisplayMode::Bits);
    }
    if json {
        println!("{}", state_json(&engine, pretty)?);
    } else {
        for row in &engine.row_views() {
            println!("{}", render::render_row_text(row));
        }
        println!("#{}", engine.serialize_to_fragment());
    }
    Ok(())
}

fn output_state(engine: &ValueSyncEngine) -> OutputState {
    OutputState {
        fragment: engine.serialize_to_fragment(),
        mode: engine.display_mode(),
        rows: engine.row_views().iter().map(output_row).collect(),
    }
}

fn state_json(engine: &ValueSyncEngine, pretty: bool) -> Result<String> {
    let state = output_state(engine);
    Ok(if pretty {
        serde_json::to_string_pretty(&state)?
    } else {
        serde_json::to_string(&state)?
    })
}

fn cmd_replay(
    engine: ValueSyncEngine,
    script_path: Option<&str>,
    fragment: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let src = match script_path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading script from stdin")?;
            buf
        }
    };
    let events = script::parse_script(&src)?;
    debug!(events = events.len(), "parsed replay script");

    let initial = engine.serialize_to_fragment();
    let host = TerminalHost::new(io::stdout().lock(), &initial);
    let mut session = Session::new(engine, host);

    let mut handled = session.start(fragment)?;
    for event in events {
        handled += session.dispatch(event)?;
    }
    info!(handled, fragment = session.host().fragment(), "replay finished");

    if !quiet {
        eprintln!(
            "replayed {handled} events, final fragment #{}",
            session.host().fragment()
        );
    }
    Ok(())
}
