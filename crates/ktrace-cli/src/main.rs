/// ktrace command-line tool: capture and inspect kernel trace streams.
///
/// # Command overview
///
/// ```text
/// ktrace <COMMAND> [OPTIONS]
///
/// Commands:
///   listen     Decode a live stream (or capture) and print records as JSON
///   inspect    Print a human-readable listing of a capture file
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Debug-level logging for the ktrace crates
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                      |
/// |------|----------------------------------------------|
/// | 0    | Success                                      |
/// | 1    | Error (I/O failure, malformed stream, etc.)  |
///
/// Records go to stdout; logs, debug messages and errors go to stderr so
/// stdout can be piped cleanly. `RUST_LOG` overrides the log filter.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cmd_inspect;
mod cmd_listen;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Decoder for the kernel's binary trace stream.
#[derive(Parser)]
#[command(name = "ktrace", version, about = "Kernel trace stream decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging for the decoder and ingestion loop.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Decode a trace stream and print each record as JSON.
    Listen(ListenArgs),
    /// Print one line per record of a capture file, plus totals.
    Inspect(InspectArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `ktrace listen`.
///
/// Runs the ingestion loop over a capture file or stdin until the kernel
/// halts, the record ceiling is passed, the input closes, or Ctrl-C.
///
/// ```text
/// ┌───────────────────┬─────────────────────────────────────────────────┐
/// │ Flag              │ Effect                                          │
/// ├───────────────────┼─────────────────────────────────────────────────┤
/// │ -m / --max N      │ stop after more than N records (default 256)    │
/// │ --poll-ms MS      │ idle sleep between decode attempts (100)        │
/// │ --max-text N      │ reject text tails longer than N bytes (no cap)  │
/// │ --read-timeout-ms │ per-read transport timeout (1000)               │
/// └───────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct ListenArgs {
    /// Capture file to replay, or `-` to read stdin.
    pub input: PathBuf,

    /// Record ceiling; the session ends once it is exceeded.
    #[arg(short, long, default_value_t = 256)]
    pub max: usize,

    /// Milliseconds to sleep while less than a frame is buffered.
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Longest text tail accepted before the stream is rejected.
    #[arg(long)]
    pub max_text: Option<usize>,

    /// Milliseconds a single transport read may block.
    #[arg(long, default_value_t = 1000)]
    pub read_timeout_ms: u64,
}

/// Arguments for `ktrace inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Capture file: negotiation byte followed by record frames.
    pub file: PathBuf,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Listen(args) => cmd_listen::run(&args),
        Commands::Inspect(args) => cmd_inspect::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,ktrace_decoder=debug,ktrace_ingest=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
