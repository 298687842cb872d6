//! ChainRelay CLI: drive the relay pipeline from the command line.
//!
//! # Commands
//! ```
//! chainrelay replay  --config <path.json> --events <path.json>
//! chainrelay decode  --abi <path.json> --account <name> --trx <hex>
//! chainrelay info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd_decode;
mod cmd_replay;

#[derive(Parser)]
#[command(
    name = "chainrelay",
    about = "Relay chain events to a remote sink: ChainRelay CLI",
    long_about = "
ChainRelay CLI: replay a captured event log through the full relay
pipeline, or decode a single packed transaction against an ABI offline.

ENVIRONMENT VARIABLES:
  RUST_LOG    Log filter for replay runs (overrides --verbose)
",
    version
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured event log through the relay pipeline
    Replay {
        /// Relay configuration file (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<String>,
        /// Captured events file (JSON array)
        #[arg(short, long)]
        events: String,
    },

    /// Decode a packed transaction against an ABI, offline
    Decode {
        /// Path to the ABI definition (JSON)
        #[arg(long)]
        abi: String,
        /// Account the ABI belongs to
        #[arg(long)]
        account: String,
        /// Packed transaction bytes (hex)
        #[arg(long)]
        trx: String,
    },

    /// Show version and capability summary
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay { config, events } => cmd_replay::run(config.as_deref(), &events),

        Commands::Decode { abi, account, trx } => cmd_decode::run(&abi, &account, &trx),

        Commands::Info => cmd_info(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ─── Command implementations ─────────────────────────────────────────────────

fn cmd_info() -> Result<()> {
    println!("ChainRelay v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Capabilities:");
    println!("  ✓ Bounded event queues      (adaptive producer throttling)");
    println!("  ✓ Single consumer thread    (fixed drain order, drains fully on shutdown)");
    println!("  ✓ Action payload decoding   (ABI-driven, deadline-bounded)");
    println!("  ✓ LRU ABI cache             (seeded from disk at startup)");
    println!("  ✓ JSON-RPC sink adapter     (reqwest + rustls)");
    println!();
    println!("Event sources:               accepted transactions, applied traces,");
    println!("                             accepted blocks, irreversible blocks");
    println!("Seeded contract ABIs:        eosio.token, eosio");
    println!();
    println!("Sink methods:");
    println!("  relay_sendAction       handshake and ad-hoc notifications");
    println!("  relay_sendTransfer     decoded token transfers");
    println!("  relay_sendTransaction  single decoded transactions");
    println!("  relay_sendBlock        one call per irreversible block");
    Ok(())
}
