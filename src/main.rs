use arpctl::cache::{CacheChannel, CacheFlags, CacheOp, CacheRecord, TableReader};
use arpctl::config::{self, Config};
use arpctl::telemetry::init_logging;
use arpctl::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "arpctl")]
#[command(about = "Inspect and mutate the kernel IPv4 ARP cache")]
struct Cli {
    /// Display all entries in the ARP cache
    #[arg(short = 'a', long)]
    all: bool,

    /// Enable verbose diagnostics
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Interface that owns the entry (overrides the configured default)
    #[arg(short = 'i', long, value_name = "DEV")]
    interface: Option<String>,

    /// Look up the entry for this IPv4 address
    #[arg(short = 'g', long, value_name = "IP")]
    get: Option<String>,

    /// Remove the entry for this IPv4 address
    #[arg(short = 'd', long, value_name = "IP")]
    delete: Option<String>,

    /// Add a permanent entry
    #[arg(short = 's', long, num_args = 2, value_names = ["IP", "MAC"])]
    set: Option<Vec<String>>,

    /// Settings file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log, cli.verbose);

    match run(&cli, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs the requested operations in fixed order: list, get, set, delete.
/// Returns false when any single operation failed; a failure never stops
/// the remaining operations.
fn run(cli: &Cli, config: &Config) -> Result<bool> {
    let device = cli.interface.as_deref().unwrap_or(&config.interface);
    debug!(%device, "using interface");

    let mut ok = true;

    if cli.all {
        let reader = TableReader::new();
        for line in reader.display_all()? {
            println!("{}", line?);
        }
    }

    // Control operations share one channel, opened before the first use
    // and closed once on drop.
    let channel = if cli.get.is_some() || cli.set.is_some() || cli.delete.is_some() {
        Some(CacheChannel::open()?)
    } else {
        None
    };

    if let (Some(ip), Some(channel)) = (&cli.get, &channel) {
        ok &= get_entry(channel, ip, device);
    }
    if let (Some(args), Some(channel)) = (&cli.set, &channel) {
        ok &= set_entry(channel, &args[0], &args[1], device);
    }
    if let (Some(ip), Some(channel)) = (&cli.delete, &channel) {
        ok &= delete_entry(channel, ip, device);
    }

    Ok(ok)
}

/// Query one entry. An unresolved entry prints "incomplete"; that is a
/// valid outcome, not an error.
fn get_entry(channel: &CacheChannel, ip: &str, device: &str) -> bool {
    let record = match CacheRecord::query(ip, device) {
        Ok(record) => record,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    match channel.submit(CacheOp::Get, &record) {
        Ok(reply) if reply.flags.contains(CacheFlags::COMPLETE) => {
            println!("MAC: {}", reply.mac);
            true
        }
        Ok(_) => {
            println!("MAC: incomplete");
            true
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn set_entry(channel: &CacheChannel, ip: &str, mac: &str, device: &str) -> bool {
    match CacheRecord::insert(ip, device, mac).and_then(|r| channel.submit(CacheOp::Set, &r)) {
        Ok(_) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn delete_entry(channel: &CacheChannel, ip: &str, device: &str) -> bool {
    match CacheRecord::delete(ip, device).and_then(|r| channel.submit(CacheOp::Delete, &r)) {
        Ok(_) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}
