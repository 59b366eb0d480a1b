// vim: tw=80
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use cellplace_core::{
    collaborator::{LoggingStore, StandaloneMembership},
    config::Config,
    disk_ops::FileDiskOps,
    kmsg::{kmsg_events, EventStream},
    monitor::DiskHealthMonitor,
    placement::PlacementMap,
    Result,
};
use clap::{crate_version, Parser};
use tokio::{
    io::AsyncWriteExt,
    runtime::Handle,
    signal::unix::{signal, SignalKind},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone, Debug)]
#[clap(version = crate_version!())]
/// Monitor the health of this node's disks and publish the cell's disk mask
struct Cli {
    /// Configuration file
    #[clap(short, long, default_value = "/etc/cellplace.yaml")]
    config: PathBuf,
    /// Probe the disks, print their state, and exit
    #[clap(long)]
    once:   bool,
}

/// Follow a kernel message source on a thread of its own.
///
/// Reads from a character device like /dev/kmsg block indefinitely, and a
/// detached thread won't hold up the runtime's shutdown.
fn follow_kmsg(path: &Path) -> Result<EventStream> {
    let f = File::open(path)?;
    let (mut w, r) = tokio::io::duplex(1 << 16);
    let handle = Handle::current();
    thread::Builder::new()
        .name("kmsg".to_owned())
        .spawn(move || {
            for line in BufReader::new(f).lines() {
                let r = line.map(|mut l| {
                    l.push('\n');
                    l
                }).and_then(|l| handle.block_on(w.write_all(l.as_bytes())));
                if let Err(e) = r {
                    warn!("following kernel messages: {e}");
                    break;
                }
            }
        })?;
    Ok(kmsg_events(tokio::io::BufReader::new(r)))
}

async fn print_disks(monitor: &DiskHealthMonitor) {
    let mut table = tabular::Table::new("{:<}  {:<}  {:<}  {:>}");
    let mut hrow = tabular::Row::new();
    hrow.add_cell("DISK")
        .add_cell("DEVICE")
        .add_cell("STATUS")
        .add_cell("ERRORS");
    table.add_row(hrow);
    for disk in monitor.disks().await {
        let mut row = tabular::Row::new();
        row.add_cell(disk.id)
            .add_cell(disk.device.display())
            .add_cell(disk.status)
            .add_cell(disk.errors);
        table.add_row(row);
    }
    print!("{table}");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli: Cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let events = match &config.kmsg_path {
        Some(path) if !cli.once => Some(follow_kmsg(path)?),
        _ => None
    };
    let map = Arc::new(PlacementMap::new(config.map_strategy));
    let monitor = DiskHealthMonitor::new(config,
        Arc::new(FileDiskOps),
        Arc::new(LoggingStore),
        Arc::new(StandaloneMembership::default()))?;
    monitor.start(events).await?;
    let proxy = monitor.layout_proxy(map);
    let snap = proxy.snapshot();
    info!(generation = snap.generation, online = %snap.mask,
        "disk health monitor running");

    if cli.once {
        print_disks(&monitor).await;
    } else {
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r?,
            _ = sigterm.recv() => (),
        }
        info!("shutting down");
    }
    monitor.shutdown().await;
    Ok(())
}
