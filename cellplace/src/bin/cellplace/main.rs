// vim: tw=80
use std::{path::PathBuf, sync::Arc};

use cellplace_core::{
    config::Config,
    layout::LayoutComputer,
    mask::DiskMask,
    placement::{MapStrategy, PlacementMap},
    Result,
    Topology,
};
use clap::{crate_version, Parser};
use tracing_subscriber::EnvFilter;

/// Topology and map strategy, from a config file or the defaults
fn load(config: Option<&PathBuf>, strategy: Option<MapStrategy>)
    -> Result<(Topology, MapStrategy)>
{
    let config = match config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok((config.topology(), strategy.unwrap_or(config.map_strategy)))
}

#[derive(Parser, Clone, Debug)]
/// Print one map of the placement table
struct Map {
    /// Placement table generator
    #[clap(short, long)]
    strategy: Option<MapStrategy>,
    #[clap(required(true))]
    map_ids:  Vec<u32>,
}

impl Map {
    async fn main(self) -> Result<()> {
        let map = PlacementMap::new(self.strategy.unwrap_or_default());
        for map_id in self.map_ids {
            print!("{}", map.dump(map_id)?);
        }
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Compute the disks that hold each fragment of some maps
struct Layout {
    /// Configuration file supplying the cell's topology
    #[clap(short, long)]
    config:   Option<PathBuf>,
    /// Placement table generator.  Overrides the configuration file.
    #[clap(short, long)]
    strategy: Option<MapStrategy>,
    /// Online disks, as space-separated node:disk tokens.  Defaults to
    /// every disk of the cell.
    #[clap(short, long)]
    mask:     Option<String>,
    /// Disks to take offline, as node:disk tokens, comma delimited
    #[clap(short, long, value_delimiter(','))]
    offline:  Vec<String>,
    #[clap(required(true))]
    map_ids:  Vec<u32>,
}

impl Layout {
    async fn main(self) -> Result<()> {
        let (topology, strategy) = load(self.config.as_ref(), self.strategy)?;
        let mut mask = match &self.mask {
            Some(s) => DiskMask::parse(topology, s)?,
            None => DiskMask::full(topology),
        };
        let offline = DiskMask::parse(topology, &self.offline.join(" "))?;
        mask.and_not(&offline);
        let lc = LayoutComputer::new(Arc::new(PlacementMap::new(strategy)));

        let mut table = tabular::Table::new("{:>}  {:>}  {:<}");
        let mut hrow = tabular::Row::new();
        hrow.add_cell("MAP")
            .add_cell("FRAG")
            .add_cell("DISK");
        table.add_row(hrow);
        for map_id in self.map_ids {
            let layout = lc.compute_layout(map_id, &mask)?;
            for (frag, slot) in layout.slots.iter().enumerate() {
                let disk = match slot {
                    Some(d) => d.to_string(),
                    None => "-".to_string()
                };
                let mut row = tabular::Row::new();
                row.add_cell(map_id)
                    .add_cell(frag)
                    .add_cell(disk);
                table.add_row(row);
            }
        }
        print!("{table}");
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Parse a disk mask and summarize it
struct Mask {
    /// Configuration file supplying the cell's topology
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Online disks, as space-separated node:disk tokens
    mask:   String,
}

impl Mask {
    async fn main(self) -> Result<()> {
        let (topology, _) = load(self.config.as_ref(), None)?;
        let mask = DiskMask::parse(topology, &self.mask)?;
        let mut table = tabular::Table::new("{:<}  {:>}");
        table.add_row(tabular::Row::new()
            .with_cell("online")
            .with_cell(mask.online_count()));
        table.add_row(tabular::Row::new()
            .with_cell("offline")
            .with_cell(mask.len() - mask.online_count()));
        table.add_row(tabular::Row::new()
            .with_cell("8-node")
            .with_cell(mask.is_8_node_configuration()));
        print!("{table}");
        println!("{mask}");
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Validate a configuration file and list its disks
struct CheckConfig {
    config: PathBuf,
}

impl CheckConfig {
    async fn main(self) -> Result<()> {
        let config = Config::load(&self.config)?;
        let mut table = tabular::Table::new("{:<}  {:<}");
        let mut hrow = tabular::Row::new();
        hrow.add_cell("DISK").add_cell("DEVICE");
        table.add_row(hrow);
        for disk in config.disks() {
            let mut row = tabular::Row::new();
            row.add_cell(disk.id)
                .add_cell(disk.device.display());
            table.add_row(row);
        }
        print!("{table}");
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
enum SubCommand {
    CheckConfig(CheckConfig),
    Layout(Layout),
    Map(Map),
    Mask(Mask),
}

#[derive(Parser, Clone, Debug)]
#[clap(version = crate_version!())]
/// Inspect cellplace placement maps, layouts, and disk masks
struct Cli {
    #[clap(subcommand)]
    cmd: SubCommand,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli: Cli = Cli::parse();
    match cli.cmd {
        SubCommand::CheckConfig(check) => check.main().await,
        SubCommand::Layout(layout) => layout.main().await,
        SubCommand::Map(map) => map.main().await,
        SubCommand::Mask(mask) => mask.main().await,
    }
}
