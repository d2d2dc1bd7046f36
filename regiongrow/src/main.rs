use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use regiongrow_grid::GridCoordinate;
use regiongrow_growth::{CycleSummary, GrowthConfig, GrowthHandle, RegionGrowthCoordinator, spawn_periodic};
use regiongrow_metrics::GrowthMetrics;
use regiongrow_storage::file::FileRegionStore;
use regiongrow_storage::memory::MemoryRegionStore;
use regiongrow_storage::postgres::PostgresRegionStore;
use regiongrow_storage::{RegionDirectory, RegionStore};
use regiongrow_world::{ChunkSource, GeneratedWorld, TiledSnapshotProvider};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StorageKind {
    File,
    Postgres,
    Memory,
}

#[derive(Parser)]
#[command(name = "regiongrow", about = "Opens new world regions as the current one runs out of resources")]
struct Args {
    /// JSON config file; missing keys use defaults
    #[arg(short, long, env = "REGIONGROW_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "file")]
    storage: StorageKind,

    /// Directory for file storage
    #[arg(long, default_value = "regions")]
    data_dir: PathBuf,

    #[arg(long, env = "DATABASE_URL", default_value = "postgres://postgres:postgres@db:5432/regiongrow")]
    database_url: String,

    /// World seed for the generated world
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Overrides the config's region size
    #[arg(long)]
    region_size: Option<i32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Keep re-evaluating the open region until Ctrl+C
    Run,
    /// Open a new region now and keep growing from it
    AddRegion,
    /// Scan one region and print the report
    #[command(allow_negative_numbers = true)]
    Rescan { x: i32, z: i32 },
    /// Show the open region, the frontier and every named region
    Status,
    /// Name an unnamed region
    #[command(allow_negative_numbers = true)]
    Name {
        x: i32,
        z: i32,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

async fn open_store(args: &Args) -> Result<Arc<dyn RegionStore>> {
    match args.storage {
        StorageKind::File => {
            log::info!("Using file storage at {}", args.data_dir.display());
            Ok(Arc::new(FileRegionStore::open(&args.data_dir).await?))
        }
        StorageKind::Memory => {
            log::warn!("Using in-memory storage; regions are lost on exit");
            Ok(Arc::new(MemoryRegionStore::new()))
        }
        StorageKind::Postgres => {
            println!("Connecting to storage at {}...", args.database_url);

            // Retry loop for DB connection
            for i in 0..30 {
                match PostgresRegionStore::new(&args.database_url).await {
                    Ok(store) => return Ok(Arc::new(store)),
                    Err(e) => {
                        eprintln!("Failed to connect to storage: {}. Retrying {}/30 in 2s...", e, i + 1);
                        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                    }
                }
            }
            anyhow::bail!("Could not connect to storage after 30 retries")
        }
    }
}

fn print_summary(handle: &GrowthHandle, summary: &CycleSummary) {
    for evaluation in &summary.evaluations {
        println!();
        for line in &evaluation.report {
            println!("{}", line);
        }
    }
    println!();

    let view = handle.view();
    for region in &summary.allocated {
        println!("Opened {:?} at {}", view.name_of(*region).unwrap_or("?"), region);
    }
    if let Some(e) = &summary.halted {
        println!("Growth stopped early: {}", e);
    }
    match summary.open_region {
        Some(open) => println!("Open region: {:?} at {}", view.name_of(open).unwrap_or("?"), open),
        None => println!("No open region"),
    }
}

fn print_status(handle: &GrowthHandle) {
    let view = handle.view();
    match view.open_region() {
        Some(open) => println!("Open region: {:?} at {}", view.name_of(open).unwrap_or("?"), open),
        None => println!("No open region"),
    }
    println!("Next region: {}", view.frontier());
    println!("{} named region(s):", view.len());
    for name in view.region_names() {
        if let Some(coordinates) = view.coordinates_of(&name) {
            println!("  {:<10} {}", name, coordinates);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GrowthConfig::load(path)?,
        None => GrowthConfig::default(),
    };
    if let Some(size) = args.region_size {
        config.region_size = size;
    }
    config.validate().context("Invalid configuration")?;

    let metrics = Arc::new(GrowthMetrics::new(config.summary()));
    let store = open_store(&args).await?;
    let directory = RegionDirectory::load(store, config.naming.clone(), Arc::clone(&metrics)).await?;

    println!("Using generated world with seed: {}", args.seed);
    let source: Arc<dyn ChunkSource> = Arc::new(GeneratedWorld::new(args.seed, config.world));
    let provider = Arc::new(TiledSnapshotProvider::new(
        source,
        config.world,
        config.capture.retry_policy(),
    ));

    let (handle, task) = RegionGrowthCoordinator::spawn(directory, provider, &config, Arc::clone(&metrics));

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let periodic = spawn_periodic(handle.clone(), config.scan_interval());
            println!(
                "Scanning the open region every {}s. Press Ctrl+C to stop",
                config.scan_interval_secs
            );
            tokio::signal::ctrl_c()
                .await
                .context("failed to install CTRL+C signal handler")?;
            periodic.abort();
        }
        Command::AddRegion => {
            let summary = handle.add_region().await?;
            print_summary(&handle, &summary);
        }
        Command::Rescan { x, z } => {
            let summary = handle.rescan(GridCoordinate::new(x, z)).await?;
            print_summary(&handle, &summary);
        }
        Command::Status => print_status(&handle),
        Command::Name { x, z, name } => {
            let coordinates = GridCoordinate::new(x, z);
            handle.name_region(coordinates, &name.join(" ")).await?;
            println!("Named region {} {:?}", coordinates, handle.view().name_of(coordinates).unwrap_or(""));
        }
    }

    handle.shutdown().await;
    task.await.context("Growth coordinator panicked")?;
    println!("\n{}", metrics.generate_report());
    Ok(())
}
