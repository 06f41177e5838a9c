//! deepvein - destructible marching-cubes voxel terrain
//!
//! Command-line driver: generates a chunk, runs a seeded dig script and reports the result.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{DeepveinConfig, DEFAULT_CONFIG_PATH};
use deepvein_chunk::{DigOutcome, TerrainChunk};
use deepvein_core::{merge_tally, MaterialTally};
use deepvein_testkit::{
    ClusterMetrics, DigEventRecord, DigMetrics, JsonlSink, MeshMetrics, MetricsReportBuilder,
    MetricsSink, TerrainMetrics, TestExecutionMetrics, TestResult,
};
use deepvein_world::analyze_ore_clusters;
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Destructible voxel terrain driver", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a chunk, dig into it and report what changed (default)
    Run(RunArgs),
    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Destination path
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Override the terrain seed
    #[arg(long)]
    seed: Option<u32>,

    /// Number of scripted strikes
    #[arg(long, default_value_t = 8)]
    digs: usize,

    /// Seed for choosing strike positions
    #[arg(long, default_value_t = 0)]
    dig_seed: u64,

    /// Override the tool tier
    #[arg(long)]
    tier: Option<u32>,

    /// Override the strike radius (grid steps)
    #[arg(long)]
    radius: Option<f32>,

    /// Override the strike strength
    #[arg(long)]
    strength: Option<f32>,

    /// Write a JSON metrics report here
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Write one JSON line per strike here
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting deepvein v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = DeepveinConfig::load_from_path(&cli.config);

    match cli.command {
        Some(Command::InitConfig { output }) => {
            config
                .save_to_path(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("Wrote configuration to {}", output.display());
            Ok(())
        }
        Some(Command::Run(args)) => run(config, args),
        None => run(
            config,
            RunArgs {
                digs: 8,
                ..Default::default()
            },
        ),
    }
}

fn run(mut config: DeepveinConfig, args: RunArgs) -> Result<()> {
    let started = Instant::now();
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }
    if let Some(tier) = args.tier {
        config.tool.tier = tier;
    }
    if let Some(radius) = args.radius {
        config.tool.radius = radius;
    }
    if let Some(strength) = args.strength {
        config.tool.strength = strength;
    }

    let mut chunk = config.build_chunk().context("invalid configuration")?;

    let gen_start = Instant::now();
    let params = chunk.params().clone();
    let stats = chunk
        .initialize_terrain(params)
        .context("generating terrain")?;
    let terrain = TerrainMetrics {
        chunks_generated: 1,
        samples_generated: chunk.grid().map_or(0, |grid| grid.sample_count()),
        solid_samples: stats.solid_cells,
        ore_samples: stats.ore_cells,
        min_surface: stats.min_surface,
        max_surface: stats.max_surface,
        total_gen_time_ms: gen_start.elapsed().as_secs_f64() * 1000.0,
    };
    info!(
        seed = config.terrain.seed,
        solid = stats.solid_cells,
        ore = stats.ore_cells,
        "terrain ready"
    );

    let markers = chunk.spawn_ore_markers();
    info!(markers, "ore markers placed");

    let mut meshing = MeshMetrics::default();
    let mesh_start = Instant::now();
    chunk.regenerate_mesh();
    let mut mesh_time_us = mesh_start.elapsed().as_secs_f64() * 1e6;
    meshing.meshes_built += 1;

    let mut events = args
        .events
        .as_deref()
        .map(JsonlSink::create)
        .transpose()
        .context("opening event log")?;

    let mut rng = StdRng::seed_from_u64(args.dig_seed);
    let mut digging = DigMetrics::default();
    let mut detached = 0;
    for step in 0..args.digs {
        let hit = pick_strike(&chunk, &mut rng);
        let dig_start = Instant::now();
        let outcome = config.tool.strike(&mut chunk, hit);
        digging.digs += 1;
        match &outcome {
            DigOutcome::Dug { removed } => {
                merge_tally(&mut digging.removed, removed);
                mesh_time_us += dig_start.elapsed().as_secs_f64() * 1e6;
                meshing.meshes_built += 1;
            }
            DigOutcome::Blocked { layer, required_tier } => {
                digging.blocked += 1;
                warn!(step, layer = %layer, required_tier, "strike blocked");
            }
        }

        let lost = chunk.take_detached_markers();
        for marker in &lost {
            info!(material = %marker.material, position = %marker.position, "ore marker detached");
        }
        detached += lost.len();

        if let Some(sink) = events.as_mut() {
            let empty = MaterialTally::new();
            let removed = match &outcome {
                DigOutcome::Dug { removed } => removed,
                DigOutcome::Blocked { .. } => &empty,
            };
            sink.write(&DigEventRecord {
                step,
                position: hit.to_array(),
                outcome: outcome.label(),
                removed,
            })?;
        }
    }

    if let Some(mesh) = chunk.mesh() {
        meshing.triangles = mesh.triangle_count();
        meshing.vertices = mesh.vertex_count();
        meshing.mesh_hash = Some(mesh.hash().to_hex());
        info!(
            triangles = meshing.triangles,
            vertices = meshing.vertices,
            hash = %mesh.hash(),
            "final mesh"
        );
    }
    meshing.avg_mesh_time_us = mesh_time_us / meshing.meshes_built.max(1) as f64;

    let clusters = match chunk.grid() {
        Some(grid) => {
            let report = analyze_ore_clusters(grid);
            ClusterMetrics {
                floating_clusters: report.floating.len(),
                grounded_clusters: report.grounded.len(),
                floating_ore_samples: report.floating.iter().map(|c| c.len()).sum(),
                detached_markers: detached,
            }
        }
        None => ClusterMetrics::default(),
    };
    info!(
        digs = digging.digs,
        blocked = digging.blocked,
        removed = digging.removed_total(),
        floating = clusters.floating_clusters,
        grounded = clusters.grounded_clusters,
        detached,
        "dig script finished"
    );

    if let Some(path) = args.metrics.as_deref() {
        write_metrics(path, terrain, meshing, digging, clusters, started)?;
    }
    Ok(())
}

/// Pick a strike point on or just under the surface of a random column.
fn pick_strike(chunk: &TerrainChunk, rng: &mut StdRng) -> Vec3 {
    let Some(grid) = chunk.grid() else {
        return chunk.transform().origin;
    };
    let x = rng.gen_range(0..=grid.width());
    let z = rng.gen_range(0..=grid.width());
    let surface = grid.surface_height(x, z).unwrap_or(grid.height() as f32);
    let depth: f32 = rng.gen_range(0.0..3.0);
    chunk
        .transform()
        .local_to_world(Vec3::new(x as f32, (surface - depth).max(0.0), z as f32))
}

fn write_metrics(
    path: &Path,
    terrain: TerrainMetrics,
    meshing: MeshMetrics,
    digging: DigMetrics,
    clusters: ClusterMetrics,
    started: Instant,
) -> Result<()> {
    let report = MetricsReportBuilder::new("deepvein-run")
        .result(TestResult::Pass)
        .terrain(terrain)
        .meshing(meshing)
        .digging(digging)
        .clusters(clusters)
        .execution(TestExecutionMetrics {
            duration_seconds: started.elapsed().as_secs_f64(),
            assertions_checked: None,
        })
        .build();
    MetricsSink::create(path)?.write(&report)?;
    info!("Metrics written to {}", path.display());
    Ok(())
}
