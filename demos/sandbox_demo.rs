//! Augmented sandbox demo
//!
//! Drives a mesh pipeline and a point cloud pipeline off one simulated depth
//! sensor. The sensor task publishes a slowly drifting dune field with
//! speckle noise and dropouts; both pipelines run on the configured tick and
//! log their diagnostics.
//!
//! Usage: cargo run --bin sandbox_demo -- [--config params.json] [--ticks 100] [--unit cm]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sandcrate_algorithms::Visualisation;
use sandcrate_core::Drawable;
use sandcrate_pipeline::{
    Geometry, LatestFrameSlot, LengthUnit, OutputKind, SandboxParameters, SandboxPipeline, SharedSensor,
};

#[derive(Parser, Debug)]
#[command(name = "sandbox_demo", about = "Run the sandbox pipeline against a simulated depth sensor")]
struct Args {
    /// JSON file with pipeline parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cycles to run before exiting
    #[arg(short, long, default_value_t = 100)]
    ticks: usize,

    /// Override the output length unit
    #[arg(short, long)]
    unit: Option<LengthUnit>,

    /// Simulated sensor width in pixels
    #[arg(long, default_value_t = 512)]
    width: usize,

    /// Simulated sensor height in pixels
    #[arg(long, default_value_t = 424)]
    height: usize,

    /// Simulated frames per second
    #[arg(long, default_value_t = 30)]
    fps: u64,

    /// Noise seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

fn load_parameters(args: &Args) -> anyhow::Result<SandboxParameters> {
    let mut params = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading parameters from {}", path.display()))?;
            SandboxParameters::from_json(&json)?
        }
        None => SandboxParameters::default(),
    };
    if let Some(unit) = args.unit {
        params.unit = unit;
    }
    Ok(params)
}

/// Depth samples of a dune field, drifting with `phase`
fn dune_field(width: usize, height: usize, phase: f32, rng: &mut StdRng) -> Vec<u16> {
    let mut samples = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            if rng.gen_bool(0.01) {
                samples.push(0);
                continue;
            }
            let fx = x as f32 / width as f32 * std::f32::consts::TAU;
            let fy = y as f32 / height as f32 * std::f32::consts::TAU;
            let dune = 60.0 * (fx * 2.0 + phase).sin() * (fy + phase * 0.5).cos();
            let noise: f32 = rng.gen_range(-4.0..4.0);
            samples.push((1000.0 + dune + noise).max(1.0) as u16);
        }
    }
    samples
}

fn describe(geometry: &Geometry<'_>) -> String {
    match geometry {
        Geometry::Empty => "no geometry".to_string(),
        Geometry::Mesh(mesh) => {
            let (min, max) = mesh.bounding_box();
            format!(
                "mesh {}x{}: {} vertices, {} faces, z {:.1}..{:.1}",
                mesh.width,
                mesh.height,
                mesh.vertex_count(),
                mesh.face_count(),
                min.z,
                max.z
            )
        }
        Geometry::PointCloud(cloud) => {
            let center = cloud.center();
            format!("point cloud: {} points, center z {:.1}", cloud.len(), center.z)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let mesh_params = load_parameters(&args)?;
    let cloud_params = SandboxParameters {
        output: OutputKind::PointCloud,
        visualisation: Visualisation::Slope {
            threshold_degrees: 35.0,
        },
        ..mesh_params.clone()
    };
    log::info!("Parameters: {}", serde_json::to_string(&mesh_params)?);

    let sensor = SharedSensor::new(LatestFrameSlot::new(args.width, args.height));
    let mut mesh_pipeline = SandboxPipeline::new(&sensor)?;
    let mut cloud_pipeline = SandboxPipeline::new(&sensor)?;

    let producer = {
        let sensor = sensor.clone();
        let (width, height, seed) = (args.width, args.height, args.seed);
        let frame_interval = Duration::from_millis(1000 / args.fps.max(1));
        tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut interval = tokio::time::interval(frame_interval);
            let mut phase = 0.0f32;
            loop {
                interval.tick().await;
                phase += 0.02;
                let samples = dune_field(width, height, phase, &mut rng);
                if let Err(e) = sensor.source().publish(samples) {
                    log::info!("Sensor producer exiting: {}", e);
                    break;
                }
            }
        })
    };

    let tick = mesh_params.schedule().interval().unwrap_or_else(|| {
        log::warn!("Manual tick schedule, stepping once per simulated frame");
        Duration::from_millis(1000 / args.fps.max(1))
    });
    let mut interval = tokio::time::interval(tick);

    for cycle in 0..args.ticks {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted after {} cycles", cycle);
                break;
            }
        }

        let solution = mesh_pipeline.solve(&mesh_params);
        log::info!("[mesh {}] {}", cycle, describe(&solution.geometry));
        for line in solution.diagnostics.lines() {
            log::debug!("[mesh {}] {}", cycle, line);
        }

        let solution = cloud_pipeline.solve(&cloud_params);
        log::info!("[cloud {}] {}", cycle, describe(&solution.geometry));
        for line in solution.diagnostics.lines() {
            log::debug!("[cloud {}] {}", cycle, line);
        }
    }

    log::info!(
        "Topology rebuilds: {}, color table rebuilds: mesh {} / cloud {}",
        mesh_pipeline.builder().rebuilds(),
        mesh_pipeline.tables().rebuilds(),
        cloud_pipeline.tables().rebuilds()
    );

    drop(mesh_pipeline);
    drop(cloud_pipeline);
    producer.await.context("sensor producer task panicked")?;
    Ok(())
}
