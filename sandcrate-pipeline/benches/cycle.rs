//! Benchmarks of one full pipeline cycle on a Kinect-sized frame

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sandcrate_pipeline::{LatestFrameSlot, OutputKind, SandboxParameters, SandboxPipeline, SharedSensor};

const WIDTH: usize = 512;
const HEIGHT: usize = 424;
const BLUR_RADII: [i64; 3] = [1, 2, 4];

fn sand_surface() -> Vec<u16> {
    let mut samples = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let fx = x as f32 / WIDTH as f32 * std::f32::consts::TAU;
            let fy = y as f32 / HEIGHT as f32 * std::f32::consts::TAU;
            let depth = 1000.0 + 80.0 * fx.sin() * fy.cos();
            samples.push(depth as u16);
        }
    }
    samples
}

fn pipeline_cycle(c: &mut Criterion) {
    let sensor = SharedSensor::new(LatestFrameSlot::new(WIDTH, HEIGHT));
    let session = sensor.acquire().unwrap();
    sensor.source().publish(sand_surface()).unwrap();

    let mut g = c.benchmark_group("pipeline cycle");
    g.sample_size(20);

    for output in [OutputKind::Mesh, OutputKind::PointCloud] {
        for radius in BLUR_RADII {
            let params = SandboxParameters {
                output,
                blur_radius: radius,
                average_frame_count: 3,
                ..Default::default()
            };
            let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
            let id = BenchmarkId::new(format!("{:?}", output), radius);
            g.bench_with_input(id, &params, |b, params| {
                b.iter(|| {
                    let solution = pipeline.solve(black_box(params));
                    black_box(solution.geometry.is_empty());
                });
            });
        }
    }

    g.finish();
    session.release();
}

criterion_group!(benches, pipeline_cycle);
criterion_main!(benches);
