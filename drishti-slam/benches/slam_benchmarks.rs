//! Focused SLAM Benchmarks
//!
//! Benchmarks for the CPU-heavy pipeline operations:
//! - ICP registration (nearest-neighbor and feature-id correspondences)
//! - Pose graph optimization over a closed ring of keyframes
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::f64::consts::TAU;
use std::time::Duration;

use drishti_slam::config::{IcpConfig, OptimizerConfig, PoseGraphConfig};
use drishti_slam::{Correspondences, Icp, PointCloud2D, PoseGraph, Pose2D, ScanPoint};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Create a room-shaped point cloud (L-shaped room), each point tagged with
/// its index.
fn create_room_cloud(n_points: usize) -> PointCloud2D {
    (0..n_points)
        .map(|i| {
            let angle = (i as f64 / n_points as f64) * TAU;
            let (sin_a, cos_a) = angle.sin_cos();

            let distance = if cos_a > 0.0 && sin_a > 0.0 {
                (3.0 / cos_a).min(4.0 / sin_a)
            } else if cos_a < 0.0 && sin_a > 0.0 {
                (-2.0 / cos_a).min(4.0 / sin_a)
            } else if cos_a < 0.0 && sin_a < 0.0 {
                (-2.0 / cos_a).min(-2.0 / sin_a)
            } else {
                (3.0 / cos_a).min(-2.0 / sin_a)
            };

            let distance = distance.clamp(0.5, 8.0);
            ScanPoint::tagged(distance * cos_a, distance * sin_a, i as u64)
        })
        .collect()
}

/// Ring of `n` keyframes on a circle with drifted initial poses and one
/// loop-closure edge.
fn create_ring_graph(n: usize) -> PoseGraph {
    let mut graph = PoseGraph::new(PoseGraphConfig::default(), OptimizerConfig::default());
    let step_angle = TAU / n as f64;
    let step = Pose2D::new(2.0 * (step_angle / 2.0).sin(), 0.0, step_angle);

    let mut pose = Pose2D::identity();
    for id in 0..n as u64 {
        let drift = 0.01 * id as f64;
        graph
            .add_vertex(id, pose.x + drift, pose.y - drift, pose.theta + 0.1 * drift)
            .unwrap();
        if id > 0 {
            graph
                .add_factor_edge(id - 1, id, step.x, step.y, step.theta, None)
                .unwrap();
        }
        pose = pose.compose(&step);
    }
    graph
        .add_loop_closure_edge(n as u64 - 1, 0, step.x, step.y, step.theta, None)
        .unwrap();
    graph
}

// ============================================================================
// Registration Benchmarks
// ============================================================================

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));
    group.warm_up_time(Duration::from_secs(1));

    let source = create_room_cloud(360);
    let target = source.transform(&Pose2D::new(0.05, 0.03, 0.02)); // Small offset
    let icp = Icp::new(IcpConfig::default());

    group.bench_function("icp/nearest_neighbor", |b| {
        b.iter(|| {
            icp.find_transform(
                black_box(&source),
                black_box(&target),
                Correspondences::NearestNeighbor,
            )
        })
    });

    group.bench_function("icp/feature_id", |b| {
        b.iter(|| {
            icp.find_transform(
                black_box(&source),
                black_box(&target),
                Correspondences::FeatureId,
            )
        })
    });

    // Large rotation: the seeded run fails and the coarse search takes over
    let rotated = source.transform(&Pose2D::new(0.5, -0.3, 2.0));
    group.bench_function("icp/coarse_search", |b| {
        b.iter(|| {
            icp.find_transform(
                black_box(&source),
                black_box(&rotated),
                Correspondences::NearestNeighbor,
            )
        })
    });

    group.finish();
}

// ============================================================================
// Pose Graph Benchmarks
// ============================================================================

fn bench_pose_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_graph");
    group.sample_size(20);

    for n in [20, 100] {
        group.bench_function(format!("optimize/ring_{n}"), |b| {
            b.iter_batched(
                || create_ring_graph(n),
                |mut graph| graph.optimize(),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_registration, bench_pose_graph);

criterion_main!(benches);
