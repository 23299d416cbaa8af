use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use edgeflow::config::EngineConfig;
use edgeflow::engine::{EdgeRef, FrameInput, LabelCache, NodeRect, RoutingMode, route_frame};
use std::hint::black_box;

/// Grid of nodes with chained edges plus long-range extras, roughly the
/// shape of a busy canvas document.
fn grid_graph(cols: usize, rows: usize, extra_edges: usize) -> (Vec<NodeRect>, Vec<EdgeRef>) {
    let mut nodes = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            nodes.push(NodeRect::new(
                format!("n{}_{}", col, row),
                col as f32 * 220.0,
                row as f32 * 140.0,
                120.0,
                60.0,
            ));
        }
    }

    let mut edges = Vec::new();
    for row in 0..rows {
        for col in 0..cols.saturating_sub(1) {
            edges.push(
                EdgeRef::new(
                    format!("h{}_{}", col, row),
                    format!("n{}_{}", col, row),
                    format!("n{}_{}", col + 1, row),
                )
                .with_label(format!("step {}", col)),
            );
        }
    }
    for row in 0..rows.saturating_sub(1) {
        for col in 0..cols {
            edges.push(EdgeRef::new(
                format!("v{}_{}", col, row),
                format!("n{}_{}", col, row),
                format!("n{}_{}", col, row + 1),
            ));
        }
    }
    let mut count = 0usize;
    'outer: for row in 0..rows {
        for col in 0..cols {
            if count >= extra_edges {
                break 'outer;
            }
            let dest_col = (col + 2) % cols;
            let dest_row = (row + 1) % rows;
            edges.push(
                EdgeRef::new(
                    format!("x{}", count),
                    format!("n{}_{}", col, row),
                    format!("n{}_{}", dest_col, dest_row),
                )
                .with_label(format!("link {}", count)),
            );
            count += 1;
        }
    }
    (nodes, edges)
}

fn bench_route_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_frame");
    for (cols, rows, extra) in [(5usize, 4usize, 10usize), (10, 8, 40), (16, 12, 120)] {
        let (nodes, edges) = grid_graph(cols, rows, extra);
        let name = format!("grid_{}x{}_{}", cols, rows, extra);
        for mode in [RoutingMode::Straight, RoutingMode::Manhattan, RoutingMode::Clean] {
            let mut config = EngineConfig::default();
            config.routing.mode = mode;
            let mode_name = match mode {
                RoutingMode::Straight => "straight",
                RoutingMode::Manhattan => "manhattan",
                RoutingMode::Clean => "clean",
            };
            group.bench_with_input(
                BenchmarkId::new(mode_name, &name),
                &(nodes.as_slice(), edges.as_slice()),
                |b, &(nodes, edges)| {
                    b.iter(|| {
                        let mut cache = LabelCache::new();
                        let out = route_frame(
                            black_box(nodes),
                            black_box(edges),
                            &config,
                            &FrameInput::at(0.0, 1.0),
                            &mut cache,
                        );
                        black_box(out.paths.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_warm_cache_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_frame_warm_cache");
    for (cols, rows, extra) in [(10usize, 8usize, 40usize)] {
        let (nodes, edges) = grid_graph(cols, rows, extra);
        let config = EngineConfig::default();
        let name = format!("grid_{}x{}_{}", cols, rows, extra);
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(nodes.as_slice(), edges.as_slice()),
            |b, &(nodes, edges)| {
                let mut cache = LabelCache::new();
                let mut now_ms = 0.0;
                route_frame(nodes, edges, &config, &FrameInput::at(now_ms, 1.0), &mut cache);
                b.iter(|| {
                    now_ms += 16.0;
                    let out = route_frame(
                        black_box(nodes),
                        black_box(edges),
                        &config,
                        &FrameInput::at(now_ms, 1.0),
                        &mut cache,
                    );
                    black_box(out.labels.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_route_frame, bench_warm_cache_frames
);
criterion_main!(benches);
