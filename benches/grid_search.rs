//! Measure searching corner to corner across a large grid
//!
//! Grid is 200 cells by 200 cells with a maze of walls
//!

use bevy::prelude::*;
use bevy_astar_navigation_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Create an engine holding a walled grid before benchmarking
fn prepare_engine(size: u32) -> Pathfinder {
	let mut engine = Pathfinder::new(PathfinderSettings {
		log_path_results: PathLog::None,
		..Default::default()
	});
	let mut grid = GridGraph::new(GridGraphSettings {
		width: size,
		depth: size,
		..Default::default()
	});
	// every tenth column is a wall with a gap that alternates ends
	grid.scan(&|x: u32, z: u32, p: Vec3| {
		let wall = x % 10 == 5 && if (x / 10) % 2 == 0 { z > 2 } else { z < size - 3 };
		CellSample {
			walkable: !wall,
			height: p.y,
			..Default::default()
		}
	});
	engine.add_graph(NavGraph::Grid(grid));
	engine
}

/// Search from one corner to the opposite one
fn calc(engine: &mut Pathfinder, start: Vec3, end: Vec3, heuristic: Heuristic) {
	let path = Path::new(start, end).with_heuristic(heuristic, 1.0);
	engine.submit(path);
	engine.run_until_idle();
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let mut engine = prepare_engine(200);
	let start = Vec3::new(-99.5, 0.0, -99.5);
	let end = Vec3::new(99.5, 0.0, 99.5);
	group.bench_function("grid_search_euclidean", |b| {
		b.iter(|| calc(&mut engine, black_box(start), black_box(end), Heuristic::Euclidean))
	});
	group.bench_function("grid_search_dijkstra", |b| {
		b.iter(|| calc(&mut engine, black_box(start), black_box(end), Heuristic::None))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
