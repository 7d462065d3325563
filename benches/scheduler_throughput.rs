//! Measure draining a queue of many short paths through the scheduler
//!

use bevy::prelude::*;
use bevy_astar_navigation_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Create an engine with an open grid and a set of random requests
fn prepare(size: u32, requests: usize) -> (Pathfinder, Vec<(Vec3, Vec3)>) {
	let mut engine = Pathfinder::new(PathfinderSettings {
		log_path_results: PathLog::None,
		recycle_paths: true,
		..Default::default()
	});
	engine.add_graph(NavGraph::Grid(GridGraph::new(GridGraphSettings {
		width: size,
		depth: size,
		..Default::default()
	})));
	let half = size as f32 / 2.0;
	let mut rng = StdRng::seed_from_u64(5);
	let mut point = || Vec3::new(rng.random_range(-half..half), 0.0, rng.random_range(-half..half));
	let pairs = (0..requests).map(|_| (point(), point())).collect();
	(engine, pairs)
}

/// Submit every request and tick until all of them have been answered
fn calc(engine: &mut Pathfinder, pairs: &[(Vec3, Vec3)]) {
	for (start, end) in pairs {
		let path = engine.acquire_path(PathKind::Standard, *start, *end);
		engine.submit(path);
	}
	engine.run_until_idle();
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(50);
	let (mut engine, pairs) = prepare(64, 200);
	group.bench_function("scheduler_throughput", |b| {
		b.iter(|| calc(&mut engine, black_box(&pairs)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
