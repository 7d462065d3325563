//! Measure labelling the areas of a fragmented grid
//!
//! Grid is 500 cells by 500 cells
//!

use bevy::prelude::*;
use bevy_astar_navigation_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Create a grid where roughly a third of the cells are walls
fn prepare_graphs(size: u32) -> Graphs {
	let mut rng = StdRng::seed_from_u64(3);
	let walls: Vec<bool> = (0..size * size).map(|_| rng.random_range(0..3) == 0).collect();
	let mut grid = GridGraph::new(GridGraphSettings {
		width: size,
		depth: size,
		..Default::default()
	});
	grid.scan(&|x: u32, z: u32, p: Vec3| CellSample {
		walkable: !walls[(z * size + x) as usize],
		height: p.y,
		..Default::default()
	});
	let mut graphs = Graphs::new();
	graphs.add(NavGraph::Grid(grid));
	graphs
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("data_initialisation");
	group.significance_level(0.05).sample_size(100);
	let mut graphs = prepare_graphs(500);
	group.bench_function("flood_fill", |b| {
		b.iter(|| flood_fill(&mut graphs, black_box(10)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
