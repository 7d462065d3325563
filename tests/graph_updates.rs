//! Graph updates, their reversal and area labelling
//!

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use bevy_astar_navigation_plugin::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A quiet engine holding a single grid
fn engine_with_grid(width: u32, depth: u32) -> Pathfinder {
	let mut engine = Pathfinder::new(PathfinderSettings {
		log_path_results: PathLog::None,
		min_area_size: 0,
		..Default::default()
	});
	engine.add_graph(NavGraph::Grid(GridGraph::new(GridGraphSettings {
		width,
		depth,
		..Default::default()
	})));
	engine
}

/// Snapshot of the per node state an update may change
fn snapshot(graphs: &Graphs) -> Vec<(bool, u32, u32, u8)> {
	graphs
		.node_refs()
		.map(|r| {
			let n = graphs.node(r).unwrap();
			(n.is_walkable(), n.get_penalty(), n.get_tags(), n.get_area())
		})
		.collect()
}

/// Group nodes by area, two labellings are equal when they group the same
/// nodes together
fn partition(graphs: &Graphs) -> Vec<Vec<NodeRef>> {
	let mut groups: std::collections::BTreeMap<u8, Vec<NodeRef>> = Default::default();
	for r in graphs.node_refs() {
		let area = graphs.node(r).unwrap().get_area();
		if area != AREA_UNSET {
			groups.entry(area).or_default().push(r);
		}
	}
	let mut groups: Vec<Vec<NodeRef>> = groups.into_values().collect();
	groups.sort();
	groups
}

#[test]
fn flood_fill_is_idempotent() {
	let mut rng = StdRng::seed_from_u64(11);
	let mut grid = GridGraph::new(GridGraphSettings {
		width: 30,
		depth: 30,
		..Default::default()
	});
	let walls: Vec<bool> = (0..900).map(|_| rng.random_range(0..3) == 0).collect();
	grid.scan(&|x: u32, z: u32, p: Vec3| CellSample {
		walkable: !walls[(z * 30 + x) as usize],
		height: p.y,
		..Default::default()
	});
	let mut graphs = Graphs::new();
	graphs.add(NavGraph::Grid(grid));
	let first = flood_fill(&mut graphs, 0);
	let areas = partition(&graphs);
	let second = flood_fill(&mut graphs, 0);
	assert_eq!(first, second);
	assert_eq!(areas, partition(&graphs));
	// every member of a group is reachable from the first one
	for group in areas.iter() {
		let mut scratch = graphs.clone();
		let reached = flood_fill_from(&mut scratch, group[0], AREA_MAX - 1);
		assert_eq!(group.len(), reached.len());
	}
}

#[test]
fn small_components_share_the_undersized_area() {
	let mut grid = GridGraph::new(GridGraphSettings {
		width: 7,
		depth: 1,
		..Default::default()
	});
	// a lone cell, a wall, then five connected cells
	grid.scan(&|x: u32, _z: u32, p: Vec3| CellSample {
		walkable: x != 1,
		height: p.y,
		..Default::default()
	});
	let mut graphs = Graphs::new();
	graphs.add(NavGraph::Grid(grid));
	let summary = flood_fill(&mut graphs, 3);
	assert_eq!(1, summary.get_small_areas());
	assert_eq!(AREA_UNDERSIZED, graphs.node(NodeRef::new(0, 0)).unwrap().get_area());
	assert_eq!(AREA_UNSET, graphs.node(NodeRef::new(0, 1)).unwrap().get_area());
	assert_eq!(1, graphs.node(NodeRef::new(0, 2)).unwrap().get_area());
	assert_eq!(1, graphs.node(NodeRef::new(0, 6)).unwrap().get_area());
}

#[test]
fn tracked_update_reverts_exactly() {
	let mut engine = engine_with_grid(6, 6);
	let before = snapshot(engine.get_graphs());
	let update = GraphUpdateObject::new(UpdateBounds::new(Vec3::new(-1.0, -1.0, -3.0), Vec3::new(1.0, 1.0, 3.0)))
		.with_walkability(false)
		.with_penalty(500)
		.with_tags(0b110, 0b100)
		.with_tracking(true);
	engine.update_graphs(update);
	assert_eq!(1, engine.flush_graph_updates());
	assert_ne!(before, snapshot(engine.get_graphs()));
	let applied = engine.take_applied_updates();
	assert_eq!(1, applied.len());
	assert!(!applied[0].get_changed_nodes().is_empty());
	assert!(engine.revert_update(&applied[0]));
	assert_eq!(before, snapshot(engine.get_graphs()));
	// connectivity came back too
	assert!(engine.is_reachable(NodeRef::new(0, 0), NodeRef::new(0, 35)));
}

#[test]
fn untracked_update_cannot_revert() {
	let mut engine = engine_with_grid(3, 3);
	engine.update_graphs(GraphUpdateObject::new(UpdateBounds::default()).with_penalty(5));
	engine.flush_graph_updates();
	let applied = engine.take_applied_updates();
	assert!(!engine.revert_update(&applied[0]));
}

#[test]
fn penalty_update_reroutes_paths() {
	let mut engine = engine_with_grid(5, 3);
	// make the middle row expensive, except at the ends
	let update = GraphUpdateObject::new(UpdateBounds::new(Vec3::new(-1.5, -1.0, -0.5), Vec3::new(1.5, 1.0, 0.5)))
		.with_penalty(10_000)
		.with_flood_fill(false);
	engine.update_graphs(update);
	engine.flush_graph_updates();
	let slot = Arc::new(Mutex::new(Vec::new()));
	let sink = slot.clone();
	engine.find_path(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), move |r, _| {
		*sink.lock().unwrap() = r.get_nodes().to_vec();
	});
	engine.run_until_idle();
	let nodes = slot.lock().unwrap().clone();
	assert_eq!(NodeRef::new(0, 5), nodes[0]);
	assert_eq!(NodeRef::new(0, 9), *nodes.last().unwrap());
	// the inner cells of the middle row are avoided
	assert!(nodes[1..nodes.len() - 1].iter().all(|n| n.get_index() / 5 != 1));
}

#[test]
fn update_queued_mid_search_waits_for_it() {
	let mut engine = engine_with_grid(60, 60);
	engine.get_settings_mut().max_frame_time = 0.0;
	engine.get_settings_mut().limit_graph_updates = false;
	// without a heuristic nearly every node is searched, far more than a
	// single tick covers
	let path = Path::new(Vec3::new(-29.5, 0.0, -29.5), Vec3::new(29.5, 0.0, 29.5))
		.with_heuristic(Heuristic::None, 1.0);
	engine.submit(path);
	engine.tick();
	assert!(!engine.is_idle());
	engine.update_graphs(GraphUpdateObject::new(UpdateBounds::default()).with_penalty(1));
	engine.tick();
	assert!(!engine.is_idle());
	assert_eq!(1, engine.pending_graph_updates());
	engine.run_until_idle();
	assert_eq!(0, engine.pending_graph_updates());
}

#[test]
fn blocking_trial_keeps_an_applied_update() {
	let mut engine = engine_with_grid(5, 5);
	let update = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(0.5)))
		.with_penalty(50)
		.with_tracking(true);
	engine.update_graphs(update);
	engine.flush_graph_updates();
	let applied = engine.take_applied_updates().pop().unwrap();
	let before = snapshot(engine.get_graphs());
	let penalties: u32 = before.iter().map(|n| n.1).sum();
	assert_eq!(50, penalties);
	assert!(!engine.will_block_path(&applied, NodeRef::new(0, 0), NodeRef::new(0, 24)));
	assert_eq!(before, snapshot(engine.get_graphs()));
	// the backups of the real application survive the trial
	assert_eq!(1, applied.get_changed_nodes().len());
	assert!(engine.revert_update(&applied));
	assert_eq!(0, engine.get_graphs().node(NodeRef::new(0, 12)).unwrap().get_penalty());
}

#[test]
fn reused_update_reverts_its_latest_batch() {
	let mut engine = engine_with_grid(5, 5);
	let update = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(2.5)))
		.with_penalty(30)
		.with_tracking(true);
	engine.update_graphs(update);
	engine.flush_graph_updates();
	let first = engine.take_applied_updates().pop().unwrap();
	let between = snapshot(engine.get_graphs());
	engine.update_graphs(first);
	engine.flush_graph_updates();
	let second = engine.take_applied_updates().pop().unwrap();
	assert_eq!(9, second.get_changed_nodes().len());
	assert_ne!(between, snapshot(engine.get_graphs()));
	assert!(engine.revert_update(&second));
	assert_eq!(between, snapshot(engine.get_graphs()));
}

#[test]
fn walls_raised_mid_search_are_not_crossed() {
	let mut engine = engine_with_grid(40, 40);
	engine.get_settings_mut().max_frame_time = 0.0;
	engine.get_settings_mut().heuristic = Heuristic::None;
	let slot = Arc::new(Mutex::new(None));
	let sink = slot.clone();
	engine.find_path(Vec3::new(-19.5, 0.0, 0.5), Vec3::new(19.5, 0.0, 0.5), move |r, _| {
		*sink.lock().unwrap() = Some(r.clone());
	});
	engine.tick();
	assert!(!engine.is_idle());
	// a wall across the far half of the grid with a gap along its top edge
	let wall = GraphUpdateObject::new(UpdateBounds::new(Vec3::new(9.3, -1.0, -20.0), Vec3::new(9.7, 1.0, 18.0)))
		.with_walkability(false);
	engine.update_graphs(wall);
	assert_eq!(1, engine.flush_graph_updates());
	engine.run_until_idle();
	let result = slot.lock().unwrap().clone().unwrap();
	assert!(result.get_error().is_none());
	let graphs = engine.get_graphs();
	assert!(result.get_nodes().iter().all(|n| graphs.node(*n).unwrap().is_walkable()));
}
