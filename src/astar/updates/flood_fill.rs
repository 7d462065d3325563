//! Area labelling. Every walkable node reachable from a seed receives the
//! same area id, two nodes sharing an id are connected. Reachability
//! queries then compare two bytes instead of searching
//!
//! Components smaller than the minimum area size all share
//! [AREA_UNDERSIZED] so that fragmented maps don't exhaust the id space. Two
//! such components will report as connected even though they are not
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Outcome of a full flood fill
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FloodFillSummary {
	/// Highest unique area id handed out
	last_area: u8,
	/// Number of components relabelled as undersized
	small_areas: u32,
	/// Whether labelling stopped because the id space ran out
	exhausted: bool,
}

impl FloodFillSummary {
	pub fn get_last_area(&self) -> u8 {
		self.last_area
	}
	pub fn get_small_areas(&self) -> u32 {
		self.small_areas
	}
	pub fn is_exhausted(&self) -> bool {
		self.exhausted
	}
}

/// Get the id which follows `area`, [AREA_UNDERSIZED] is never handed out
fn next_area(area: u8) -> Option<u8> {
	match area {
		a if a == AREA_UNDERSIZED - 1 => Some(AREA_MAX),
		AREA_MAX => None,
		a => Some(a + 1),
	}
}

/// Label every walkable node reachable from `seed` with `area`, returning the
/// nodes visited. The traversal keeps an explicit stack
pub fn flood_fill_from(graphs: &mut Graphs, seed: NodeRef, area: u8) -> Vec<NodeRef> {
	let mut visited = Vec::new();
	let Some(node) = graphs.node_mut(seed) else {
		return visited;
	};
	node.set_area(area);
	let mut stack = vec![seed];
	let mut buffer = Vec::new();
	while let Some(current) = stack.pop() {
		visited.push(current);
		graphs.neighbours(current, &mut buffer);
		for connection in buffer.iter() {
			let other = connection.get_node();
			if let Some(n) = graphs.node_mut(other) {
				if n.is_walkable() && n.get_area() != area {
					n.set_area(area);
					stack.push(other);
				}
			}
		}
	}
	visited
}

/// Recompute the area of every node of every graph.
///
/// Unwalkable nodes end with [AREA_UNSET]. When more components exist than
/// there are ids the remaining nodes stay unset as well
pub fn flood_fill(graphs: &mut Graphs, min_area_size: u32) -> FloodFillSummary {
	for graph in graphs.iter_mut() {
		for node in graph.get_nodes_mut() {
			node.set_area(AREA_UNSET);
		}
	}
	let mut summary = FloodFillSummary::default();
	let mut candidate = Some(1_u8);
	let seeds: Vec<NodeRef> = graphs.node_refs().collect();
	for seed in seeds {
		let unlabelled = graphs
			.node(seed)
			.is_some_and(|n| n.is_walkable() && n.get_area() == AREA_UNSET);
		if !unlabelled {
			continue;
		}
		let Some(area) = candidate else {
			error!("Too many areas, the maximum number of areas is {}", AREA_MAX - 1);
			summary.exhausted = true;
			break;
		};
		let component = flood_fill_from(graphs, seed, area);
		if (component.len() as u32) < min_area_size {
			for node in component {
				if let Some(n) = graphs.node_mut(node) {
					n.set_area(AREA_UNDERSIZED);
				}
			}
			summary.small_areas += 1;
		} else {
			summary.last_area = area;
			candidate = next_area(area);
		}
	}
	if summary.small_areas > 0 {
		debug!(
			"{} small areas were detected (fewer than {} nodes), they share the area id {}",
			summary.small_areas, min_area_size, AREA_UNDERSIZED
		);
	}
	summary
}
