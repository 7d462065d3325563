//! Expansion of a single node during a search. The open list is keyed on F
//! so every time the G of a node improves it is pushed again, entries left
//! behind with an older score are harmless duplicates
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The parts of a search which decide how nodes are scored and entered
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SearchParams {
	/// Generation tag of the running search
	pub path_id: u16,
	/// Position the heuristic measures towards
	pub h_target: Int3,
	/// Estimate of the remaining cost
	pub heuristic: Heuristic,
	/// Multiplier of the estimate
	pub heuristic_scale: f32,
	/// Tags a node needs at least one of to be entered
	pub enabled_tags: u32,
}

/// Open every traversable neighbour of `current`.
///
/// A neighbour first seen by this search is parented to `current`. For one
/// seen before both directions are relaxed: the neighbour may be cheaper
/// through `current`, or `current` may be cheaper through the neighbour as
/// long as the neighbour links back to it
pub fn open(
	graphs: &mut Graphs,
	heap: &mut BinaryHeap,
	current: NodeRef,
	params: &SearchParams,
	buffer: &mut Vec<Connection>,
) {
	graphs.neighbours(current, buffer);
	for connection in buffer.iter() {
		let other = connection.get_node();
		let edge = connection.get_cost();
		let Some((current_g, current_penalty)) = graphs
			.node(current)
			.map(|n| (n.get_g(), n.get_penalty()))
		else {
			return;
		};
		let Some(node) = graphs.node_mut(other) else {
			continue;
		};
		if !node.can_traverse(params.enabled_tags) {
			continue;
		}
		if node.get_path_id() != params.path_id {
			node.set_parent(Some(current));
			node.set_path_id(params.path_id);
			node.set_cost(edge);
			node.update_h(params.h_target, params.heuristic, params.heuristic_scale);
			node.update_g(current_g);
			heap.add(other, node.get_f());
			continue;
		}
		let through_current = current_g
			.saturating_add(edge)
			.saturating_add(node.get_penalty());
		if through_current < node.get_g() {
			node.set_cost(edge);
			node.set_parent(Some(current));
			update_all_g(graphs, heap, other, params.path_id);
			continue;
		}
		let through_other = node
			.get_g()
			.saturating_add(edge)
			.saturating_add(current_penalty);
		if through_other < current_g && graphs.has_link(other, current) {
			if let Some(c) = graphs.node_mut(current) {
				c.set_parent(Some(other));
				c.set_cost(edge);
			}
			update_all_g(graphs, heap, current, params.path_id);
		}
	}
}

/// Recompute the G of `root` from its parent, then propagate the change to
/// every node of this search parented below it. Each updated node is pushed
/// onto the open list.
///
/// Propagation stops after visiting as many nodes as the graphs hold
pub fn update_all_g(graphs: &mut Graphs, heap: &mut BinaryHeap, root: NodeRef, path_id: u16) {
	let limit = graphs.total_nodes();
	let mut stack = vec![root];
	let mut buffer = Vec::new();
	let mut visited = 0;
	while let Some(node_ref) = stack.pop() {
		visited += 1;
		if visited > limit {
			warn!("G score propagation exceeded {} nodes, stopping", limit);
			return;
		}
		let parent_g = graphs
			.node(node_ref)
			.and_then(|n| n.get_parent())
			.and_then(|p| graphs.node(p))
			.map(|p| p.get_g());
		let Some(node) = graphs.node_mut(node_ref) else {
			continue;
		};
		if let Some(parent_g) = parent_g {
			node.update_g(parent_g);
		}
		heap.add(node_ref, node.get_f());
		graphs.neighbours(node_ref, &mut buffer);
		for connection in buffer.iter() {
			let child = connection.get_node();
			if graphs
				.node(child)
				.is_some_and(|c| c.get_parent() == Some(node_ref) && c.get_path_id() == path_id)
			{
				stack.push(child);
			}
		}
	}
}
