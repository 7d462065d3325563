//! A [Node] is a vertex of a pathfinding graph. It owns a position, the
//! outgoing [Connection]s to its neighbours and the persistent traversal
//! properties (walkability, penalty, tags, area). It also stores the
//! transient state of whichever search touched it last, that state is only
//! meaningful while its generation tag equals the ID of the running search
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Area id of a node that has not been labelled by a flood fill
pub const AREA_UNSET: u8 = 0;
/// Area id shared by every component smaller than the configured minimum
/// area size
pub const AREA_UNDERSIZED: u8 = 254;
/// Highest area id a flood fill can hand out
pub const AREA_MAX: u8 = 255;
/// Tags a freshly created node carries
pub const DEFAULT_NODE_TAGS: u32 = 1;

/// Identifies a node by the index of its owning graph and its slot within
/// that graph
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct NodeRef {
	/// Position of the owning graph in [Graphs]
	graph: u8,
	/// Slot of the node within its graph
	index: u32,
}

impl NodeRef {
	/// Create a new instance of [NodeRef]
	pub fn new(graph: u8, index: u32) -> Self {
		NodeRef { graph, index }
	}
	/// Get the index of the owning graph
	pub fn get_graph(&self) -> u8 {
		self.graph
	}
	/// Get the slot of the node within its graph
	pub fn get_index(&self) -> u32 {
		self.index
	}
	/// Get the slot as a `usize` for indexing
	pub fn index_usize(&self) -> usize {
		self.index as usize
	}
}

/// A one-way edge to another node
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Reflect)]
pub struct Connection {
	/// The node at the far end of the edge
	node: NodeRef,
	/// Cost of travelling along the edge
	cost: u32,
}

impl Connection {
	/// Create a new instance of [Connection]
	pub fn new(node: NodeRef, cost: u32) -> Self {
		Connection { node, cost }
	}
	pub fn get_node(&self) -> NodeRef {
		self.node
	}
	pub fn get_cost(&self) -> u32 {
		self.cost
	}
}

/// How the remaining distance to the target is estimated
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum Heuristic {
	/// No estimate, the search degrades to Dijkstra
	None,
	/// Sum of the absolute axis deltas
	Manhattan,
	/// Octile distance in the XZ plane, `y` is ignored
	DiagonalManhattan,
	/// Straight line distance
	#[default]
	Euclidean,
}

/// State written onto a node by the search that last visited it
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SearchState {
	/// The node this one was reached from
	parent: Option<NodeRef>,
	/// Generation tag, the ID of the search which wrote this state
	path_id: u16,
	/// Cost from the start of the search
	g: u32,
	/// Estimated cost to the target
	h: u32,
	/// Cost of the edge used to reach the node from its parent
	cost: u32,
}

/// A vertex in a pathfinding graph
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct Node {
	/// Fixed precision location of the node
	position: Int3,
	/// Outgoing edges, a bidirectional link is stored as an entry on each end
	connections: Vec<Connection>,
	/// Extra cost added whenever the node is entered
	penalty: u32,
	/// Whether the node can be traversed at all
	walkable: bool,
	/// Connected component label written by flood fills
	area: u8,
	/// Index of the owning graph
	graph_index: u8,
	/// Traversability classes of the node
	tags: u32,
	/// Transient search data
	#[cfg_attr(feature = "serde", serde(skip))]
	search: SearchState,
}

impl Default for Node {
	fn default() -> Self {
		Node {
			position: Int3::ZERO,
			connections: Vec::new(),
			penalty: 0,
			walkable: true,
			area: AREA_UNSET,
			graph_index: 0,
			tags: DEFAULT_NODE_TAGS,
			search: SearchState::default(),
		}
	}
}

impl Node {
	/// Create a new walkable instance of [Node] at `position`
	pub fn new(position: Int3) -> Self {
		Node {
			position,
			..Default::default()
		}
	}
	pub fn get_position(&self) -> Int3 {
		self.position
	}
	pub fn set_position(&mut self, position: Int3) {
		self.position = position;
	}
	/// Get the outgoing connections of the node
	pub fn get_connections(&self) -> &[Connection] {
		&self.connections
	}
	/// Add a one-way edge to `node`. If an edge to it already exists only its
	/// cost is replaced
	pub fn add_connection(&mut self, node: NodeRef, cost: u32) {
		if let Some(existing) = self.connections.iter_mut().find(|c| c.node == node) {
			existing.cost = cost;
		} else {
			self.connections.push(Connection::new(node, cost));
		}
	}
	/// Remove the edge to `node`, returns whether one was found. Only this
	/// direction is severed
	pub fn remove_connection(&mut self, node: NodeRef) -> bool {
		if let Some(i) = self.connections.iter().position(|c| c.node == node) {
			self.connections.remove(i);
			true
		} else {
			false
		}
	}
	/// Whether an edge to `node` exists in the connection list
	pub fn has_connection(&self, node: NodeRef) -> bool {
		self.connections.iter().any(|c| c.node == node)
	}
	/// Get the cost of the edge to `node` if present
	pub fn get_connection_cost(&self, node: NodeRef) -> Option<u32> {
		self.connections
			.iter()
			.find(|c| c.node == node)
			.map(|c| c.cost)
	}
	/// Drop every edge
	pub fn clear_connections(&mut self) {
		self.connections.clear();
	}
	/// Keep only the edges matching `keep`
	pub fn retain_connections(&mut self, keep: impl Fn(&Connection) -> bool) {
		self.connections.retain(keep);
	}
	pub fn get_penalty(&self) -> u32 {
		self.penalty
	}
	pub fn set_penalty(&mut self, penalty: u32) {
		self.penalty = penalty;
	}
	pub fn is_walkable(&self) -> bool {
		self.walkable
	}
	pub fn set_walkable(&mut self, walkable: bool) {
		self.walkable = walkable;
	}
	pub fn get_area(&self) -> u8 {
		self.area
	}
	pub fn set_area(&mut self, area: u8) {
		self.area = area;
	}
	pub fn get_graph_index(&self) -> u8 {
		self.graph_index
	}
	pub fn set_graph_index(&mut self, graph_index: u8) {
		self.graph_index = graph_index;
	}
	pub fn get_tags(&self) -> u32 {
		self.tags
	}
	pub fn set_tags(&mut self, tags: u32) {
		self.tags = tags;
	}
	/// Whether a search with the enabled tag mask `enabled_tags` may enter
	/// the node
	pub fn can_traverse(&self, enabled_tags: u32) -> bool {
		self.walkable && (self.tags & enabled_tags) != 0
	}
	/// Get the parent written by the last search
	pub fn get_parent(&self) -> Option<NodeRef> {
		self.search.parent
	}
	pub fn set_parent(&mut self, parent: Option<NodeRef>) {
		self.search.parent = parent;
	}
	/// Get the generation tag of the last search to touch the node
	pub fn get_path_id(&self) -> u16 {
		self.search.path_id
	}
	pub fn set_path_id(&mut self, path_id: u16) {
		self.search.path_id = path_id;
	}
	pub fn get_g(&self) -> u32 {
		self.search.g
	}
	pub fn set_g(&mut self, g: u32) {
		self.search.g = g;
	}
	pub fn get_h(&self) -> u32 {
		self.search.h
	}
	/// Total estimated cost through the node, never stored
	pub fn get_f(&self) -> u32 {
		self.search.g.saturating_add(self.search.h)
	}
	/// Get the cost of the edge from the parent
	pub fn get_cost(&self) -> u32 {
		self.search.cost
	}
	pub fn set_cost(&mut self, cost: u32) {
		self.search.cost = cost;
	}
	/// Reset the transient search data, used by the generation tag cleanup
	pub fn clear_search_state(&mut self) {
		self.search = SearchState::default();
	}
	/// Estimate the remaining cost to `target`
	pub fn update_h(&mut self, target: Int3, heuristic: Heuristic, scale: f32) {
		let delta = (self.position - target).abs();
		self.search.h = match heuristic {
			Heuristic::None => 0,
			Heuristic::Manhattan => {
				let sum = delta.x as f32 + delta.y as f32 + delta.z as f32;
				(scale * sum).round() as u32
			}
			Heuristic::DiagonalManhattan => {
				let diagonal = delta.x.min(delta.z) as f32;
				let straight = delta.x.max(delta.z) as f32 - diagonal;
				(scale * (14.0 * diagonal + 10.0 * straight) / 10.0).round() as u32
			}
			Heuristic::Euclidean => (scale * (self.position - target).magnitude()).round() as u32,
		};
	}
	/// Recompute the cost so far from the parent's cost, the edge cost and
	/// the node penalty
	pub fn update_g(&mut self, parent_g: u32) {
		self.search.g = parent_g
			.saturating_add(self.search.cost)
			.saturating_add(self.penalty);
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn add_connection_is_idempotent() {
		let mut node = Node::new(Int3::ZERO);
		let other = NodeRef::new(0, 4);
		node.add_connection(other, 10);
		node.add_connection(other, 25);
		assert_eq!(1, node.get_connections().len());
		assert_eq!(Some(25), node.get_connection_cost(other));
	}
	#[test]
	fn remove_connection_reports_presence() {
		let mut node = Node::new(Int3::ZERO);
		let a = NodeRef::new(0, 1);
		let b = NodeRef::new(0, 2);
		node.add_connection(a, 10);
		node.add_connection(b, 12);
		assert!(node.remove_connection(a));
		assert!(!node.remove_connection(a));
		assert_eq!(vec![Connection::new(b, 12)], node.get_connections().to_vec());
	}
	#[test]
	fn heuristic_none() {
		let mut node = Node::new(Int3::new(500, 0, 500));
		node.update_h(Int3::ZERO, Heuristic::None, 1.0);
		assert_eq!(0, node.get_h());
	}
	#[test]
	fn heuristic_manhattan() {
		let mut node = Node::new(Int3::new(300, 50, -400));
		node.update_h(Int3::ZERO, Heuristic::Manhattan, 2.0);
		assert_eq!(1500, node.get_h());
	}
	#[test]
	fn heuristic_diagonal_manhattan_ignores_y() {
		let mut node = Node::new(Int3::new(300, 9000, 500));
		node.update_h(Int3::ZERO, Heuristic::DiagonalManhattan, 1.0);
		// 14 * 300 + 10 * 200 = 6200, / 10
		assert_eq!(620, node.get_h());
	}
	#[test]
	fn heuristic_euclidean() {
		let mut node = Node::new(Int3::new(300, 0, 400));
		node.update_h(Int3::ZERO, Heuristic::Euclidean, 1.0);
		assert_eq!(500, node.get_h());
	}
	#[test]
	fn update_g_sums_parent_edge_and_penalty() {
		let mut node = Node::new(Int3::ZERO);
		node.set_penalty(7);
		node.set_cost(141);
		node.update_g(100);
		assert_eq!(248, node.get_g());
	}
	#[test]
	fn traversal_respects_tags() {
		let mut node = Node::new(Int3::ZERO);
		node.set_tags(0b100);
		assert!(node.can_traverse(u32::MAX));
		assert!(!node.can_traverse(0b011));
		node.set_walkable(false);
		assert!(!node.can_traverse(u32::MAX));
	}
}
