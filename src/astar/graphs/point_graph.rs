//! Explicitly placed waypoints. Links are either derived from distance rules
//! during [PointGraph::scan] or added by hand
//!

use crate::prelude::*;
use bevy::prelude::*;
use uuid::Uuid;

/// Rules used to link waypoints during a scan
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Copy, PartialEq, Debug, Default, Reflect)]
pub struct PointGraphSettings {
	/// Longest link in world units, `0` allows any length
	pub max_distance: f32,
	/// Largest absolute delta along each axis, a `0` component leaves that
	/// axis unchecked
	pub limits: Vec3,
}

/// A graph of freely placed waypoints
#[derive(Clone, Debug)]
pub struct PointGraph {
	/// Link rules
	settings: PointGraphSettings,
	/// Stable identity used across saves
	guid: Uuid,
	/// Position of the graph within [Graphs]
	graph_index: u8,
	/// Weight of nearest-node results against other graphs
	nearest_priority: NearestNodePriority,
	/// One node per waypoint
	nodes: Vec<Node>,
}

impl PointGraph {
	/// Identifier used when persisting the graph
	pub const TYPE_NAME: &'static str = "PointGraph";
	/// Create a new empty instance of [PointGraph]
	pub fn new(settings: PointGraphSettings) -> Self {
		PointGraph {
			settings,
			guid: Uuid::new_v4(),
			graph_index: 0,
			nearest_priority: NearestNodePriority::Normal,
			nodes: Vec::new(),
		}
	}
	pub fn get_settings(&self) -> &PointGraphSettings {
		&self.settings
	}
	pub fn get_guid(&self) -> Uuid {
		self.guid
	}
	pub fn set_guid(&mut self, guid: Uuid) {
		self.guid = guid;
	}
	pub fn get_graph_index(&self) -> u8 {
		self.graph_index
	}
	/// Record the index the graph occupies within [Graphs]
	pub(crate) fn store_graph_index(&mut self, index: u8) {
		self.graph_index = index;
	}
	pub fn get_nearest_priority(&self) -> NearestNodePriority {
		self.nearest_priority
	}
	pub fn set_nearest_priority(&mut self, priority: NearestNodePriority) {
		self.nearest_priority = priority;
	}
	pub fn get_nodes(&self) -> &[Node] {
		&self.nodes
	}
	pub fn get_nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}
	/// Replace the nodes wholesale, used when restoring a saved graph
	pub(crate) fn set_nodes(&mut self, nodes: Vec<Node>) {
		self.nodes = nodes;
	}
	/// Append an unlinked waypoint and return a reference to it
	pub fn add_point(&mut self, position: Vec3) -> NodeRef {
		let mut node = Node::new(Int3::from_vec3(position));
		node.set_graph_index(self.graph_index);
		self.nodes.push(node);
		NodeRef::new(self.graph_index, (self.nodes.len() - 1) as u32)
	}
	/// Link two waypoints of this graph in both directions with the cost
	/// magnitude of the distance between them
	pub fn link(&mut self, a: u32, b: u32) -> bool {
		let (Some(na), Some(nb)) = (self.nodes.get(a as usize), self.nodes.get(b as usize)) else {
			warn!("Cannot link points {} and {}, point does not exist", a, b);
			return false;
		};
		let cost = (na.get_position() - nb.get_position()).cost_magnitude();
		let index = self.graph_index;
		self.nodes[a as usize].add_connection(NodeRef::new(index, b), cost);
		self.nodes[b as usize].add_connection(NodeRef::new(index, a), cost);
		true
	}
	/// Replace every waypoint with `points` and link each pair that passes
	/// [PointGraph::is_valid_connection]
	pub fn scan(&mut self, points: &[Vec3]) {
		self.nodes = Vec::with_capacity(points.len());
		for p in points.iter() {
			self.add_point(*p);
		}
		self.calculate_connections();
		debug!("Scanned point graph with {} nodes", self.nodes.len());
	}
	/// Rebuild the connections of every node from the link rules, hand made
	/// links are lost
	pub fn calculate_connections(&mut self) {
		for node in self.nodes.iter_mut() {
			node.clear_connections();
		}
		for i in 0..self.nodes.len() {
			for j in 0..self.nodes.len() {
				if i == j {
					continue;
				}
				if let Some(cost) = self.is_valid_connection(&self.nodes[i], &self.nodes[j]) {
					let to = NodeRef::new(self.graph_index, j as u32);
					self.nodes[i].add_connection(to, cost);
				}
			}
		}
	}
	/// Returns the edge cost if `a` and `b` may be linked
	pub fn is_valid_connection(&self, a: &Node, b: &Node) -> Option<u32> {
		if !a.is_walkable() || !b.is_walkable() {
			return None;
		}
		let dir = (a.get_position() - b.get_position()).to_vec3();
		let limits = self.settings.limits;
		if (limits.x != 0.0 && dir.x.abs() > limits.x)
			|| (limits.y != 0.0 && dir.y.abs() > limits.y)
			|| (limits.z != 0.0 && dir.z.abs() > limits.z)
		{
			return None;
		}
		let dist = dir.length();
		if self.settings.max_distance == 0.0 || dist < self.settings.max_distance {
			Some((a.get_position() - b.get_position()).cost_magnitude())
		} else {
			None
		}
	}
	/// Linear search for the closest waypoint. The closest waypoint passing
	/// `constraint` is reported alongside
	pub fn get_nearest(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		let target = Int3::from_vec3(position);
		let mut nearest: Option<(usize, i64)> = None;
		let mut constrained: Option<(usize, i64)> = None;
		for (i, node) in self.nodes.iter().enumerate() {
			let dist = (node.get_position() - target).sqr_magnitude();
			if nearest.is_none_or(|(_, d)| dist < d) {
				nearest = Some((i, dist));
			}
			if constraint.suitable(node) && constrained.is_none_or(|(_, d)| dist < d) {
				constrained = Some((i, dist));
			}
		}
		let Some((index, _)) = nearest else {
			return NearestInfo::default();
		};
		let mut info = NearestInfo::new(
			NodeRef::new(self.graph_index, index as u32),
			self.nodes[index].get_position().to_vec3(),
			self.nearest_priority,
		);
		if let Some((c, _)) = constrained {
			info.constrained_node = Some(NodeRef::new(self.graph_index, c as u32));
			info.constrained_clamped_position = self.nodes[c].get_position().to_vec3();
		}
		info
	}
	/// The closest waypoint satisfying `constraint`
	pub fn get_nearest_force(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		let mut info = self.get_nearest(position, constraint);
		if info.promote_constrained() {
			info.constrained_node = None;
			info
		} else {
			NearestInfo::default()
		}
	}
	/// Apply `update` to every waypoint within its bounds. Links are left as
	/// they are, a search skips unwalkable nodes regardless
	pub fn update_area(&mut self, update: &mut GraphUpdateObject) {
		let index = self.graph_index;
		for (i, node) in self.nodes.iter_mut().enumerate() {
			if update.get_bounds().contains(node.get_position().to_vec3()) {
				update.will_update_node(NodeRef::new(index, i as u32), node);
				update.apply(node);
			}
		}
	}
}
