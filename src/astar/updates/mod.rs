//! A [GraphUpdateObject] describes a change to every node within a region of
//! the world: an additive penalty, a walkability override and a tag
//! rewrite. Graphs apply it to the nodes they own, recording a
//! [NodeBackup] of each node first when change tracking is enabled so the
//! update can be reverted later
//!

pub mod flood_fill;

use crate::prelude::*;
use bevy::prelude::*;

/// An axis aligned box in world space
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Debug, Default, Reflect)]
pub struct UpdateBounds {
	/// Corner with the smallest coordinates
	min: Vec3,
	/// Corner with the largest coordinates
	max: Vec3,
}

impl UpdateBounds {
	/// Create a new instance of [UpdateBounds] spanning two opposite corners
	/// given in any order
	pub fn new(a: Vec3, b: Vec3) -> Self {
		UpdateBounds {
			min: a.min(b),
			max: a.max(b),
		}
	}
	/// Create a new instance of [UpdateBounds] from its middle and full size
	pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
		let half = size.abs() / 2.0;
		UpdateBounds {
			min: center - half,
			max: center + half,
		}
	}
	pub fn get_min(&self) -> Vec3 {
		self.min
	}
	pub fn get_max(&self) -> Vec3 {
		self.max
	}
	pub fn get_center(&self) -> Vec3 {
		(self.min + self.max) / 2.0
	}
	pub fn get_size(&self) -> Vec3 {
		self.max - self.min
	}
	/// Whether `point` lies inside or on the surface of the box
	pub fn contains(&self, point: Vec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}
}

/// The persistent properties of a node before an update touched it
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NodeBackup {
	/// The node the snapshot belongs to
	node: NodeRef,
	/// Penalty before the update
	penalty: u32,
	/// Walkability before the update
	walkable: bool,
	/// Area before the update
	area: u8,
	/// Tags before the update
	tags: u32,
}

impl NodeBackup {
	/// Snapshot `node` which `node_ref` points to
	pub fn capture(node_ref: NodeRef, node: &Node) -> Self {
		NodeBackup {
			node: node_ref,
			penalty: node.get_penalty(),
			walkable: node.is_walkable(),
			area: node.get_area(),
			tags: node.get_tags(),
		}
	}
	pub fn get_node(&self) -> NodeRef {
		self.node
	}
	/// Write the snapshot back onto `node`
	pub fn restore(&self, node: &mut Node) {
		node.set_penalty(self.penalty);
		node.set_walkable(self.walkable);
		node.set_area(self.area);
		node.set_tags(self.tags);
	}
}

/// A pending mutation of every node within a bounded region
#[derive(Clone, Debug)]
pub struct GraphUpdateObject {
	/// Region the update applies to
	bounds: UpdateBounds,
	/// Added to the penalty of each node, the result never drops below zero
	add_penalty: i32,
	/// When set every node's walkability is replaced with the value
	set_walkability: Option<bool>,
	/// Bits of the node tags to rewrite
	tags_mask: u32,
	/// New values of the bits in [GraphUpdateObject::tags_mask]
	tags_value: u32,
	/// Whether areas must be recomputed once the update has been applied
	requires_flood_fill: bool,
	/// Whether a [NodeBackup] is recorded for each touched node
	track_changed_nodes: bool,
	/// Snapshots in the order nodes were touched
	changed_nodes: Vec<NodeBackup>,
}

impl GraphUpdateObject {
	/// Create a new instance of [GraphUpdateObject] over `bounds` which
	/// changes nothing yet but requests a flood fill
	pub fn new(bounds: UpdateBounds) -> Self {
		GraphUpdateObject {
			bounds,
			add_penalty: 0,
			set_walkability: None,
			tags_mask: 0,
			tags_value: 0,
			requires_flood_fill: true,
			track_changed_nodes: false,
			changed_nodes: Vec::new(),
		}
	}
	/// Add `penalty` to each node, negative values lower it
	pub fn with_penalty(mut self, penalty: i32) -> Self {
		self.add_penalty = penalty;
		self
	}
	/// Override the walkability of each node
	pub fn with_walkability(mut self, walkable: bool) -> Self {
		self.set_walkability = Some(walkable);
		self
	}
	/// Rewrite the tag bits selected by `mask` with those of `value`
	pub fn with_tags(mut self, mask: u32, value: u32) -> Self {
		self.tags_mask = mask;
		self.tags_value = value;
		self
	}
	/// Set whether areas are recomputed after the update. Updates which only
	/// touch penalties can safely skip it
	pub fn with_flood_fill(mut self, requires_flood_fill: bool) -> Self {
		self.requires_flood_fill = requires_flood_fill;
		self
	}
	/// Record a [NodeBackup] for every touched node so the update can be
	/// reverted with [GraphUpdateObject::revert_from_backup]
	pub fn with_tracking(mut self, track_changed_nodes: bool) -> Self {
		self.track_changed_nodes = track_changed_nodes;
		self
	}
	pub fn get_bounds(&self) -> &UpdateBounds {
		&self.bounds
	}
	pub fn get_add_penalty(&self) -> i32 {
		self.add_penalty
	}
	pub fn get_set_walkability(&self) -> Option<bool> {
		self.set_walkability
	}
	/// Get the `(mask, value)` pair of the tag rewrite
	pub fn get_tags(&self) -> (u32, u32) {
		(self.tags_mask, self.tags_value)
	}
	pub fn requires_flood_fill(&self) -> bool {
		self.requires_flood_fill
	}
	pub fn is_tracking(&self) -> bool {
		self.track_changed_nodes
	}
	/// Whether applying the update can change connectivity
	pub fn modifies_walkability(&self) -> bool {
		self.set_walkability.is_some()
	}
	/// Get the snapshots taken so far
	pub fn get_changed_nodes(&self) -> &[NodeBackup] {
		&self.changed_nodes
	}
	/// Must be called on every node right before [GraphUpdateObject::apply]
	pub fn will_update_node(&mut self, node_ref: NodeRef, node: &Node) {
		if self.track_changed_nodes {
			self.changed_nodes.push(NodeBackup::capture(node_ref, node));
		}
	}
	/// Mutate `node` as described by the update
	pub fn apply(&self, node: &mut Node) {
		let penalty = (node.get_penalty() as i64 + self.add_penalty as i64).clamp(0, u32::MAX as i64);
		node.set_penalty(penalty as u32);
		if let Some(walkable) = self.set_walkability {
			node.set_walkable(walkable);
		}
		let tags = (node.get_tags() & !self.tags_mask) | (self.tags_value & self.tags_mask);
		node.set_tags(tags);
	}
	/// Let every graph apply the update to the nodes it owns within the
	/// bounds. Snapshots of an earlier application are discarded, a revert
	/// only ever undoes the latest one
	pub fn update_graphs(&mut self, graphs: &mut Graphs) {
		self.changed_nodes.clear();
		for graph in graphs.iter_mut() {
			graph.update_area(self);
		}
	}
	/// Restore every touched node from its snapshot, most recent first, and
	/// recompute connectivity around them. Returns `false` when nothing was
	/// tracked
	pub fn revert_from_backup(&self, graphs: &mut Graphs) -> bool {
		if !self.track_changed_nodes {
			warn!("Changed nodes have not been tracked, cannot revert from backup");
			return false;
		}
		let mut touched: Vec<Vec<u32>> = vec![Vec::new(); graphs.len()];
		for backup in self.changed_nodes.iter().rev() {
			if let Some(node) = graphs.node_mut(backup.node) {
				backup.restore(node);
				touched[backup.node.get_graph() as usize].push(backup.node.get_index());
			}
		}
		for (i, nodes) in touched.iter().enumerate() {
			if nodes.is_empty() {
				continue;
			}
			if let Some(graph) = graphs.get_mut(i as u8) {
				graph.refresh_connections(nodes);
			}
		}
		true
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn bounds_normalise_corners() {
		let b = UpdateBounds::new(Vec3::new(2.0, -1.0, 5.0), Vec3::new(-2.0, 1.0, 0.0));
		assert_eq!(Vec3::new(-2.0, -1.0, 0.0), b.get_min());
		assert_eq!(Vec3::new(2.0, 1.0, 5.0), b.get_max());
		assert!(b.contains(Vec3::new(2.0, 0.0, 0.0)));
		assert!(!b.contains(Vec3::new(2.1, 0.0, 0.0)));
	}
	#[test]
	fn apply_penalty_walkability_and_tags() {
		let update = GraphUpdateObject::new(UpdateBounds::default())
			.with_penalty(30)
			.with_walkability(false)
			.with_tags(0b110, 0b010);
		let mut node = Node::new(Int3::ZERO);
		node.set_tags(0b101);
		update.apply(&mut node);
		assert_eq!(30, node.get_penalty());
		assert!(!node.is_walkable());
		assert_eq!(0b011, node.get_tags());
	}
	#[test]
	fn negative_penalty_clamps_at_zero() {
		let update = GraphUpdateObject::new(UpdateBounds::default()).with_penalty(-50);
		let mut node = Node::new(Int3::ZERO);
		node.set_penalty(20);
		update.apply(&mut node);
		assert_eq!(0, node.get_penalty());
	}
	#[test]
	fn untracked_update_cannot_revert() {
		let mut graphs = Graphs::new();
		let update = GraphUpdateObject::new(UpdateBounds::default());
		assert!(!update.revert_from_backup(&mut graphs));
	}
	#[test]
	fn tracked_update_reverts() {
		let mut graphs = Graphs::new();
		let grid = GridGraph::new(GridGraphSettings { width: 3, depth: 3, ..Default::default() });
		graphs.add(NavGraph::Grid(grid));
		let mut update = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(2.5)))
			.with_penalty(500)
			.with_walkability(false)
			.with_tracking(true);
		update.update_graphs(&mut graphs);
		assert_eq!(9, update.get_changed_nodes().len());
		assert!(!graphs.node(NodeRef::new(0, 4)).unwrap().is_walkable());
		assert!(update.revert_from_backup(&mut graphs));
		let centre = graphs.node(NodeRef::new(0, 4)).unwrap();
		assert!(centre.is_walkable());
		assert_eq!(0, centre.get_penalty());
		assert!(graphs.has_link(NodeRef::new(0, 4), NodeRef::new(0, 0)));
	}
	#[test]
	fn reapplying_replaces_backups() {
		let mut graphs = Graphs::new();
		graphs.add(NavGraph::Grid(GridGraph::new(GridGraphSettings { width: 3, depth: 3, ..Default::default() })));
		let mut update = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(0.5)))
			.with_penalty(40)
			.with_tracking(true);
		update.update_graphs(&mut graphs);
		update.update_graphs(&mut graphs);
		assert_eq!(1, update.get_changed_nodes().len());
		assert!(update.revert_from_backup(&mut graphs));
		// only the second application is undone
		assert_eq!(40, graphs.node(NodeRef::new(0, 4)).unwrap().get_penalty());
	}
}
