//! Constraints and results of nearest-node queries
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Decides whether a node is an acceptable answer to a nearest-node query
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Reflect)]
pub struct NNConstraint {
	/// Only accept nodes whose walkable flag equals [NNConstraint::walkable]
	pub constrain_walkability: bool,
	/// Required walkability when [NNConstraint::constrain_walkability] is set
	pub walkable: bool,
	/// Only accept nodes within [NNConstraint::area]
	pub constrain_area: bool,
	/// Required area, no effect while unset
	pub area: Option<u8>,
}

impl Default for NNConstraint {
	fn default() -> Self {
		NNConstraint {
			constrain_walkability: true,
			walkable: true,
			constrain_area: false,
			area: None,
		}
	}
}

impl NNConstraint {
	/// A constraint which accepts every node
	pub fn none() -> Self {
		NNConstraint {
			constrain_walkability: false,
			walkable: true,
			constrain_area: false,
			area: None,
		}
	}
	/// Restrict results to nodes of `area`
	pub fn within_area(area: u8) -> Self {
		NNConstraint {
			constrain_area: true,
			area: Some(area),
			..Default::default()
		}
	}
	/// Whether `node` satisfies the constraint
	pub fn suitable(&self, node: &Node) -> bool {
		if self.constrain_walkability && node.is_walkable() != self.walkable {
			return false;
		}
		if self.constrain_area {
			if let Some(area) = self.area {
				if node.get_area() != area {
					return false;
				}
			}
		}
		true
	}
}

/// The constraint a path resolves its end points with. The start is looked
/// up with [PathNNConstraint::get_constraint], once found
/// [PathNNConstraint::set_start] may narrow the lookup of the end
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub struct PathNNConstraint {
	/// Constraint in effect for the next lookup
	constraint: NNConstraint,
	/// When set the end point will only snap to nodes sharing the area of the
	/// start node
	end_in_start_area: bool,
}

impl PathNNConstraint {
	/// Create a new instance of [PathNNConstraint] from a base constraint
	pub fn new(constraint: NNConstraint) -> Self {
		PathNNConstraint {
			constraint,
			end_in_start_area: false,
		}
	}
	/// A path constraint which snaps the end point to the closest node that
	/// is reachable from the start. Requests towards an unreachable region
	/// then end next to it instead of failing
	pub fn same_area() -> Self {
		PathNNConstraint {
			constraint: NNConstraint::default(),
			end_in_start_area: true,
		}
	}
	pub fn get_constraint(&self) -> &NNConstraint {
		&self.constraint
	}
	/// Called once the start node of a path is known
	pub fn set_start(&mut self, start: Option<&Node>) {
		if !self.end_in_start_area {
			return;
		}
		match start {
			Some(node) => {
				self.constraint.constrain_area = true;
				self.constraint.area = Some(node.get_area());
			}
			None => self.constraint.constrain_area = false,
		}
	}
}

/// How strongly a graph claims the result of a nearest-node query.
/// Candidates from several graphs are compared by `distance * factor`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum NearestNodePriority {
	ReallyHigh,
	High,
	#[default]
	Normal,
	Low,
	ReallyLow,
}

impl NearestNodePriority {
	/// Multiplier applied to the distance of a candidate
	pub fn factor(&self) -> f32 {
		match self {
			NearestNodePriority::ReallyHigh => 0.0,
			NearestNodePriority::High => 1.0,
			NearestNodePriority::Normal => 5.0,
			NearestNodePriority::Low => 8.0,
			NearestNodePriority::ReallyLow => 20.0,
		}
	}
}

/// Result of a nearest-node query
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct NearestInfo {
	/// Closest node regardless of any constraint
	pub node: Option<NodeRef>,
	/// Closest node satisfying the constraint, filled in when the graph found
	/// one without extra work
	pub constrained_node: Option<NodeRef>,
	/// The query position moved onto [NearestInfo::node]
	pub clamped_position: Vec3,
	/// The query position moved onto [NearestInfo::constrained_node]
	pub constrained_clamped_position: Vec3,
	/// Weight of the result against other graphs
	pub priority: NearestNodePriority,
}

impl NearestInfo {
	/// Create a new instance of [NearestInfo] for a single node
	pub fn new(node: NodeRef, clamped_position: Vec3, priority: NearestNodePriority) -> Self {
		NearestInfo {
			node: Some(node),
			constrained_node: None,
			clamped_position,
			constrained_clamped_position: Vec3::ZERO,
			priority,
		}
	}
	/// Replace the node with the constrained node, if there is one
	pub fn promote_constrained(&mut self) -> bool {
		if let Some(constrained) = self.constrained_node {
			self.node = Some(constrained);
			self.clamped_position = self.constrained_clamped_position;
			true
		} else {
			false
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn default_requires_walkable() {
		let c = NNConstraint::default();
		let mut node = Node::new(Int3::ZERO);
		assert!(c.suitable(&node));
		node.set_walkable(false);
		assert!(!c.suitable(&node));
		assert!(NNConstraint::none().suitable(&node));
	}
	#[test]
	fn area_constraint() {
		let c = NNConstraint::within_area(3);
		let mut node = Node::new(Int3::ZERO);
		node.set_area(2);
		assert!(!c.suitable(&node));
		node.set_area(3);
		assert!(c.suitable(&node));
	}
	#[test]
	fn unset_area_accepts_all() {
		let c = NNConstraint {
			constrain_area: true,
			area: None,
			..Default::default()
		};
		let mut node = Node::new(Int3::ZERO);
		node.set_area(9);
		assert!(c.suitable(&node));
	}
	#[test]
	fn same_area_narrows_after_start() {
		let mut c = PathNNConstraint::same_area();
		let mut start = Node::new(Int3::ZERO);
		start.set_area(5);
		c.set_start(Some(&start));
		let mut other = Node::new(Int3::ZERO);
		other.set_area(6);
		assert!(!c.get_constraint().suitable(&other));
	}
	#[test]
	fn plain_path_constraint_ignores_start_area() {
		let mut c = PathNNConstraint::default();
		let mut start = Node::new(Int3::ZERO);
		start.set_area(5);
		c.set_start(Some(&start));
		let mut other = Node::new(Int3::ZERO);
		other.set_area(6);
		assert!(c.get_constraint().suitable(&other));
	}
}
