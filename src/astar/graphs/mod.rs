//! Graphs own the [Node]s a search runs over. Each kind keeps its own
//! connectivity data next to the nodes and only overrides the parts of
//! traversal that depend on it:
//!
//! * [GridGraph] - a uniform grid where adjacency is a packed 8-bit flag per node
//! * [PointGraph] - explicitly placed waypoints joined by distance rules or by hand
//! * [NavMeshGraph] - one node per triangle of a navigation mesh
//!
//! Every node may additionally carry extra [Connection]s, even to nodes of
//! another graph
//!

pub mod grid_graph;
pub mod navmesh_graph;
pub mod point_graph;

use crate::prelude::*;
use bevy::prelude::*;
use uuid::Uuid;

/// Graph indices must fit in 5 bits
pub const MAX_GRAPHS: usize = 32;

/// A graph of one of the supported kinds
#[derive(Clone, Debug)]
pub enum NavGraph {
	Grid(GridGraph),
	Point(PointGraph),
	NavMesh(NavMeshGraph),
}

impl NavGraph {
	/// Identifier of the graph kind, used when persisting graphs
	pub fn type_name(&self) -> &'static str {
		match self {
			NavGraph::Grid(_) => GridGraph::TYPE_NAME,
			NavGraph::Point(_) => PointGraph::TYPE_NAME,
			NavGraph::NavMesh(_) => NavMeshGraph::TYPE_NAME,
		}
	}
	/// Stable identity of the graph across saves
	pub fn get_guid(&self) -> Uuid {
		match self {
			NavGraph::Grid(g) => g.get_guid(),
			NavGraph::Point(g) => g.get_guid(),
			NavGraph::NavMesh(g) => g.get_guid(),
		}
	}
	pub fn set_guid(&mut self, guid: Uuid) {
		match self {
			NavGraph::Grid(g) => g.set_guid(guid),
			NavGraph::Point(g) => g.set_guid(guid),
			NavGraph::NavMesh(g) => g.set_guid(guid),
		}
	}
	/// Index of the graph within [Graphs]
	pub fn get_graph_index(&self) -> u8 {
		match self {
			NavGraph::Grid(g) => g.get_graph_index(),
			NavGraph::Point(g) => g.get_graph_index(),
			NavGraph::NavMesh(g) => g.get_graph_index(),
		}
	}
	/// Store `index` on the graph itself
	fn store_graph_index(&mut self, index: u8) {
		match self {
			NavGraph::Grid(g) => g.store_graph_index(index),
			NavGraph::Point(g) => g.store_graph_index(index),
			NavGraph::NavMesh(g) => g.store_graph_index(index),
		}
	}
	/// Move the graph to `index`, every node and intra-graph connection is
	/// rewritten to match
	fn set_graph_index(&mut self, index: u8) {
		let old = self.get_graph_index();
		for node in self.get_nodes_mut() {
			node.set_graph_index(index);
			remap_connections(node, &[(old, index)]);
		}
		self.store_graph_index(index);
	}
	/// Move the graph to `index` without touching connections
	fn relabel(&mut self, index: u8) {
		for node in self.get_nodes_mut() {
			node.set_graph_index(index);
		}
		self.store_graph_index(index);
	}
	pub fn get_nodes(&self) -> &[Node] {
		match self {
			NavGraph::Grid(g) => g.get_nodes(),
			NavGraph::Point(g) => g.get_nodes(),
			NavGraph::NavMesh(g) => g.get_nodes(),
		}
	}
	pub fn get_nodes_mut(&mut self) -> &mut [Node] {
		match self {
			NavGraph::Grid(g) => g.get_nodes_mut(),
			NavGraph::Point(g) => g.get_nodes_mut(),
			NavGraph::NavMesh(g) => g.get_nodes_mut(),
		}
	}
	/// Find the node closest to `position`. The result may ignore the
	/// constraint, in which case [NearestInfo::constrained_node] can hold a
	/// suitable alternative
	pub fn get_nearest(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		match self {
			NavGraph::Grid(g) => g.get_nearest(position, constraint),
			NavGraph::Point(g) => g.get_nearest(position, constraint),
			NavGraph::NavMesh(g) => g.get_nearest(position, constraint),
		}
	}
	/// Find the closest node satisfying `constraint`, a thorough fallback for
	/// when [NavGraph::get_nearest] came up short
	pub fn get_nearest_force(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		match self {
			NavGraph::Grid(g) => g.get_nearest_force(position, constraint),
			NavGraph::Point(g) => g.get_nearest_force(position, constraint),
			NavGraph::NavMesh(g) => g.get_nearest_force(position, constraint),
		}
	}
	/// Apply `update` to every node within its bounds
	pub fn update_area(&mut self, update: &mut GraphUpdateObject) {
		match self {
			NavGraph::Grid(g) => g.update_area(update),
			NavGraph::Point(g) => g.update_area(update),
			NavGraph::NavMesh(g) => g.update_area(update),
		}
	}
	/// Recompute connectivity around nodes whose walkability was changed
	/// outside of [NavGraph::update_area]
	pub fn refresh_connections(&mut self, touched: &[u32]) {
		if let NavGraph::Grid(g) = self {
			g.refresh_connections(touched);
		}
	}
	/// Collect every outgoing edge of the node at `index` into `out`
	pub fn neighbours(&self, index: usize, out: &mut Vec<Connection>) {
		match self {
			NavGraph::Grid(g) => g.neighbours(index, out),
			_ => {
				if let Some(node) = self.get_nodes().get(index) {
					out.extend_from_slice(node.get_connections());
				}
			}
		}
	}
	/// Whether the node at `index` has an edge to `to`
	pub fn has_link(&self, index: usize, to: NodeRef) -> bool {
		match self {
			NavGraph::Grid(g) => g.has_link(index, to),
			_ => self
				.get_nodes()
				.get(index)
				.is_some_and(|n| n.has_connection(to)),
		}
	}
}

/// Point every connection of `node` whose target graph appears as the first
/// element of a `mapping` pair at the second element instead
fn remap_connections(node: &mut Node, mapping: &[(u8, u8)]) {
	let remapped: Vec<Connection> = node
		.get_connections()
		.iter()
		.map(|c| {
			let target = c.get_node();
			let graph = mapping
				.iter()
				.find(|(old, _)| *old == target.get_graph())
				.map_or(target.get_graph(), |(_, new)| *new);
			Connection::new(NodeRef::new(graph, target.get_index()), c.get_cost())
		})
		.collect();
	node.clear_connections();
	for c in remapped {
		node.add_connection(c.get_node(), c.get_cost());
	}
}

/// Every graph known to an engine. The position of a graph in the list is
/// its graph index
#[derive(Clone, Debug, Default)]
pub struct Graphs {
	/// Graphs ordered by graph index
	graphs: Vec<NavGraph>,
}

impl Graphs {
	/// Create a new empty instance of [Graphs]
	pub fn new() -> Self {
		Graphs::default()
	}
	/// Append a graph. Returns the graph index it was assigned, or [None] if
	/// the limit of [MAX_GRAPHS] is reached
	pub fn add(&mut self, mut graph: NavGraph) -> Option<u8> {
		if self.graphs.len() >= MAX_GRAPHS {
			error!(
				"Cannot add graph, at most {} graphs are supported",
				MAX_GRAPHS
			);
			return None;
		}
		let index = self.graphs.len() as u8;
		graph.set_graph_index(index);
		debug!("Added {} graph at index {}", graph.type_name(), index);
		self.graphs.push(graph);
		Some(index)
	}
	/// Remove the graph at `index`. Later graphs shift down and their nodes
	/// are renumbered, connections into the removed graph are dropped
	pub fn remove(&mut self, index: u8) -> Option<NavGraph> {
		if index as usize >= self.graphs.len() {
			return None;
		}
		let removed = self.graphs.remove(index as usize);
		for graph in self.graphs.iter_mut() {
			for node in graph.get_nodes_mut() {
				node.retain_connections(|c| c.get_node().get_graph() != index);
			}
		}
		self.reassign_indices();
		Some(removed)
	}
	/// Replace the graph at `index`, keeping its graph index
	pub fn replace(&mut self, index: u8, mut graph: NavGraph) -> Option<NavGraph> {
		let slot = self.graphs.get_mut(index as usize)?;
		graph.set_graph_index(index);
		Some(std::mem::replace(slot, graph))
	}
	/// Rewrite the graph index of every graph and every connection so they
	/// match the list order again
	fn reassign_indices(&mut self) {
		let mapping: Vec<(u8, u8)> = self
			.graphs
			.iter()
			.enumerate()
			.map(|(new, g)| (g.get_graph_index(), new as u8))
			.collect();
		for graph in self.graphs.iter_mut() {
			for node in graph.get_nodes_mut() {
				remap_connections(node, &mapping);
			}
		}
		for (new, graph) in self.graphs.iter_mut().enumerate() {
			graph.relabel(new as u8);
		}
	}
	/// Bring `loaded` graphs into the set. A graph whose GUID matches an
	/// existing one replaces it in place, the rest are appended. Connections
	/// between loaded graphs follow them to their new indices. Returns the
	/// index each loaded graph ended up at
	pub fn merge_loaded(&mut self, loaded: Graphs) -> Vec<u8> {
		let mut appended = self.graphs.len();
		let mut mapping = Vec::with_capacity(loaded.len());
		for graph in loaded.graphs.iter() {
			let target = match self.find_by_guid(graph.get_guid()) {
				Some(existing) => existing,
				None => {
					let index = appended as u8;
					appended += 1;
					index
				}
			};
			mapping.push((graph.get_graph_index(), target));
		}
		let mut placed = Vec::with_capacity(mapping.len());
		for (mut graph, (_, target)) in loaded.graphs.into_iter().zip(mapping.iter()) {
			if *target as usize >= MAX_GRAPHS {
				error!("Cannot merge {} graph, at most {} graphs are supported", graph.type_name(), MAX_GRAPHS);
				continue;
			}
			for node in graph.get_nodes_mut() {
				remap_connections(node, &mapping);
			}
			graph.relabel(*target);
			if (*target as usize) < self.graphs.len() {
				debug!("Replaced graph {} with its loaded version", target);
				self.graphs[*target as usize] = graph;
			} else {
				self.graphs.push(graph);
			}
			placed.push(*target);
		}
		placed
	}
	pub fn get(&self, index: u8) -> Option<&NavGraph> {
		self.graphs.get(index as usize)
	}
	pub fn get_mut(&mut self, index: u8) -> Option<&mut NavGraph> {
		self.graphs.get_mut(index as usize)
	}
	/// Find a graph by its GUID
	pub fn find_by_guid(&self, guid: Uuid) -> Option<u8> {
		self.graphs
			.iter()
			.position(|g| g.get_guid() == guid)
			.map(|i| i as u8)
	}
	pub fn len(&self) -> usize {
		self.graphs.len()
	}
	pub fn is_empty(&self) -> bool {
		self.graphs.is_empty()
	}
	pub fn iter(&self) -> impl Iterator<Item = &NavGraph> {
		self.graphs.iter()
	}
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NavGraph> {
		self.graphs.iter_mut()
	}
	/// Total number of nodes across all graphs
	pub fn total_nodes(&self) -> usize {
		self.graphs.iter().map(|g| g.get_nodes().len()).sum()
	}
	/// Get a node by reference
	pub fn node(&self, node: NodeRef) -> Option<&Node> {
		self.graphs
			.get(node.get_graph() as usize)?
			.get_nodes()
			.get(node.index_usize())
	}
	/// Get a mutable node by reference
	pub fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
		self.graphs
			.get_mut(node.get_graph() as usize)?
			.get_nodes_mut()
			.get_mut(node.index_usize())
	}
	/// Iterate over every node reference of every graph
	pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
		self.graphs.iter().enumerate().flat_map(|(g, graph)| {
			(0..graph.get_nodes().len() as u32).map(move |i| NodeRef::new(g as u8, i))
		})
	}
	/// Collect the outgoing edges of `node` into `out`, the buffer is cleared
	/// first
	pub fn neighbours(&self, node: NodeRef, out: &mut Vec<Connection>) {
		out.clear();
		if let Some(graph) = self.graphs.get(node.get_graph() as usize) {
			graph.neighbours(node.index_usize(), out);
		}
	}
	/// Whether `from` has an edge towards `to`
	pub fn has_link(&self, from: NodeRef, to: NodeRef) -> bool {
		self.graphs
			.get(from.get_graph() as usize)
			.is_some_and(|g| g.has_link(from.index_usize(), to))
	}
	/// Add an edge in each direction between two nodes which may belong to
	/// different graphs
	pub fn connect(&mut self, a: NodeRef, b: NodeRef, cost: u32) -> bool {
		if self.node(a).is_none() || self.node(b).is_none() {
			warn!("Cannot connect {:?} and {:?}, node does not exist", a, b);
			return false;
		}
		if let Some(n) = self.node_mut(a) {
			n.add_connection(b, cost);
		}
		if let Some(n) = self.node_mut(b) {
			n.add_connection(a, cost);
		}
		true
	}
	/// Sever the link between two nodes in both directions
	pub fn disconnect(&mut self, a: NodeRef, b: NodeRef) -> bool {
		let mut found = false;
		if let Some(n) = self.node_mut(a) {
			found |= n.remove_connection(b);
		}
		if let Some(n) = self.node_mut(b) {
			found |= n.remove_connection(a);
		}
		found
	}
	/// Zero the generation tag and parent of every node
	pub fn clear_search_state(&mut self) {
		for graph in self.graphs.iter_mut() {
			for node in graph.get_nodes_mut() {
				node.clear_search_state();
			}
		}
	}
	/// Query every graph for the node nearest to `position` and pick the best
	/// one by distance weighted with the priority each graph claims.
	///
	/// With `prioritize` set the first graph returning a node closer than
	/// `prioritize_limit` world units wins outright. If the winner does not
	/// satisfy `constraint` its constrained alternative is used, failing that
	/// the owning graph does a forced search
	pub fn get_nearest(
		&self,
		position: Vec3,
		constraint: &NNConstraint,
		prioritize: bool,
		prioritize_limit: f32,
	) -> NearestInfo {
		let mut best: Option<(usize, NearestInfo)> = None;
		let mut min_weighted = f32::INFINITY;
		for (i, graph) in self.graphs.iter().enumerate() {
			let info = graph.get_nearest(position, constraint);
			if info.node.is_none() {
				continue;
			}
			let dist = (info.clamped_position - position).length();
			if prioritize && dist < prioritize_limit {
				best = Some((i, info));
				break;
			}
			let weighted = dist * info.priority.factor();
			if best.is_none() || weighted < min_weighted {
				min_weighted = weighted;
				best = Some((i, info));
			}
		}
		let Some((graph_index, mut info)) = best else {
			return NearestInfo::default();
		};
		if info
			.node
			.and_then(|n| self.node(n))
			.is_some_and(|n| constraint.suitable(n))
		{
			return info;
		}
		if info.promote_constrained()
			&& info
				.node
				.and_then(|n| self.node(n))
				.is_some_and(|n| constraint.suitable(n))
		{
			return info;
		}
		let forced = self.graphs[graph_index].get_nearest_force(position, constraint);
		if forced
			.node
			.and_then(|n| self.node(n))
			.is_some_and(|n| constraint.suitable(n))
		{
			forced
		} else {
			NearestInfo::default()
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn point_graph(points: &[Vec3]) -> NavGraph {
		let mut graph = PointGraph::new(PointGraphSettings::default());
		graph.scan(points);
		NavGraph::Point(graph)
	}
	#[test]
	fn add_assigns_indices() {
		let mut graphs = Graphs::new();
		let a = graphs.add(point_graph(&[Vec3::ZERO])).unwrap();
		let b = graphs.add(point_graph(&[Vec3::ONE])).unwrap();
		assert_eq!((0, 1), (a, b));
		assert_eq!(1, graphs.node(NodeRef::new(1, 0)).unwrap().get_graph_index());
	}
	#[test]
	fn remove_renumbers_and_drops_links() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::ZERO]));
		graphs.add(point_graph(&[Vec3::X]));
		graphs.add(point_graph(&[Vec3::Z]));
		graphs.connect(NodeRef::new(0, 0), NodeRef::new(2, 0), 100);
		graphs.connect(NodeRef::new(1, 0), NodeRef::new(2, 0), 100);
		graphs.remove(0);
		assert_eq!(2, graphs.len());
		let moved = graphs.node(NodeRef::new(1, 0)).unwrap();
		assert_eq!(1, moved.get_graph_index());
		// the link from the old graph 1 now points from graph 0 into graph 1
		assert_eq!(vec![Connection::new(NodeRef::new(0, 0), 100)], moved.get_connections().to_vec());
	}
	#[test]
	fn cross_graph_connection() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::ZERO]));
		graphs.add(point_graph(&[Vec3::X]));
		assert!(graphs.connect(NodeRef::new(0, 0), NodeRef::new(1, 0), 100));
		assert!(graphs.has_link(NodeRef::new(1, 0), NodeRef::new(0, 0)));
		assert!(graphs.disconnect(NodeRef::new(0, 0), NodeRef::new(1, 0)));
		assert!(!graphs.has_link(NodeRef::new(0, 0), NodeRef::new(1, 0)));
	}
	#[test]
	fn merge_replaces_by_guid_and_appends() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::ZERO]));
		let guid = graphs.get(0).unwrap().get_guid();
		let mut loaded = Graphs::new();
		loaded.add(point_graph(&[Vec3::ZERO, Vec3::X]));
		loaded.get_mut(0).unwrap().set_guid(guid);
		loaded.add(point_graph(&[Vec3::Z]));
		loaded.connect(NodeRef::new(0, 1), NodeRef::new(1, 0), 100);
		// the second loaded graph lands at index 1 either way, shift it
		graphs.add(point_graph(&[Vec3::Y]));
		assert_eq!(vec![0, 2], graphs.merge_loaded(loaded));
		assert_eq!(3, graphs.len());
		assert_eq!(2, graphs.get(0).unwrap().get_nodes().len());
		assert!(graphs.has_link(NodeRef::new(0, 1), NodeRef::new(2, 0)));
		assert!(graphs.has_link(NodeRef::new(2, 0), NodeRef::new(0, 1)));
		assert_eq!(2, graphs.node(NodeRef::new(2, 0)).unwrap().get_graph_index());
	}
	#[test]
	fn nearest_prefers_higher_priority() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::new(1.0, 0.0, 0.0)]));
		let mut grid = GridGraph::new(GridGraphSettings {
			width: 4,
			depth: 4,
			center: Vec3::new(10.0, 0.0, 10.0),
			..Default::default()
		});
		grid.set_nearest_priority(NearestNodePriority::ReallyHigh);
		graphs.add(NavGraph::Grid(grid));
		let info = graphs.get_nearest(Vec3::ZERO, &NNConstraint::default(), false, 1.0);
		assert_eq!(1, info.node.unwrap().get_graph());
	}
	#[test]
	fn nearest_prioritize_limit_wins_early() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::new(0.5, 0.0, 0.0)]));
		graphs.add(point_graph(&[Vec3::new(0.1, 0.0, 0.0)]));
		let info = graphs.get_nearest(Vec3::ZERO, &NNConstraint::default(), true, 1.0);
		assert_eq!(0, info.node.unwrap().get_graph());
		let info = graphs.get_nearest(Vec3::ZERO, &NNConstraint::default(), false, 1.0);
		assert_eq!(1, info.node.unwrap().get_graph());
	}
	#[test]
	fn nearest_falls_back_to_suitable_node() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)]));
		graphs.node_mut(NodeRef::new(0, 0)).unwrap().set_walkable(false);
		let info = graphs.get_nearest(Vec3::ZERO, &NNConstraint::default(), false, 1.0);
		assert_eq!(NodeRef::new(0, 1), info.node.unwrap());
	}
	#[test]
	fn nearest_none_when_nothing_suitable() {
		let mut graphs = Graphs::new();
		graphs.add(point_graph(&[Vec3::ZERO]));
		graphs.node_mut(NodeRef::new(0, 0)).unwrap().set_walkable(false);
		let info = graphs.get_nearest(Vec3::ZERO, &NNConstraint::default(), false, 1.0);
		assert!(info.node.is_none());
	}
}
