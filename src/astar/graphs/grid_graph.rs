//! A uniform grid of nodes laid out in the XZ plane.
//!
//! Nodes are stored row by row, the node at column `x` and row `z` lives at
//! index `z * width + x`. Adjacency to the 8 surrounding cells is a packed
//! flag per node where bit `i` refers to the direction `i` below:
//!
//! ```text
//!  _____________
//! | 7  | 2  | 6  |
//! |____|____|____|
//! | 3  |    | 1  |
//! |____|____|____|
//! | 4  | 0  | 5  |
//! |____|____|____|
//!          (-z)
//! ```
//!
//! Bits `0..4` are the orthogonal neighbours and bits `4..8` the diagonals
//!

use crate::prelude::*;
use bevy::prelude::*;
use uuid::Uuid;

/// Column delta of each neighbour direction
pub const NEIGHBOUR_X_OFFSETS: [i32; 8] = [0, 1, 0, -1, 1, 1, -1, -1];
/// Row delta of each neighbour direction
pub const NEIGHBOUR_Z_OFFSETS: [i32; 8] = [-1, 0, 1, 0, -1, 1, 1, -1];

/// Grid connectivity
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum NumNeighbours {
	/// Orthogonal neighbours only
	Four,
	/// Orthogonal and diagonal neighbours
	#[default]
	Eight,
}

/// Dimensions and connection rules of a [GridGraph]
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Copy, PartialEq, Debug, Reflect)]
pub struct GridGraphSettings {
	/// Number of columns along `x`
	pub width: u32,
	/// Number of rows along `z`
	pub depth: u32,
	/// World size of a single cell
	pub node_size: f32,
	/// World position of the middle of the grid
	pub center: Vec3,
	/// Allow diagonal moves past a single blocked orthogonal neighbour
	pub cut_corners: bool,
	/// Four or eight way connectivity
	pub neighbours: NumNeighbours,
	/// Largest height difference an orthogonal link may span in world units,
	/// `0` disables the check
	pub max_climb: f32,
	/// Number of rings [GridGraph::get_nearest_force] will search
	pub nearest_force_limit: u32,
	/// Extra rings searched after the first suitable node is found
	pub nearest_force_overlap: u32,
}

impl Default for GridGraphSettings {
	fn default() -> Self {
		GridGraphSettings {
			width: 10,
			depth: 10,
			node_size: 1.0,
			center: Vec3::ZERO,
			cut_corners: true,
			neighbours: NumNeighbours::Eight,
			max_climb: 0.0,
			nearest_force_limit: 40,
			nearest_force_overlap: 2,
		}
	}
}

/// Describes one grid cell as produced by a [GridSampler]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CellSample {
	/// Whether the cell can be traversed
	pub walkable: bool,
	/// World height of the cell surface
	pub height: f32,
	/// Extra traversal cost
	pub penalty: u32,
	/// Tags of the node
	pub tags: u32,
}

impl Default for CellSample {
	fn default() -> Self {
		CellSample {
			walkable: true,
			height: 0.0,
			penalty: 0,
			tags: DEFAULT_NODE_TAGS,
		}
	}
}

/// Supplies the geometry of a grid during [GridGraph::scan]. How terrain is
/// inspected is up to the implementor
pub trait GridSampler {
	/// Describe the cell at column `x`, row `z` whose flat centre sits at
	/// `world_position`
	fn sample(&self, x: u32, z: u32, world_position: Vec3) -> CellSample;
}

impl<F> GridSampler for F
where
	F: Fn(u32, u32, Vec3) -> CellSample,
{
	fn sample(&self, x: u32, z: u32, world_position: Vec3) -> CellSample {
		self(x, z, world_position)
	}
}

/// A sampler producing a flat walkable plane at the height of the grid centre
pub struct FlatGround;

impl GridSampler for FlatGround {
	fn sample(&self, _x: u32, _z: u32, world_position: Vec3) -> CellSample {
		CellSample {
			height: world_position.y,
			..Default::default()
		}
	}
}

/// A uniform grid graph
#[derive(Clone, Debug)]
pub struct GridGraph {
	/// Layout and rules of the grid
	settings: GridGraphSettings,
	/// Stable identity used across saves
	guid: Uuid,
	/// Position of the graph within [Graphs]
	graph_index: u8,
	/// Weight of nearest-node results against other graphs
	nearest_priority: NearestNodePriority,
	/// Nodes ordered row by row
	nodes: Vec<Node>,
	/// Packed neighbour flags, one per node
	links: Vec<u8>,
	/// Edge cost of each neighbour direction
	neighbour_costs: [u32; 8],
}

impl GridGraph {
	/// Identifier used when persisting the graph
	pub const TYPE_NAME: &'static str = "GridGraph";
	/// Create a new instance of [GridGraph] where every cell is walkable and
	/// flat.
	///
	/// Panics if the grid has no cells or a non-positive node size
	pub fn new(settings: GridGraphSettings) -> Self {
		if settings.width == 0 || settings.depth == 0 {
			panic!(
				"Grid dimensions `({}, {})` must both be greater than zero",
				settings.width, settings.depth
			);
		}
		if settings.node_size <= 0.0 {
			panic!("Grid node size must be greater than zero, got {}", settings.node_size);
		}
		let mut graph = GridGraph {
			settings,
			guid: Uuid::new_v4(),
			graph_index: 0,
			nearest_priority: NearestNodePriority::Normal,
			nodes: Vec::new(),
			links: Vec::new(),
			neighbour_costs: [0; 8],
		};
		graph.scan(&FlatGround);
		graph
	}
	/// Rebuild every node and its connectivity from `sampler`
	pub fn scan(&mut self, sampler: &dyn GridSampler) {
		self.set_up_costs();
		let count = (self.settings.width * self.settings.depth) as usize;
		self.nodes = Vec::with_capacity(count);
		self.links = vec![0; count];
		for z in 0..self.settings.depth {
			for x in 0..self.settings.width {
				let flat = self.cell_position(x, z, self.settings.center.y);
				let sample = sampler.sample(x, z, flat);
				let mut node = Node::new(Int3::from_vec3(Vec3::new(flat.x, sample.height, flat.z)));
				node.set_walkable(sample.walkable);
				node.set_penalty(sample.penalty);
				node.set_tags(sample.tags);
				node.set_graph_index(self.graph_index);
				self.nodes.push(node);
			}
		}
		self.calculate_all_connections();
		debug!(
			"Scanned grid graph {}x{} with {} nodes",
			self.settings.width,
			self.settings.depth,
			self.nodes.len()
		);
	}
	/// Derive the edge cost of each neighbour direction from the node size
	fn set_up_costs(&mut self) {
		let straight = (self.settings.node_size * INT3_PRECISION_F32).round() as u32;
		let diagonal =
			(self.settings.node_size * std::f32::consts::SQRT_2 * INT3_PRECISION_F32).round() as u32;
		for i in 0..4 {
			self.neighbour_costs[i] = straight;
			self.neighbour_costs[i + 4] = diagonal;
		}
	}
	pub fn get_settings(&self) -> &GridGraphSettings {
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
	/// Install previously scanned nodes and their neighbour flags. Rejected
	/// unless both match the grid dimensions
	pub(crate) fn set_scan(&mut self, nodes: Vec<Node>, links: Vec<u8>) -> bool {
		let count = (self.settings.width * self.settings.depth) as usize;
		if nodes.len() != count || links.len() != count {
			return false;
		}
		self.nodes = nodes;
		self.links = links;
		true
	}
	/// Get the packed neighbour flags of every node
	pub fn get_links(&self) -> &[u8] {
		&self.links
	}
	/// Get the edge cost towards each neighbour direction
	pub fn get_neighbour_costs(&self) -> [u32; 8] {
		self.neighbour_costs
	}
	/// Get the index of the node at column `x`, row `z`
	pub fn index_of(&self, x: u32, z: u32) -> Option<usize> {
		if x < self.settings.width && z < self.settings.depth {
			Some((z * self.settings.width + x) as usize)
		} else {
			None
		}
	}
	/// Get the `(column, row)` of a node index
	pub fn coords_of(&self, index: usize) -> (u32, u32) {
		let index = index as u32;
		(index % self.settings.width, index / self.settings.width)
	}
	/// Get a reference to the node at column `x`, row `z`
	pub fn node_at(&self, x: u32, z: u32) -> Option<NodeRef> {
		self.index_of(x, z)
			.map(|i| NodeRef::new(self.graph_index, i as u32))
	}
	/// World position of the corner of the grid with the lowest `x` and `z`
	fn corner(&self) -> Vec3 {
		let s = &self.settings;
		s.center
			- Vec3::new(
				s.width as f32 * s.node_size / 2.0,
				0.0,
				s.depth as f32 * s.node_size / 2.0,
			)
	}
	/// World position of the centre of a cell at height `y`
	fn cell_position(&self, x: u32, z: u32, y: f32) -> Vec3 {
		let corner = self.corner();
		Vec3::new(
			corner.x + (x as f32 + 0.5) * self.settings.node_size,
			y,
			corner.z + (z as f32 + 0.5) * self.settings.node_size,
		)
	}
	/// Convert a world position into the clamped `(column, row)` of the cell
	/// containing it
	fn cell_containing(&self, position: Vec3) -> (u32, u32) {
		let local = (position - self.corner()) / self.settings.node_size;
		let x = (local.x - 0.5).round();
		let z = (local.z - 0.5).round();
		let x = x.clamp(0.0, (self.settings.width - 1) as f32) as u32;
		let z = z.clamp(0.0, (self.settings.depth - 1) as f32) as u32;
		(x, z)
	}
	/// Change the walkability of a single cell and refresh the connections
	/// around it
	pub fn set_walkable(&mut self, x: u32, z: u32, walkable: bool) {
		if let Some(i) = self.index_of(x, z) {
			self.nodes[i].set_walkable(walkable);
			self.refresh_connections(&[i as u32]);
		} else {
			warn!("Grid cell ({}, {}) is outside of the graph", x, z);
		}
	}
	/// Whether two adjacent nodes may be linked
	fn is_valid_connection(&self, a: &Node, b: &Node) -> bool {
		if !a.is_walkable() || !b.is_walkable() {
			return false;
		}
		if self.settings.max_climb > 0.0 {
			let climb = (a.get_position().y - b.get_position().y).unsigned_abs();
			let max = (self.settings.max_climb * INT3_PRECISION_F32).round() as u32;
			if climb > max {
				return false;
			}
		}
		true
	}
	/// Neighbour of cell `(x, z)` in `direction`
	fn neighbour_index(&self, x: u32, z: u32, direction: usize) -> Option<usize> {
		let nx = x as i64 + NEIGHBOUR_X_OFFSETS[direction] as i64;
		let nz = z as i64 + NEIGHBOUR_Z_OFFSETS[direction] as i64;
		if nx < 0 || nz < 0 {
			return None;
		}
		self.index_of(nx as u32, nz as u32)
	}
	/// Recompute the neighbour flags of the cell `(x, z)`
	pub fn calculate_connections(&mut self, x: u32, z: u32) {
		let Some(index) = self.index_of(x, z) else {
			return;
		};
		let mut flags = 0_u8;
		if self.nodes[index].is_walkable() {
			for direction in 0..4 {
				if let Some(other) = self.neighbour_index(x, z, direction) {
					if self.is_valid_connection(&self.nodes[index], &self.nodes[other]) {
						flags |= 1 << direction;
					}
				}
			}
			if self.settings.neighbours == NumNeighbours::Eight {
				for direction in 4..8 {
					let first = (flags >> (direction - 4)) & 1;
					let second = (flags >> ((direction - 3) % 4)) & 1;
					let corners = first + second;
					let allowed = if self.settings.cut_corners {
						corners >= 1
					} else {
						corners == 2
					};
					if !allowed {
						continue;
					}
					if let Some(other) = self.neighbour_index(x, z, direction) {
						if self.is_valid_connection(&self.nodes[index], &self.nodes[other]) {
							flags |= 1 << direction;
						}
					}
				}
			}
		}
		self.links[index] = flags;
	}
	/// Recompute the neighbour flags of every cell
	pub fn calculate_all_connections(&mut self) {
		for z in 0..self.settings.depth {
			for x in 0..self.settings.width {
				self.calculate_connections(x, z);
			}
		}
	}
	/// Recompute the neighbour flags of the given cells and every cell next
	/// to them
	pub fn refresh_connections(&mut self, touched: &[u32]) {
		let mut dirty = Vec::new();
		for i in touched.iter() {
			let (x, z) = self.coords_of(*i as usize);
			for dz in -1_i64..=1 {
				for dx in -1_i64..=1 {
					let nx = x as i64 + dx;
					let nz = z as i64 + dz;
					if nx >= 0
						&& nz >= 0 && (nx as u32) < self.settings.width
						&& (nz as u32) < self.settings.depth
					{
						let cell = (nx as u32, nz as u32);
						if !dirty.contains(&cell) {
							dirty.push(cell);
						}
					}
				}
			}
		}
		for (x, z) in dirty {
			self.calculate_connections(x, z);
		}
	}
	/// Collect the grid neighbours of `index` followed by its extra
	/// connections
	pub fn neighbours(&self, index: usize, out: &mut Vec<Connection>) {
		let Some(flags) = self.links.get(index) else {
			return;
		};
		let (x, z) = self.coords_of(index);
		for direction in 0..8 {
			if (flags >> direction) & 1 == 1 {
				if let Some(other) = self.neighbour_index(x, z, direction) {
					out.push(Connection::new(
						NodeRef::new(self.graph_index, other as u32),
						self.neighbour_costs[direction],
					));
				}
			}
		}
		out.extend_from_slice(self.nodes[index].get_connections());
	}
	/// Whether the node at `index` links to `to` through the grid or an
	/// extra connection
	pub fn has_link(&self, index: usize, to: NodeRef) -> bool {
		let Some(flags) = self.links.get(index) else {
			return false;
		};
		if to.get_graph() == self.graph_index {
			let (x, z) = self.coords_of(index);
			for direction in 0..8 {
				if (flags >> direction) & 1 == 1
					&& self.neighbour_index(x, z, direction) == Some(to.index_usize())
				{
					return true;
				}
			}
		}
		self.nodes[index].has_connection(to)
	}
	/// The node of the cell containing `position`
	pub fn get_nearest(&self, position: Vec3, _constraint: &NNConstraint) -> NearestInfo {
		let (x, z) = self.cell_containing(position);
		let index = (z * self.settings.width + x) as usize;
		let node_position = self.nodes[index].get_position().to_vec3();
		let clamped = self.clamp_to_cell(position, x, z, node_position.y);
		NearestInfo::new(
			NodeRef::new(self.graph_index, index as u32),
			clamped,
			self.nearest_priority,
		)
	}
	/// Clamp `position` into the footprint of the cell `(x, z)`
	fn clamp_to_cell(&self, position: Vec3, x: u32, z: u32, y: f32) -> Vec3 {
		let centre = self.cell_position(x, z, y);
		let half = self.settings.node_size / 2.0;
		Vec3::new(
			position.x.clamp(centre.x - half, centre.x + half),
			y,
			position.z.clamp(centre.z - half, centre.z + half),
		)
	}
	/// Spiral outwards from the cell containing `position` looking for the
	/// closest node satisfying `constraint`.
	///
	/// Once a suitable node is found a few more rings are inspected since a
	/// node in a later ring can still be closer
	pub fn get_nearest_force(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		let (x, z) = self.cell_containing(position);
		let target = Int3::from_vec3(position);
		let mut best: Option<usize> = None;
		let mut best_dist = i64::MAX;
		let mut overlap = self.settings.nearest_force_overlap;
		let consider = |index: usize, best: &mut Option<usize>, best_dist: &mut i64| {
			let node = &self.nodes[index];
			if constraint.suitable(node) {
				let dist = (node.get_position() - target).sqr_magnitude();
				if dist < *best_dist {
					*best_dist = dist;
					*best = Some(index);
				}
			}
		};
		let start = (z * self.settings.width + x) as usize;
		consider(start, &mut best, &mut best_dist);
		if best.is_some() {
			if overlap == 0 {
				return self.forced_result(best, position);
			}
			overlap -= 1;
		}
		let (x, z) = (x as i64, z as i64);
		for w in 1..self.settings.nearest_force_limit as i64 {
			let mut ring = Vec::new();
			for nx in (x - w)..=(x + w) {
				ring.push((nx, z + w));
				ring.push((nx, z - w));
			}
			for nz in (z - w + 1)..=(z + w - 1) {
				ring.push((x - w, nz));
				ring.push((x + w, nz));
			}
			for (nx, nz) in ring {
				if nx < 0 || nz < 0 {
					continue;
				}
				if let Some(index) = self.index_of(nx as u32, nz as u32) {
					consider(index, &mut best, &mut best_dist);
				}
			}
			if best.is_some() {
				if overlap == 0 {
					break;
				}
				overlap -= 1;
			}
		}
		self.forced_result(best, position)
	}
	/// Wrap the outcome of a forced search
	fn forced_result(&self, best: Option<usize>, position: Vec3) -> NearestInfo {
		match best {
			Some(index) => {
				let (x, z) = self.coords_of(index);
				let y = self.nodes[index].get_position().to_vec3().y;
				NearestInfo::new(
					NodeRef::new(self.graph_index, index as u32),
					self.clamp_to_cell(position, x, z, y),
					self.nearest_priority,
				)
			}
			None => NearestInfo::default(),
		}
	}
	/// Apply `update` to each node inside its bounds, connectivity is
	/// recomputed around cells whose walkability may have changed
	pub fn update_area(&mut self, update: &mut GraphUpdateObject) {
		let bounds = *update.get_bounds();
		let (min_x, min_z) = self.cell_containing(bounds.get_min());
		let (max_x, max_z) = self.cell_containing(bounds.get_max());
		let mut touched = Vec::new();
		for z in min_z..=max_z {
			for x in min_x..=max_x {
				let index = (z * self.settings.width + x) as usize;
				if !bounds.contains(self.nodes[index].get_position().to_vec3()) {
					continue;
				}
				let node_ref = NodeRef::new(self.graph_index, index as u32);
				update.will_update_node(node_ref, &self.nodes[index]);
				update.apply(&mut self.nodes[index]);
				touched.push(index as u32);
			}
		}
		if update.modifies_walkability() && !touched.is_empty() {
			self.refresh_connections(&touched);
		}
	}
	/// Get the persistent [CostMap] style view of the grid, one value per
	/// cell in row order where `255` is unwalkable
	pub fn to_cost_values(&self) -> Vec<u8> {
		self.nodes
			.iter()
			.map(|n| {
				if n.is_walkable() {
					(n.get_penalty() / CostMap::PENALTY_PER_COST + 1).min(254) as u8
				} else {
					CostMap::IMPASSABLE
				}
			})
			.collect()
	}
}

/// Per-cell traversal costs of a grid, `255` marks an impassable cell and
/// any other value `v` adds a penalty of `(v - 1) * 100`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CostMap {
	/// Number of columns
	width: u32,
	/// Number of rows
	depth: u32,
	/// Values in row order
	values: Vec<u8>,
}

impl CostMap {
	/// Value of an impassable cell
	pub const IMPASSABLE: u8 = 255;
	/// Penalty each cost level above `1` adds
	pub const PENALTY_PER_COST: u32 = 100;
	/// Create a new instance of [CostMap], returns [None] when the number of
	/// values does not match the dimensions
	pub fn new(width: u32, depth: u32, values: Vec<u8>) -> Option<Self> {
		if values.len() != (width * depth) as usize {
			return None;
		}
		Some(CostMap {
			width,
			depth,
			values,
		})
	}
	pub fn get_width(&self) -> u32 {
		self.width
	}
	pub fn get_depth(&self) -> u32 {
		self.depth
	}
	/// Get the value of the cell at column `x`, row `z`
	pub fn get_value(&self, x: u32, z: u32) -> Option<u8> {
		if x < self.width && z < self.depth {
			self.values.get((z * self.width + x) as usize).copied()
		} else {
			None
		}
	}
	/// From a CSV file where each row of the file is a row of the grid
	/// generate a [CostMap]
	#[cfg(feature = "csv")]
	pub fn from_csv(path: &str) -> Result<Self, LoadError> {
		let file = std::fs::File::open(path)?;
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.trim(csv::Trim::All)
			.from_reader(file);
		let mut values = Vec::new();
		let mut width = None;
		let mut depth = 0;
		for record in rdr.records() {
			let record = record?;
			let row: Vec<u8> = record
				.iter()
				.map(|v| v.parse::<u8>())
				.collect::<Result<_, _>>()
				.map_err(|e| LoadError::Format(format!("row {}: {}", depth, e)))?;
			match width {
				None => width = Some(row.len() as u32),
				Some(w) if w as usize != row.len() => {
					return Err(LoadError::Format(format!(
						"row {} has {} columns, expected {}",
						depth,
						row.len(),
						w
					)));
				}
				_ => {}
			}
			values.extend(row);
			depth += 1;
		}
		let width = width.unwrap_or(0);
		CostMap::new(width, depth, values)
			.ok_or_else(|| LoadError::Format("cost map dimensions mismatch".to_string()))
	}
}

impl GridSampler for CostMap {
	fn sample(&self, x: u32, z: u32, world_position: Vec3) -> CellSample {
		match self.get_value(x, z) {
			Some(CostMap::IMPASSABLE) => CellSample {
				walkable: false,
				height: world_position.y,
				..Default::default()
			},
			Some(v) => CellSample {
				height: world_position.y,
				penalty: (v.max(1) as u32 - 1) * CostMap::PENALTY_PER_COST,
				..Default::default()
			},
			None => CellSample {
				height: world_position.y,
				..Default::default()
			},
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn grid(width: u32, depth: u32) -> GridGraph {
		GridGraph::new(GridGraphSettings {
			width,
			depth,
			..Default::default()
		})
	}
	#[test]
	fn edge_costs_from_node_size() {
		let g = GridGraph::new(GridGraphSettings { node_size: 2.0, ..Default::default() });
		assert_eq!([200, 200, 200, 200, 283, 283, 283, 283], g.get_neighbour_costs());
	}
	#[test]
	#[should_panic]
	fn empty_grid_is_rejected() {
		grid(0, 5);
	}
	#[test]
	fn node_positions_centred_in_cells() {
		let g = grid(4, 4);
		// corner is at (-2, -2)
		let first = g.get_nodes()[0].get_position();
		assert_eq!(Int3::new(-150, 0, -150), first);
		let last = g.get_nodes()[15].get_position();
		assert_eq!(Int3::new(150, 0, 150), last);
	}
	#[test]
	fn interior_node_has_all_links() {
		let g = grid(3, 3);
		assert_eq!(0b1111_1111, g.get_links()[4]);
		// corner (0, 0) links to east, south in +z, and the diagonal between them
		assert_eq!(0b0010_0110, g.get_links()[0]);
	}
	#[test]
	fn four_neighbours_has_no_diagonals() {
		let g = GridGraph::new(GridGraphSettings {
			width: 3,
			depth: 3,
			neighbours: NumNeighbours::Four,
			..Default::default()
		});
		assert_eq!(0b0000_1111, g.get_links()[4]);
	}
	#[test]
	fn corner_cutting_rules() {
		// block the cell east of the centre
		let mut cutting = grid(3, 3);
		cutting.set_walkable(2, 1, false);
		let centre = 4;
		// diagonal 4 (+x, -z) sits between north (0) and east (1)
		assert_eq!(1, (cutting.get_links()[centre] >> 4) & 1);
		let mut strict = GridGraph::new(GridGraphSettings {
			width: 3,
			depth: 3,
			cut_corners: false,
			..Default::default()
		});
		strict.set_walkable(2, 1, false);
		assert_eq!(0, (strict.get_links()[centre] >> 4) & 1);
		assert_eq!(0, (strict.get_links()[centre] >> 5) & 1);
		assert_eq!(1, (strict.get_links()[centre] >> 6) & 1);
	}
	#[test]
	fn max_climb_blocks_steep_links() {
		let mut g = GridGraph::new(GridGraphSettings {
			width: 2,
			depth: 1,
			max_climb: 0.5,
			..Default::default()
		});
		g.scan(&|x: u32, _z: u32, _p: Vec3| CellSample {
			height: if x == 0 { 0.0 } else { 1.0 },
			..Default::default()
		});
		assert_eq!(0, g.get_links()[0]);
		assert_eq!(0, g.get_links()[1]);
	}
	#[test]
	fn nearest_clamps_into_grid() {
		let g = grid(4, 4);
		let info = g.get_nearest(Vec3::new(100.0, 0.0, -100.0), &NNConstraint::default());
		assert_eq!(g.node_at(3, 0), info.node);
		assert_eq!(Vec3::new(2.0, 0.0, -2.0), info.clamped_position);
	}
	#[test]
	fn nearest_force_finds_walkable() {
		let mut g = grid(5, 5);
		for z in 0..5 {
			for x in 0..4 {
				g.set_walkable(x, z, false);
			}
		}
		let info = g.get_nearest_force(Vec3::new(-2.0, 0.0, 0.0), &NNConstraint::default());
		assert_eq!(g.node_at(4, 2), info.node);
	}
	#[test]
	fn update_area_blocks_and_relinks() {
		let mut g = grid(3, 3);
		let mut update = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::new(0.5, 10.0, 0.5)))
			.with_walkability(false);
		g.update_area(&mut update);
		assert!(!g.get_nodes()[4].is_walkable());
		assert_eq!(0, g.get_links()[4]);
		// west-centre no longer links east
		assert_eq!(0, (g.get_links()[3] >> 1) & 1);
	}
	#[test]
	fn neighbours_include_extra_connections() {
		let mut g = grid(2, 1);
		let far = NodeRef::new(3, 7);
		g.get_nodes_mut()[0].add_connection(far, 999);
		let mut out = Vec::new();
		g.neighbours(0, &mut out);
		assert_eq!(2, out.len());
		assert!(g.has_link(0, far));
		assert!(g.has_link(0, NodeRef::new(0, 1)));
	}
	#[test]
	fn cost_map_sampler() {
		let map = CostMap::new(2, 2, vec![1, 255, 3, 1]).unwrap();
		let mut g = grid(2, 2);
		g.scan(&map);
		assert!(!g.get_nodes()[1].is_walkable());
		assert_eq!(200, g.get_nodes()[2].get_penalty());
		assert_eq!(vec![1, 255, 3, 1], g.to_cost_values());
	}
	#[test]
	#[cfg(feature = "csv")]
	fn cost_map_from_csv() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/csv/walled_grid.csv";
		let map = CostMap::from_csv(&path).unwrap();
		assert_eq!(10, map.get_width());
		assert_eq!(10, map.get_depth());
		assert_eq!(Some(255), map.get_value(5, 0));
	}
}
