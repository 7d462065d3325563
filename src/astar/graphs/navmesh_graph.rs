//! A navigation mesh where every triangle becomes a node placed at its
//! centroid. Triangles sharing an edge are linked
//!
//! Triangles are stored clockwise when viewed from above (looking down `-y`),
//! all containment tests happen in the XZ plane
//!

use crate::prelude::*;
use bevy::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

/// Transform applied to source vertices during a scan
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Copy, PartialEq, Debug, Reflect)]
pub struct NavMeshGraphSettings {
	/// Translation added after scaling
	pub offset: Vec3,
	/// Uniform scale of the source mesh
	pub scale: f32,
}

impl Default for NavMeshGraphSettings {
	fn default() -> Self {
		NavMeshGraphSettings {
			offset: Vec3::ZERO,
			scale: 1.0,
		}
	}
}

/// Signed doubled area of `a, b, c` in the XZ plane, negative when clockwise
fn cross_xz(a: Int3, b: Int3, c: Int3) -> i64 {
	(b.x as i64 - a.x as i64) * (c.z as i64 - a.z as i64)
		- (c.x as i64 - a.x as i64) * (b.z as i64 - a.z as i64)
}

/// Whether `a, b, c` wind clockwise seen from above
pub fn is_clockwise(a: Int3, b: Int3, c: Int3) -> bool {
	cross_xz(a, b, c) < 0
}

/// Whether two XZ segments `a1-a2` and `b1-b2` touch
fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
	/// Orientation of `c` relative to `a-b`
	fn orient(a: Vec2, b: Vec2, c: Vec2) -> f32 {
		(b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
	}
	/// Whether `c`, colinear with `a-b`, lies within its bounding box
	fn on_segment(a: Vec2, b: Vec2, c: Vec2) -> bool {
		c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
	}
	let d1 = orient(b1, b2, a1);
	let d2 = orient(b1, b2, a2);
	let d3 = orient(a1, a2, b1);
	let d4 = orient(a1, a2, b2);
	if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
		&& ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
	{
		return true;
	}
	(d1 == 0.0 && on_segment(b1, b2, a1))
		|| (d2 == 0.0 && on_segment(b1, b2, a2))
		|| (d3 == 0.0 && on_segment(a1, a2, b1))
		|| (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Closest point to `p` on the triangle `a, b, c` in 3D
pub fn closest_point_on_triangle(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> Vec3 {
	let ab = b - a;
	let ac = c - a;
	let ap = p - a;
	let d1 = ab.dot(ap);
	let d2 = ac.dot(ap);
	if d1 <= 0.0 && d2 <= 0.0 {
		return a;
	}
	let bp = p - b;
	let d3 = ab.dot(bp);
	let d4 = ac.dot(bp);
	if d3 >= 0.0 && d4 <= d3 {
		return b;
	}
	let vc = d1 * d4 - d3 * d2;
	if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
		let v = d1 / (d1 - d3);
		return a + ab * v;
	}
	let cp = p - c;
	let d5 = ab.dot(cp);
	let d6 = ac.dot(cp);
	if d6 >= 0.0 && d5 <= d6 {
		return c;
	}
	let vb = d5 * d2 - d1 * d6;
	if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
		let w = d2 / (d2 - d6);
		return a + ac * w;
	}
	let va = d3 * d6 - d5 * d4;
	if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
		let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
		return b + (c - b) * w;
	}
	let denom = 1.0 / (va + vb + vc);
	let v = vb * denom;
	let w = vc * denom;
	a + ab * v + ac * w
}

/// A triangle navigation mesh
#[derive(Clone, Debug)]
pub struct NavMeshGraph {
	/// Source transform
	settings: NavMeshGraphSettings,
	/// Stable identity used across saves
	guid: Uuid,
	/// Position of the graph within [Graphs]
	graph_index: u8,
	/// Weight of nearest-node results against other graphs
	nearest_priority: NearestNodePriority,
	/// Deduplicated vertices
	vertices: Vec<Int3>,
	/// Vertex indices of each node, clockwise
	triangles: Vec<[u32; 3]>,
	/// One node per triangle
	nodes: Vec<Node>,
}

impl NavMeshGraph {
	/// Identifier used when persisting the graph
	pub const TYPE_NAME: &'static str = "NavMeshGraph";
	/// Create a new empty instance of [NavMeshGraph]
	pub fn new(settings: NavMeshGraphSettings) -> Self {
		NavMeshGraph {
			settings,
			guid: Uuid::new_v4(),
			graph_index: 0,
			nearest_priority: NearestNodePriority::Normal,
			vertices: Vec::new(),
			triangles: Vec::new(),
			nodes: Vec::new(),
		}
	}
	pub fn get_settings(&self) -> &NavMeshGraphSettings {
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
	pub fn get_vertices(&self) -> &[Int3] {
		&self.vertices
	}
	/// Get the vertex indices of each triangle
	pub fn get_triangles(&self) -> &[[u32; 3]] {
		&self.triangles
	}
	/// Replace the mesh wholesale, used when restoring a saved graph. Returns
	/// `false` if the parts do not fit together
	pub(crate) fn set_mesh(
		&mut self,
		vertices: Vec<Int3>,
		triangles: Vec<[u32; 3]>,
		nodes: Vec<Node>,
	) -> bool {
		let in_range = triangles
			.iter()
			.all(|t| t.iter().all(|v| (*v as usize) < vertices.len()));
		if !in_range || triangles.len() != nodes.len() {
			return false;
		}
		self.vertices = vertices;
		self.triangles = triangles;
		self.nodes = nodes;
		true
	}
	/// Corners of the triangle of node `index`
	fn corners(&self, index: usize) -> [Int3; 3] {
		let t = self.triangles[index];
		[
			self.vertices[t[0] as usize],
			self.vertices[t[1] as usize],
			self.vertices[t[2] as usize],
		]
	}
	/// Build one node per triangle of the mesh `vertices`/`indices` where
	/// every three indices form a triangle. Coincident vertices are merged
	/// first so that adjacency can be found by index.
	///
	/// A malformed index list leaves the graph empty
	pub fn scan(&mut self, vertices: &[Vec3], indices: &[u32]) {
		self.vertices.clear();
		self.triangles.clear();
		self.nodes.clear();
		if vertices.is_empty() || indices.is_empty() {
			return;
		}
		if indices.len() % 3 != 0 {
			error!(
				"Navmesh index count {} is not a multiple of 3, the graph is left empty",
				indices.len()
			);
			return;
		}
		if let Some(bad) = indices.iter().find(|i| **i as usize >= vertices.len()) {
			error!(
				"Navmesh index {} is out of range of {} vertices, the graph is left empty",
				bad,
				vertices.len()
			);
			return;
		}
		let mut hashed: HashMap<Int3, u32> = HashMap::new();
		let mut remap = Vec::with_capacity(vertices.len());
		for v in vertices.iter() {
			let p = Int3::from_vec3(*v * self.settings.scale + self.settings.offset);
			let next = self.vertices.len() as u32;
			let id = *hashed.entry(p).or_insert_with(|| next);
			if id == next {
				self.vertices.push(p);
			}
			remap.push(id);
		}
		for chunk in indices.chunks_exact(3) {
			let mut t = [
				remap[chunk[0] as usize],
				remap[chunk[1] as usize],
				remap[chunk[2] as usize],
			];
			let [a, b, c] = [
				self.vertices[t[0] as usize],
				self.vertices[t[1] as usize],
				self.vertices[t[2] as usize],
			];
			if cross_xz(a, b, c) == 0 {
				warn!("Navmesh triangle {} is degenerate when seen from above", self.triangles.len());
			} else if !is_clockwise(a, b, c) {
				t.swap(0, 2);
			}
			let centroid = (a.to_vec3() + b.to_vec3() + c.to_vec3()) / 3.0;
			let mut node = Node::new(Int3::from_vec3(centroid));
			node.set_graph_index(self.graph_index);
			self.triangles.push(t);
			self.nodes.push(node);
		}
		self.calculate_connections();
		debug!(
			"Scanned navmesh graph with {} vertices and {} nodes",
			self.vertices.len(),
			self.nodes.len()
		);
	}
	/// Link every pair of triangles sharing exactly two vertices
	fn calculate_connections(&mut self) {
		let mut identical = 0;
		for i in 0..self.triangles.len() {
			self.nodes[i].clear_connections();
			for x in 0..self.triangles.len() {
				if x == i {
					continue;
				}
				let shared = self.triangles[i]
					.iter()
					.map(|v| self.triangles[x].iter().filter(|o| *o == v).count())
					.sum::<usize>();
				if shared >= 3 {
					identical += 1;
				} else if shared == 2 {
					let cost =
						(self.nodes[i].get_position() - self.nodes[x].get_position()).cost_magnitude();
					let to = NodeRef::new(self.graph_index, x as u32);
					self.nodes[i].add_connection(to, cost);
				}
			}
		}
		if identical > 0 {
			error!(
				"One or more navmesh triangles are identical to other triangles, number of triangles with error: {}",
				identical
			);
		}
	}
	/// Whether `p` lies within the triangle of node `index` in the XZ plane.
	/// Points on an edge count as inside
	pub fn contains_point(&self, index: usize, p: Int3) -> bool {
		let [a, b, c] = self.corners(index);
		cross_xz(a, b, p) <= 0 && cross_xz(b, c, p) <= 0 && cross_xz(c, a, p) <= 0
	}
	/// Get the point of the triangle of node `index` closest to `p`
	pub fn closest_point_on_node(&self, index: usize, p: Vec3) -> Vec3 {
		let [a, b, c] = self.corners(index);
		closest_point_on_triangle(a.to_vec3(), b.to_vec3(), c.to_vec3(), p)
	}
	/// Linear search over all triangles. A triangle containing `position` in
	/// XZ is preferred, the one with the smallest vertical distance to it
	/// wins and claims a high priority. Failing that the triangle with the
	/// closest centroid is picked with a low priority
	pub fn get_nearest(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		if self.nodes.is_empty() {
			return NearestInfo::default();
		}
		let pos = Int3::from_vec3(position);
		let mut inside: Option<(usize, i64)> = None;
		let mut inside_const: Option<(usize, i64)> = None;
		let mut outside: Option<(usize, i64)> = None;
		let mut outside_const: Option<(usize, i64)> = None;
		let closer = |best: &Option<(usize, i64)>, d: i64| best.is_none_or(|(_, b)| d < b);
		for (i, node) in self.nodes.iter().enumerate() {
			let suitable = constraint.suitable(node);
			if self.contains_point(i, pos) {
				let dist = (node.get_position().y as i64 - pos.y as i64).abs();
				if closer(&inside, dist) {
					inside = Some((i, dist));
				}
				if suitable && closer(&inside_const, dist) {
					inside_const = Some((i, dist));
				}
			} else {
				let dist = (node.get_position() - pos).sqr_magnitude();
				if closer(&outside, dist) {
					outside = Some((i, dist));
				}
				if suitable && closer(&outside_const, dist) {
					outside_const = Some((i, dist));
				}
			}
		}
		let (index, priority) = match (inside, outside) {
			(Some((i, _)), _) => (i, NearestNodePriority::High),
			(None, Some((i, _))) => (i, NearestNodePriority::Low),
			(None, None) => return NearestInfo::default(),
		};
		let mut info = NearestInfo::new(
			NodeRef::new(self.graph_index, index as u32),
			self.closest_point_on_node(index, position),
			priority,
		);
		if let Some((c, _)) = inside_const.or(outside_const) {
			info.constrained_node = Some(NodeRef::new(self.graph_index, c as u32));
			info.constrained_clamped_position = self.closest_point_on_node(c, position);
		}
		info
	}
	/// The nearest triangle satisfying `constraint`, found by the same linear
	/// search as [NavMeshGraph::get_nearest]
	pub fn get_nearest_force(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		let mut info = self.get_nearest(position, constraint);
		if info.promote_constrained() {
			info.constrained_node = None;
			info
		} else {
			NearestInfo::default()
		}
	}
	/// Whether the triangle of node `index` overlaps the XZ rectangle
	/// `min..max`
	fn intersects_rect(&self, index: usize, min: Vec2, max: Vec2) -> bool {
		let corners = self.corners(index);
		let flat: Vec<Vec2> = corners
			.iter()
			.map(|c| {
				let v = c.to_vec3();
				Vec2::new(v.x, v.z)
			})
			.collect();
		if flat
			.iter()
			.any(|v| v.x >= min.x && v.x <= max.x && v.y >= min.y && v.y <= max.y)
		{
			return true;
		}
		if flat.iter().all(|v| v.x < min.x)
			|| flat.iter().all(|v| v.x > max.x)
			|| flat.iter().all(|v| v.y < min.y)
			|| flat.iter().all(|v| v.y > max.y)
		{
			return false;
		}
		let rect = [
			Vec2::new(min.x, min.y),
			Vec2::new(min.x, max.y),
			Vec2::new(max.x, max.y),
			Vec2::new(max.x, min.y),
		];
		for v in 0..3 {
			let (e1, e2) = (flat[v], flat[(v + 1) % 3]);
			for r in 0..4 {
				if segments_intersect(rect[r], rect[(r + 1) % 4], e1, e2) {
					return true;
				}
			}
		}
		rect.iter().any(|r| {
			self.contains_point(index, Int3::from_vec3(Vec3::new(r.x, 0.0, r.y)))
		})
	}
	/// Apply `update` to every triangle overlapping its bounds in XZ.
	/// Adjacency is topological so links are left as they are
	pub fn update_area(&mut self, update: &mut GraphUpdateObject) {
		let bounds = *update.get_bounds();
		let min = Vec2::new(bounds.get_min().x, bounds.get_min().z);
		let max = Vec2::new(bounds.get_max().x, bounds.get_max().z);
		for i in 0..self.nodes.len() {
			if !self.intersects_rect(i, min, max) {
				continue;
			}
			update.will_update_node(NodeRef::new(self.graph_index, i as u32), &self.nodes[i]);
			update.apply(&mut self.nodes[i]);
		}
	}
}
