//! A [Path] is a resumable search. It walks through
//! [PathState::Created] → [PathState::Preparing] → [PathState::Initialized]
//! → [PathState::Searching] → [PathState::Done] or [PathState::Error],
//! doing a budgeted slice of work each time the scheduler drives it and
//! picking up from the same frontier node on the next tick.
//!
//! Three kinds of search exist:
//!
//! - [PathKind::Standard] - from a start point to an end point
//! - [PathKind::Custom] - towards an end point but finishing on the first
//!   node accepted by an [EndingCondition]
//! - [PathKind::Distance] - from a start point outwards, collecting every
//!   node reached until the cost so far passes a threshold
//!

pub mod expansion;

use crate::prelude::*;
use bevy::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of expansions between two checks of the clock
const TIME_CHECK_INTERVAL: u32 = 500;

/// Invoked once with the outcome of a path. The engine is handed back so a
/// new path may be submitted from within the callback
pub type PathCallback = Box<dyn FnOnce(&PathResult, &mut Pathfinder) + Send + Sync>;

/// Where a [Path] is in its lifecycle
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum PathState {
	/// Built but not looked at by the engine
	#[default]
	Created,
	/// End points have been resolved to nodes
	Preparing,
	/// The open list has been seeded
	Initialized,
	/// Between two budgeted steps
	Searching,
	/// Finished successfully
	Done,
	/// Finished with a [PathError]
	Error,
}

/// Predicate deciding whether a node finishes a [PathKind::Custom] search.
/// The node's G score is available through [Node::get_g]
#[derive(Clone)]
pub struct EndingCondition(Arc<dyn Fn(NodeRef, &Node) -> bool + Send + Sync>);

impl EndingCondition {
	/// Create a new instance of [EndingCondition]
	pub fn new(condition: impl Fn(NodeRef, &Node) -> bool + Send + Sync + 'static) -> Self {
		EndingCondition(Arc::new(condition))
	}
	/// Whether `node` ends the search
	pub fn target_found(&self, node_ref: NodeRef, node: &Node) -> bool {
		(self.0)(node_ref, node)
	}
}

impl std::fmt::Debug for EndingCondition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("EndingCondition")
	}
}

/// What a search looks for
#[derive(Clone, Debug, Default)]
pub enum PathKind {
	/// Ends when the end node is reached
	#[default]
	Standard,
	/// Ends on the first node accepted by the condition, the end point still
	/// guides the heuristic
	Custom(EndingCondition),
	/// Floods outward from the start until the cost so far reaches `max_g`
	Distance {
		/// Cost threshold including penalties
		max_g: u32,
	},
}

impl PathKind {
	/// Whether the kind resolves and checks an end point
	pub fn requires_end(&self) -> bool {
		!matches!(self, PathKind::Distance { .. })
	}
}

/// A single path request and its search state
pub struct Path {
	/// Generation tag stamped on every node this search touches
	id: u16,
	/// Unique number of the submission, unlike the ID it never wraps
	ticket: u64,
	/// What the search looks for
	kind: PathKind,
	/// Requested start in world space
	start_point: Vec3,
	/// Requested end in world space, unused by [PathKind::Distance]
	end_point: Vec3,
	/// Start moved onto the start node
	snapped_start: Vec3,
	/// End moved onto the end node
	snapped_end: Vec3,
	/// Node the start point resolved to
	start_node: Option<NodeRef>,
	/// Node the end point resolved to
	end_node: Option<NodeRef>,
	/// Constraint for resolving the end points
	constraint: PathNNConstraint,
	/// Heuristic and scale chosen by the requester, otherwise the settings
	/// decide
	heuristic: Option<(Heuristic, f32)>,
	/// Tags a node needs one of to be traversed
	enabled_tags: u32,
	/// Entity that asked for the path
	owner: Option<Entity>,
	/// Receives the result
	callback: Option<PathCallback>,
	/// Lifecycle position
	state: PathState,
	/// Why the search failed
	error: Option<PathError>,
	/// Frontier node the next step continues from
	current: Option<NodeRef>,
	/// Scoring parameters fixed during preparation
	params: SearchParams,
	/// Time spent in steps so far
	duration: Duration,
	/// Number of budgeted steps taken
	search_iterations: u32,
	/// Number of nodes popped off the open list
	searched_nodes: u32,
	/// Traced route from start to end
	nodes: Vec<NodeRef>,
	/// World positions of [Path::nodes]
	vector_path: Vec<Vec3>,
	/// Nodes reached by a [PathKind::Distance] search, may repeat
	all_nodes: Vec<NodeRef>,
	/// G score of the node the search ended on
	total_cost: u32,
	/// Withdrawn by its requester, the result is dropped
	cancelled: bool,
	/// Scratch space for neighbour lists
	buffer: Vec<Connection>,
}

impl std::fmt::Debug for Path {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Path")
			.field("id", &self.id)
			.field("kind", &self.kind)
			.field("state", &self.state)
			.field("start_point", &self.start_point)
			.field("end_point", &self.end_point)
			.field("error", &self.error)
			.field("nodes", &self.nodes.len())
			.finish_non_exhaustive()
	}
}

impl Path {
	/// Create a new instance of [Path] from `start` to `end`
	pub fn new(start: Vec3, end: Vec3) -> Self {
		Path::with_kind(PathKind::Standard, start, end)
	}
	/// Create a new instance of [Path] which searches towards `end` and stops
	/// on the first node accepted by `condition`
	pub fn custom(start: Vec3, end: Vec3, condition: EndingCondition) -> Self {
		Path::with_kind(PathKind::Custom(condition), start, end)
	}
	/// Create a new instance of [Path] which collects every node reachable
	/// from `start` for less than `max_g`
	pub fn distance(start: Vec3, max_g: u32) -> Self {
		Path::with_kind(PathKind::Distance { max_g }, start, start)
	}
	/// Create a new instance of [Path] of any [PathKind]
	pub fn with_kind(kind: PathKind, start: Vec3, end: Vec3) -> Self {
		Path {
			id: 0,
			ticket: 0,
			kind,
			start_point: start,
			end_point: end,
			snapped_start: start,
			snapped_end: end,
			start_node: None,
			end_node: None,
			constraint: PathNNConstraint::default(),
			heuristic: None,
			enabled_tags: u32::MAX,
			owner: None,
			callback: None,
			state: PathState::Created,
			error: None,
			current: None,
			params: SearchParams {
				path_id: 0,
				h_target: Int3::ZERO,
				heuristic: Heuristic::None,
				heuristic_scale: 1.0,
				enabled_tags: u32::MAX,
			},
			duration: Duration::ZERO,
			search_iterations: 0,
			searched_nodes: 0,
			nodes: Vec::new(),
			vector_path: Vec::new(),
			all_nodes: Vec::new(),
			total_cost: 0,
			cancelled: false,
			buffer: Vec::new(),
		}
	}
	/// Resolve the end points with `constraint`
	pub fn with_constraint(mut self, constraint: PathNNConstraint) -> Self {
		self.constraint = constraint;
		self
	}
	/// Score nodes with `heuristic` scaled by `scale` instead of the engine
	/// default
	pub fn with_heuristic(mut self, heuristic: Heuristic, scale: f32) -> Self {
		self.heuristic = Some((heuristic, scale));
		self
	}
	/// Only traverse nodes sharing at least one bit with `tags`
	pub fn with_enabled_tags(mut self, tags: u32) -> Self {
		self.enabled_tags = tags;
		self
	}
	/// Record which entity made the request
	pub fn with_owner(mut self, owner: Entity) -> Self {
		self.owner = Some(owner);
		self
	}
	/// Invoke `callback` once the path has finished
	pub fn with_callback(
		mut self,
		callback: impl FnOnce(&PathResult, &mut Pathfinder) + Send + Sync + 'static,
	) -> Self {
		self.callback = Some(Box::new(callback));
		self
	}
	/// Clear every trace of a previous search and point the path at a new
	/// request, retaining allocated buffers
	pub fn reset(&mut self, kind: PathKind, start: Vec3, end: Vec3) {
		self.id = 0;
		self.ticket = 0;
		self.kind = kind;
		self.start_point = start;
		self.end_point = end;
		self.snapped_start = start;
		self.snapped_end = end;
		self.start_node = None;
		self.end_node = None;
		self.constraint = PathNNConstraint::default();
		self.heuristic = None;
		self.enabled_tags = u32::MAX;
		self.owner = None;
		self.callback = None;
		self.state = PathState::Created;
		self.error = None;
		self.current = None;
		self.params.path_id = 0;
		self.params.h_target = Int3::ZERO;
		self.duration = Duration::ZERO;
		self.search_iterations = 0;
		self.searched_nodes = 0;
		self.nodes.clear();
		self.vector_path.clear();
		self.all_nodes.clear();
		self.total_cost = 0;
		self.cancelled = false;
		self.buffer.clear();
	}
	pub fn get_id(&self) -> u16 {
		self.id
	}
	/// Stamp the generation tag, done by the scheduler at submission
	pub(crate) fn set_id(&mut self, id: u16) {
		self.id = id;
	}
	pub fn get_ticket(&self) -> u64 {
		self.ticket
	}
	/// Stamp the submission number
	pub(crate) fn set_ticket(&mut self, ticket: u64) {
		self.ticket = ticket;
	}
	pub fn get_kind(&self) -> &PathKind {
		&self.kind
	}
	pub fn get_state(&self) -> PathState {
		self.state
	}
	pub fn get_error(&self) -> Option<PathError> {
		self.error
	}
	/// Whether the path has reached a terminal state
	pub fn is_done(&self) -> bool {
		matches!(self.state, PathState::Done | PathState::Error)
	}
	pub fn get_start_point(&self) -> Vec3 {
		self.start_point
	}
	pub fn get_end_point(&self) -> Vec3 {
		self.end_point
	}
	pub fn get_start_node(&self) -> Option<NodeRef> {
		self.start_node
	}
	pub fn get_end_node(&self) -> Option<NodeRef> {
		self.end_node
	}
	pub fn get_owner(&self) -> Option<Entity> {
		self.owner
	}
	pub fn get_nodes(&self) -> &[NodeRef] {
		&self.nodes
	}
	pub fn get_vector_path(&self) -> &[Vec3] {
		&self.vector_path
	}
	pub fn get_all_nodes(&self) -> &[NodeRef] {
		&self.all_nodes
	}
	pub fn get_duration(&self) -> Duration {
		self.duration
	}
	pub fn get_searched_nodes(&self) -> u32 {
		self.searched_nodes
	}
	pub fn get_search_iterations(&self) -> u32 {
		self.search_iterations
	}
	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}
	/// Flag the path so its result is thrown away
	pub(crate) fn cancel(&mut self) {
		self.cancelled = true;
	}
	/// Hand the callback over to the caller, it can only run once
	pub(crate) fn take_callback(&mut self) -> Option<PathCallback> {
		self.callback.take()
	}
	/// Move into the error state
	pub(crate) fn fail(&mut self, error: PathError) {
		self.state = PathState::Error;
		self.error = Some(error);
		self.current = None;
	}
	/// Move into the done state
	fn complete(&mut self) {
		self.state = PathState::Done;
		self.error = None;
		self.current = None;
	}
	/// Resolve the end points to nodes and reject requests which can't
	/// succeed. On failure the path is left in [PathState::Error]
	pub fn prepare(&mut self, graphs: &Graphs, settings: &PathfinderSettings) -> Result<(), PathError> {
		if self.state != PathState::Created {
			error!("Path {} has already been processed, reset it before submitting again", self.id);
			self.fail(PathError::AlreadyProcessed);
			return Err(PathError::AlreadyProcessed);
		}
		self.state = PathState::Preparing;
		let result = self.resolve_end_points(graphs, settings);
		if let Err(e) = result {
			self.fail(e);
		}
		result
	}
	/// Nearest node lookups and the area pre-check
	fn resolve_end_points(&mut self, graphs: &Graphs, settings: &PathfinderSettings) -> Result<(), PathError> {
		if graphs.is_empty() {
			return Err(PathError::NoGraphs);
		}
		let start = graphs.get_nearest(
			self.start_point,
			self.constraint.get_constraint(),
			settings.prioritize_graphs,
			settings.prioritize_graphs_limit,
		);
		let start_ref = start.node.ok_or(PathError::NoStartNode)?;
		let start_node = graphs.node(start_ref).ok_or(PathError::NoStartNode)?;
		if !start_node.is_walkable() {
			return Err(PathError::StartNotWalkable);
		}
		self.start_node = Some(start_ref);
		self.snapped_start = start.clamped_position;
		self.constraint.set_start(Some(start_node));
		let (heuristic, heuristic_scale) = self
			.heuristic
			.unwrap_or((settings.heuristic, settings.heuristic_scale));
		self.params = SearchParams {
			path_id: self.id,
			h_target: start_node.get_position(),
			heuristic,
			heuristic_scale,
			enabled_tags: self.enabled_tags,
		};
		if !self.kind.requires_end() {
			self.params.heuristic = Heuristic::None;
			return Ok(());
		}
		let end = graphs.get_nearest(
			self.end_point,
			self.constraint.get_constraint(),
			settings.prioritize_graphs,
			settings.prioritize_graphs_limit,
		);
		let end_ref = end.node.ok_or(PathError::NoEndNode)?;
		let end_node = graphs.node(end_ref).ok_or(PathError::NoEndNode)?;
		if !end_node.is_walkable() {
			return Err(PathError::EndNotWalkable);
		}
		self.end_node = Some(end_ref);
		self.snapped_end = end.clamped_position;
		self.params.h_target = Int3::from_vec3(end.clamped_position);
		if start_node.get_area() != end_node.get_area() {
			return Err(PathError::Unreachable {
				start_area: start_node.get_area(),
				end_area: end_node.get_area(),
			});
		}
		Ok(())
	}
	/// Seed the open list with the start node and expand it once
	pub fn initialize(
		&mut self,
		graphs: &mut Graphs,
		heap: &mut BinaryHeap,
		trace_limit: usize,
	) -> Result<(), PathError> {
		let result = self.seed(graphs, heap, trace_limit);
		if let Err(e) = result {
			self.fail(e);
		}
		result
	}
	/// Body of [Path::initialize]
	fn seed(&mut self, graphs: &mut Graphs, heap: &mut BinaryHeap, trace_limit: usize) -> Result<(), PathError> {
		if self.state != PathState::Preparing {
			return Err(PathError::AlreadyProcessed);
		}
		heap.clear();
		let start = self.start_node.ok_or(PathError::NoStartNode)?;
		let node = graphs.node_mut(start).ok_or(PathError::NoStartNode)?;
		node.set_path_id(self.id);
		node.set_parent(None);
		node.set_cost(0);
		node.update_h(
			self.params.h_target,
			self.params.heuristic,
			self.params.heuristic_scale,
		);
		node.set_g(node.get_penalty());
		self.searched_nodes += 1;
		if matches!(self.kind, PathKind::Standard) && self.end_node == Some(start) {
			return self.found(graphs, start, trace_limit);
		}
		if let PathKind::Custom(condition) = &self.kind {
			if graphs
				.node(start)
				.is_some_and(|n| condition.target_found(start, n))
			{
				return self.found(graphs, start, trace_limit);
			}
		}
		if matches!(self.kind, PathKind::Distance { .. }) {
			self.all_nodes.push(start);
		}
		expansion::open(graphs, heap, start, &self.params, &mut self.buffer);
		match heap.remove() {
			Some(entry) => {
				self.current = Some(entry.get_node());
				self.state = PathState::Initialized;
				Ok(())
			}
			None if matches!(self.kind, PathKind::Distance { .. }) => {
				self.complete();
				Ok(())
			}
			None => Err(PathError::NoPathExists),
		}
	}
	/// Expand nodes until the search ends or `deadline` passes. The clock is
	/// consulted every few hundred expansions so a step may run over
	pub fn calculate_step(
		&mut self,
		graphs: &mut Graphs,
		heap: &mut BinaryHeap,
		deadline: Instant,
		trace_limit: usize,
	) {
		if !matches!(self.state, PathState::Initialized | PathState::Searching) {
			return;
		}
		let started = Instant::now();
		self.state = PathState::Searching;
		self.search_iterations += 1;
		let mut counter = 0;
		while self.state == PathState::Searching {
			let current = match self.current {
				Some(current) if self.can_enter(graphs, current) => current,
				Some(_) => match self.next_open(graphs, heap) {
					Some(current) => current,
					None => {
						self.exhausted();
						break;
					}
				},
				None => {
					self.fail(PathError::NoPathExists);
					break;
				}
			};
			self.current = Some(current);
			self.searched_nodes += 1;
			if let Some(finished) = self.ends_on(graphs, current) {
				match finished {
					true => {
						if let Err(e) = self.found(graphs, current, trace_limit) {
							self.fail(e);
						}
					}
					false => self.complete(),
				}
				break;
			}
			if matches!(self.kind, PathKind::Distance { .. }) {
				self.all_nodes.push(current);
			}
			expansion::open(graphs, heap, current, &self.params, &mut self.buffer);
			match self.next_open(graphs, heap) {
				Some(next) => self.current = Some(next),
				None => {
					self.exhausted();
					break;
				}
			}
			counter += 1;
			if counter > TIME_CHECK_INTERVAL {
				if Instant::now() >= deadline {
					break;
				}
				counter = 0;
			}
		}
		self.duration += started.elapsed();
	}
	/// Whether the search may still enter `node`
	fn can_enter(&self, graphs: &Graphs, node: NodeRef) -> bool {
		graphs
			.node(node)
			.is_some_and(|n| n.can_traverse(self.params.enabled_tags))
	}
	/// Pop the best open node. Nodes which stopped being traversable after
	/// they were opened, e.g. through a mid-search graph update, are dropped
	fn next_open(&self, graphs: &Graphs, heap: &mut BinaryHeap) -> Option<NodeRef> {
		while let Some(entry) = heap.remove() {
			if self.can_enter(graphs, entry.get_node()) {
				return Some(entry.get_node());
			}
		}
		None
	}
	/// The open list ran dry, a distance search is complete, anything else
	/// has no route
	fn exhausted(&mut self) {
		if matches!(self.kind, PathKind::Distance { .. }) {
			self.complete();
		} else {
			debug!("Path {} exhausted the open list", self.id);
			self.fail(PathError::NoPathExists);
		}
	}
	/// Whether `current` ends the search, `Some(true)` when the route to it
	/// should be traced
	fn ends_on(&self, graphs: &Graphs, current: NodeRef) -> Option<bool> {
		let node = graphs.node(current)?;
		match &self.kind {
			PathKind::Standard => (self.end_node == Some(current)).then_some(true),
			PathKind::Custom(condition) => condition.target_found(current, node).then_some(true),
			PathKind::Distance { max_g } => (node.get_g() >= *max_g).then_some(false),
		}
	}
	/// Trace the route to `end` and finish
	fn found(&mut self, graphs: &Graphs, end: NodeRef, trace_limit: usize) -> Result<(), PathError> {
		self.trace(graphs, end, trace_limit)?;
		self.total_cost = graphs.node(end).map(|n| n.get_g()).unwrap_or_default();
		if !matches!(self.kind, PathKind::Standard) {
			self.end_node = Some(end);
		}
		self.complete();
		Ok(())
	}
	/// Follow parents from `end` back to the start, filling the node and
	/// vector lists in start to end order. A chain longer than `limit` is
	/// treated as a cycle
	pub fn trace(&mut self, graphs: &Graphs, end: NodeRef, limit: usize) -> Result<(), PathError> {
		self.nodes.clear();
		self.vector_path.clear();
		let mut cursor = Some(end);
		while let Some(node_ref) = cursor {
			if self.nodes.len() >= limit {
				error!(
					"Path {} trace exceeded {} nodes, the parent chain is probably cyclic",
					self.id, limit
				);
				self.nodes.clear();
				return Err(PathError::TraceTooLong { limit });
			}
			self.nodes.push(node_ref);
			cursor = graphs.node(node_ref).and_then(|n| n.get_parent());
		}
		self.nodes.reverse();
		self.vector_path.extend(
			self.nodes
				.iter()
				.filter_map(|n| graphs.node(*n))
				.map(|n| n.get_position().to_vec3()),
		);
		Ok(())
	}
	/// Snapshot of the outcome handed to callbacks and events
	pub fn to_result(&self) -> PathResult {
		PathResult {
			id: self.id,
			ticket: self.ticket,
			owner: self.owner,
			error: self.error,
			nodes: self.nodes.clone(),
			vector_path: self.vector_path.clone(),
			all_nodes: self.all_nodes.clone(),
			start_point: self.snapped_start,
			end_point: self.snapped_end,
			requested_start: self.start_point,
			requested_end: self.kind.requires_end().then_some(self.end_point),
			total_cost: self.total_cost,
			duration: self.duration,
			searched_nodes: self.searched_nodes,
			search_iterations: self.search_iterations,
		}
	}
	/// Describe the outcome in a single log message. `graphs` provides the
	/// node details printed by [PathLog::Heavy]
	pub fn debug_string(&self, log: PathLog, graphs: &Graphs) -> String {
		let mut text = format!(
			"Path {} : Computation Time {:.2} ms Searched Nodes {} Path Length {}",
			if self.error.is_some() {
				"Failed"
			} else {
				"Completed"
			},
			self.duration.as_secs_f64() * 1000.0,
			self.searched_nodes,
			self.nodes.len()
		);
		if log == PathLog::Heavy {
			text += &format!("\nSearch Iterations {}", self.search_iterations);
			if let Some(end) = self.end_node.and_then(|n| graphs.node(n).map(|node| (n, node))) {
				text += &format!(
					"\nEnd Node\n\tG: {}\n\tH: {}\n\tF: {}\n\tPoint: {}\n\tGraph: {}",
					end.1.get_g(),
					end.1.get_h(),
					end.1.get_f(),
					self.snapped_end,
					end.0.get_graph()
				);
			}
			if let Some(start) = self.start_node {
				text += &format!(
					"\nStart Node\n\tPoint: {}\n\tGraph: {}",
					self.snapped_start,
					start.get_graph()
				);
			}
			text += &format!(
				"\nHeuristic {:?} scale {}",
				self.params.heuristic, self.params.heuristic_scale
			);
			for node in self.nodes.iter() {
				text += &format!("\n\t{:?}", node);
			}
			if let Some(e) = self.error {
				text += &format!("\nError: {}", e);
			}
			text += &format!("\nPath Number {}", self.id);
		}
		text
	}
}

/// Outcome of a finished [Path]
#[derive(Clone, PartialEq, Debug, Default)]
pub struct PathResult {
	/// Generation tag the search ran with
	id: u16,
	/// Submission number of the path
	ticket: u64,
	/// Entity that asked for the path
	owner: Option<Entity>,
	/// Why the search failed
	error: Option<PathError>,
	/// Route from start to end
	nodes: Vec<NodeRef>,
	/// World positions of the route
	vector_path: Vec<Vec3>,
	/// Every node reached by a distance search
	all_nodes: Vec<NodeRef>,
	/// Start point moved onto its node
	start_point: Vec3,
	/// End point moved onto its node
	end_point: Vec3,
	/// Start point as it was requested
	requested_start: Vec3,
	/// End point as it was requested, absent for searches without a target
	requested_end: Option<Vec3>,
	/// G score of the last node
	total_cost: u32,
	/// Time spent searching
	duration: Duration,
	/// Nodes popped off the open list
	searched_nodes: u32,
	/// Budgeted steps taken
	search_iterations: u32,
}

impl PathResult {
	pub fn get_id(&self) -> u16 {
		self.id
	}
	pub fn get_ticket(&self) -> u64 {
		self.ticket
	}
	pub fn get_owner(&self) -> Option<Entity> {
		self.owner
	}
	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}
	pub fn get_error(&self) -> Option<PathError> {
		self.error
	}
	/// Human readable form of the error
	pub fn error_message(&self) -> Option<String> {
		self.error.map(|e| e.to_string())
	}
	pub fn get_nodes(&self) -> &[NodeRef] {
		&self.nodes
	}
	pub fn get_vector_path(&self) -> &[Vec3] {
		&self.vector_path
	}
	pub fn get_all_nodes(&self) -> &[NodeRef] {
		&self.all_nodes
	}
	pub fn get_start_point(&self) -> Vec3 {
		self.start_point
	}
	pub fn get_end_point(&self) -> Vec3 {
		self.end_point
	}
	pub fn get_requested_start(&self) -> Vec3 {
		self.requested_start
	}
	pub fn get_requested_end(&self) -> Option<Vec3> {
		self.requested_end
	}
	/// Replace the first and last points of the vector path with the exact
	/// positions that were requested instead of the centres of the end
	/// nodes. A single point route is widened to two points first. Searches
	/// without a target keep their last point
	pub fn apply_exact_end_points(&mut self) {
		if self.vector_path.is_empty() {
			return;
		}
		if self.vector_path.len() == 1 {
			self.vector_path.push(self.vector_path[0]);
		}
		self.vector_path[0] = self.requested_start;
		if let Some(end) = self.requested_end {
			let last = self.vector_path.len() - 1;
			self.vector_path[last] = end;
		}
	}
	/// Get the cost of the route including penalties
	pub fn get_total_cost(&self) -> u32 {
		self.total_cost
	}
	pub fn get_duration(&self) -> Duration {
		self.duration
	}
	pub fn get_searched_nodes(&self) -> u32 {
		self.searched_nodes
	}
	pub fn get_search_iterations(&self) -> u32 {
		self.search_iterations
	}
	/// Direction an agent at `point` should move in to follow the route:
	/// towards the far end of the route segment closest to it
	pub fn get_movement_vector(&self, point: Vec3) -> Vec3 {
		match self.vector_path.len() {
			0 => Vec3::ZERO,
			1 => self.vector_path[0] - point,
			_ => {
				let mut closest_segment = 0;
				let mut min_dist = f32::INFINITY;
				for (i, segment) in self.vector_path.windows(2).enumerate() {
					let dist = closest_on_segment(segment[0], segment[1], point).distance_squared(point);
					if dist < min_dist {
						min_dist = dist;
						closest_segment = i;
					}
				}
				self.vector_path[closest_segment + 1] - point
			}
		}
	}
}

/// Closest point to `point` on the segment `a` to `b`
fn closest_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
	let direction = b - a;
	let length_sq = direction.length_squared();
	if length_sq == 0.0 {
		return a;
	}
	let t = ((point - a).dot(direction) / length_sq).clamp(0.0, 1.0);
	a + direction * t
}
