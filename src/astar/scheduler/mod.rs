//! The [Pathfinder] owns the graphs, the shared open list and a FIFO of
//! pending work. Each [Pathfinder::tick] drains the queue under a time
//! budget, resuming a half finished search where the previous tick left it.
//!
//! Graph mutations are only applied between two searches. Updates are
//! batched and rate limited, arbitrary closures can be deferred to the same
//! point with [Pathfinder::register_safe_node_update]
//!

pub mod settings;
pub mod worker;

use crate::prelude::*;
use bevy::prelude::*;
use std::collections::VecDeque;
use std::time::Instant;

/// Mutation deferred until no search is running
pub type SafeNodeUpdate = Box<dyn FnOnce(&mut Graphs) + Send + Sync>;

/// Observer of graph update batches
pub type GraphHook = Box<dyn FnMut(&Graphs) + Send + Sync>;

/// Observer of individual searches
pub type PathHook = Box<dyn FnMut(&Path) + Send + Sync>;

/// Identifies a submitted [Path]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub struct PathHandle {
	/// Generation tag given to the path
	id: u16,
	/// Submission number
	ticket: u64,
}

impl PathHandle {
	pub fn get_id(&self) -> u16 {
		self.id
	}
	pub fn get_ticket(&self) -> u64 {
		self.ticket
	}
}

/// An element of the pending queue
#[derive(Debug)]
enum QueueEntry {
	/// A path to search
	Search(Box<Path>),
	/// Reset every generation tag, queued when path IDs wrap around
	Cleanup,
}

/// A pathfinding engine instance
pub struct Pathfinder {
	/// Every navigation graph
	graphs: Graphs,
	/// Open list shared by all searches
	heap: BinaryHeap,
	/// Tunables
	settings: PathfinderSettings,
	/// Pending work in submission order
	queue: VecDeque<QueueEntry>,
	/// The path being searched across ticks
	active: Option<Box<Path>>,
	/// Finished paths kept for reuse
	pool: Vec<Path>,
	/// ID handed to the latest submission
	last_path_id: u16,
	/// Number of submissions so far
	last_ticket: u64,
	/// Generation tag resets performed
	cleanup_passes: u32,
	/// Results of paths with an owner, waiting to be collected
	results: Vec<PathResult>,
	/// Updates waiting for the next batch
	pending_updates: Vec<GraphUpdateObject>,
	/// Updates which have been applied, kept for reverting
	applied_updates: Vec<GraphUpdateObject>,
	/// When the last batch was applied
	last_graph_update: Option<Instant>,
	/// Closures waiting for a safe point
	safe_updates: Vec<SafeNodeUpdate>,
	/// Called before a batch is applied
	will_update_hooks: Vec<GraphHook>,
	/// Called after a batch has been applied
	updated_hooks: Vec<GraphHook>,
	/// Called before each path is prepared
	pre_search_hooks: Vec<PathHook>,
	/// Called once each searched path has finished
	post_search_hooks: Vec<PathHook>,
	/// Outcome of the most recent flood fill
	last_flood_fill: FloodFillSummary,
}

impl std::fmt::Debug for Pathfinder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Pathfinder")
			.field("graphs", &self.graphs.len())
			.field("queue", &self.queue.len())
			.field("active", &self.active)
			.field("last_path_id", &self.last_path_id)
			.field("cleanup_passes", &self.cleanup_passes)
			.finish_non_exhaustive()
	}
}

impl Default for Pathfinder {
	fn default() -> Self {
		Pathfinder::new(PathfinderSettings::default())
	}
}

impl Pathfinder {
	/// Create a new instance of [Pathfinder] with no graphs
	pub fn new(settings: PathfinderSettings) -> Self {
		Pathfinder {
			graphs: Graphs::new(),
			heap: BinaryHeap::new(settings.binary_heap_size),
			settings,
			queue: VecDeque::new(),
			active: None,
			pool: Vec::new(),
			last_path_id: 0,
			last_ticket: 0,
			cleanup_passes: 0,
			results: Vec::new(),
			pending_updates: Vec::new(),
			applied_updates: Vec::new(),
			last_graph_update: None,
			safe_updates: Vec::new(),
			will_update_hooks: Vec::new(),
			updated_hooks: Vec::new(),
			pre_search_hooks: Vec::new(),
			post_search_hooks: Vec::new(),
			last_flood_fill: FloodFillSummary::default(),
		}
	}
	pub fn get_settings(&self) -> &PathfinderSettings {
		&self.settings
	}
	pub fn get_settings_mut(&mut self) -> &mut PathfinderSettings {
		&mut self.settings
	}
	pub fn get_graphs(&self) -> &Graphs {
		&self.graphs
	}
	/// Direct access to the graphs. Mutating nodes while a search is active
	/// corrupts it, prefer [Pathfinder::register_safe_node_update]
	pub fn get_graphs_mut(&mut self) -> &mut Graphs {
		&mut self.graphs
	}
	/// Add a graph and recompute areas, returns its index
	pub fn add_graph(&mut self, graph: NavGraph) -> Option<u8> {
		let index = self.graphs.add(graph)?;
		self.flood_fill();
		Some(index)
	}
	/// Swap the whole graph set, e.g. after loading a save
	pub fn set_graphs(&mut self, graphs: Graphs) {
		self.graphs = graphs;
		self.flood_fill();
	}
	/// Recompute the area of every node
	pub fn flood_fill(&mut self) -> FloodFillSummary {
		self.last_flood_fill = flood_fill(&mut self.graphs, self.settings.min_area_size);
		self.last_flood_fill
	}
	pub fn get_last_flood_fill(&self) -> FloodFillSummary {
		self.last_flood_fill
	}
	pub fn get_cleanup_passes(&self) -> u32 {
		self.cleanup_passes
	}
	pub fn get_last_path_id(&self) -> u16 {
		self.last_path_id
	}
	/// Number of queued paths, not counting the active one
	pub fn queued_paths(&self) -> usize {
		self.queue
			.iter()
			.filter(|e| matches!(e, QueueEntry::Search(_)))
			.count()
	}
	/// Whether there is nothing left to search
	pub fn is_idle(&self) -> bool {
		self.active.is_none() && self.queue.is_empty()
	}
	pub fn is_accepting_paths(&self) -> bool {
		self.settings.accept_new_paths
	}
	pub fn set_accept_new_paths(&mut self, accept: bool) {
		self.settings.accept_new_paths = accept;
	}
	/// Get a blank path, reusing a pooled one when recycling is enabled
	pub fn acquire_path(&mut self, kind: PathKind, start: Vec3, end: Vec3) -> Path {
		match self.pool.pop() {
			Some(mut path) => {
				path.reset(kind, start, end);
				path
			}
			None => Path::with_kind(kind, start, end),
		}
	}
	/// Return a finished path to the pool
	fn recycle(&mut self, path: Path) {
		if self.settings.recycle_paths {
			self.pool.push(path);
		}
	}
	pub fn pooled_paths(&self) -> usize {
		self.pool.len()
	}
	/// Request a path from `start` to `end`, `callback` receives the result
	pub fn find_path(
		&mut self,
		start: Vec3,
		end: Vec3,
		callback: impl FnOnce(&PathResult, &mut Pathfinder) + Send + Sync + 'static,
	) -> PathHandle {
		let path = self
			.acquire_path(PathKind::Standard, start, end)
			.with_callback(callback);
		self.submit(path)
	}
	/// Queue `path` for searching.
	///
	/// IDs wrap around after 65535 submissions, at which point a cleanup job
	/// is queued ahead of the path. A path submitted while the engine is not
	/// accepting paths, or before any graph exists, fails immediately
	pub fn submit(&mut self, mut path: Path) -> PathHandle {
		self.last_ticket += 1;
		path.set_ticket(self.last_ticket);
		if !self.settings.accept_new_paths {
			warn!("Path submitted while the pathfinder is not accepting paths");
			return self.reject(path, PathError::NotAcceptingPaths);
		}
		if self.graphs.is_empty() {
			warn!("Path submitted to a pathfinder without graphs");
			return self.reject(path, PathError::NoGraphs);
		}
		self.last_path_id = match self.last_path_id.checked_add(1) {
			Some(id) => id,
			None => {
				warn!("Path IDs wrapped around, resetting node generation tags");
				self.queue.push_back(QueueEntry::Cleanup);
				1
			}
		};
		path.set_id(self.last_path_id);
		let handle = PathHandle {
			id: self.last_path_id,
			ticket: self.last_ticket,
		};
		self.queue.push_back(QueueEntry::Search(Box::new(path)));
		handle
	}
	/// Fail `path` without queueing it, its callback runs before this returns
	fn reject(&mut self, mut path: Path, error: PathError) -> PathHandle {
		path.fail(error);
		let handle = PathHandle {
			id: path.get_id(),
			ticket: path.get_ticket(),
		};
		self.finalize(path);
		handle
	}
	/// Withdraw a request. A queued path is dropped without its callback
	/// running, an active one keeps searching but its result is discarded.
	/// Returns `false` when the path has already finished
	pub fn cancel(&mut self, handle: PathHandle) -> bool {
		if let Some(active) = self.active.as_mut() {
			if active.get_ticket() == handle.ticket {
				active.cancel();
				return true;
			}
		}
		let position = self.queue.iter().position(|e| match e {
			QueueEntry::Search(p) => p.get_ticket() == handle.ticket,
			QueueEntry::Cleanup => false,
		});
		match position.and_then(|i| self.queue.remove(i)) {
			Some(QueueEntry::Search(mut path)) => {
				path.cancel();
				path.fail(PathError::Cancelled);
				self.recycle(*path);
				true
			}
			_ => false,
		}
	}
	/// Spend up to the frame budget searching. Several short paths may finish
	/// within one tick, a long one is resumed on the next. Returns the number
	/// of paths finished
	pub fn tick(&mut self) -> usize {
		let deadline = Instant::now() + self.settings.get_frame_budget();
		let mut finished = 0;
		loop {
			if self.active.is_none() {
				self.run_safe_updates();
				if self.graph_updates_due() {
					self.apply_graph_updates();
				}
				match self.queue.pop_front() {
					Some(QueueEntry::Cleanup) => self.cleanup(),
					Some(QueueEntry::Search(path)) => {
						if let Some(path) = self.start(path) {
							self.active = Some(path);
						} else {
							finished += 1;
						}
					}
					None => break,
				}
			}
			if let Some(mut path) = self.active.take() {
				let limit = self.settings.get_trace_limit(&self.graphs);
				path.calculate_step(&mut self.graphs, &mut self.heap, deadline, limit);
				if path.is_done() {
					self.finish_search(*path);
					finished += 1;
				} else {
					self.active = Some(path);
				}
			}
			if Instant::now() >= deadline || self.is_idle() {
				break;
			}
		}
		if self.active.is_none() {
			self.run_safe_updates();
		}
		finished
	}
	/// Tick until the queue is empty, returns the number of paths finished
	pub fn run_until_idle(&mut self) -> usize {
		let mut finished = 0;
		while !self.is_idle() {
			finished += self.tick();
		}
		self.run_safe_updates();
		if !self.pending_updates.is_empty() {
			self.apply_graph_updates();
		}
		finished
	}
	/// Prepare and initialize a dequeued path. Returns it when it needs
	/// searching, otherwise it has been finalized already
	fn start(&mut self, mut path: Box<Path>) -> Option<Box<Path>> {
		for hook in self.pre_search_hooks.iter_mut() {
			hook(path.as_ref());
		}
		if path.prepare(&self.graphs, &self.settings).is_ok() {
			let limit = self.settings.get_trace_limit(&self.graphs);
			if let Err(e) = path.initialize(&mut self.graphs, &mut self.heap, limit) {
				warn!("Path {} failed to initialize: {}", path.get_id(), e);
			}
		}
		if path.is_done() {
			self.finish_search(*path);
			None
		} else {
			Some(path)
		}
	}
	/// Zero every generation tag
	fn cleanup(&mut self) {
		self.graphs.clear_search_state();
		self.heap.clear();
		self.cleanup_passes += 1;
		debug!("Cleanup pass {} reset all node generation tags", self.cleanup_passes);
	}
	/// Let the post search hooks see `path`, then finalize it
	fn finish_search(&mut self, path: Path) {
		for hook in self.post_search_hooks.iter_mut() {
			hook(&path);
		}
		self.finalize(path);
	}
	/// Log, report and recycle a finished path
	fn finalize(&mut self, mut path: Path) {
		if path.is_cancelled() {
			self.recycle(path);
			return;
		}
		match self.settings.log_path_results {
			PathLog::None => {}
			PathLog::OnlyErrors if path.get_error().is_none() => {}
			log => debug!("{}", path.debug_string(log, &self.graphs)),
		}
		let result = path.to_result();
		let callback = path.take_callback();
		self.recycle(path);
		if let Some(callback) = callback {
			callback(&result, self);
		}
		if result.get_owner().is_some() {
			self.results.push(result);
		}
	}
	/// Collect the results of finished paths which carry an owner
	pub fn drain_results(&mut self) -> Vec<PathResult> {
		std::mem::take(&mut self.results)
	}
	/// Stop accepting paths and fail everything still queued or in flight,
	/// each callback runs with [PathError::ShutDown]. Returns the number of
	/// paths resolved
	pub fn shutdown(&mut self) -> usize {
		self.settings.accept_new_paths = false;
		let mut resolved = 0;
		if let Some(mut path) = self.active.take() {
			path.fail(PathError::ShutDown);
			self.finish_search(*path);
			resolved += 1;
		}
		while let Some(entry) = self.queue.pop_front() {
			if let QueueEntry::Search(mut path) = entry {
				path.fail(PathError::ShutDown);
				self.finalize(*path);
				resolved += 1;
			}
		}
		if resolved > 0 {
			info!("Pathfinder shut down, {} paths were not calculated", resolved);
		}
		resolved
	}
	/// Queue an update for the next batch
	pub fn update_graphs(&mut self, update: GraphUpdateObject) {
		self.pending_updates.push(update);
	}
	pub fn pending_graph_updates(&self) -> usize {
		self.pending_updates.len()
	}
	/// Whether the pending batch may be applied now
	fn graph_updates_due(&self) -> bool {
		if self.pending_updates.is_empty() {
			return false;
		}
		if !self.settings.limit_graph_updates {
			return true;
		}
		self.last_graph_update
			.is_none_or(|t| t.elapsed() >= self.settings.get_graph_update_interval())
	}
	/// Apply every pending update now, ignoring the rate limit. A search in
	/// progress continues on the modified graphs with its open list rescored.
	/// Returns the number applied
	pub fn flush_graph_updates(&mut self) -> usize {
		self.run_safe_updates();
		self.apply_graph_updates()
	}
	/// Apply the pending batch, flood filling once at the end if any update
	/// asked for it
	fn apply_graph_updates(&mut self) -> usize {
		if self.pending_updates.is_empty() {
			return 0;
		}
		for hook in self.will_update_hooks.iter_mut() {
			hook(&self.graphs);
		}
		let mut batch = std::mem::take(&mut self.pending_updates);
		let mut requires_flood_fill = false;
		for update in batch.iter_mut() {
			update.update_graphs(&mut self.graphs);
			requires_flood_fill |= update.requires_flood_fill();
		}
		if requires_flood_fill {
			self.flood_fill();
		}
		if self.active.is_some() {
			let graphs = &self.graphs;
			self.heap
				.rebuild(|n| graphs.node(n).map_or(u32::MAX, |node| node.get_f()));
		}
		for hook in self.updated_hooks.iter_mut() {
			hook(&self.graphs);
		}
		self.last_graph_update = Some(Instant::now());
		let applied = batch.len();
		debug!("Applied {} graph updates", applied);
		self.applied_updates.extend(batch);
		applied
	}
	/// Collect the applied updates, tracked ones can be passed to
	/// [Pathfinder::revert_update]
	pub fn take_applied_updates(&mut self) -> Vec<GraphUpdateObject> {
		std::mem::take(&mut self.applied_updates)
	}
	/// Undo a tracked update and recompute areas if it requested a flood fill
	pub fn revert_update(&mut self, update: &GraphUpdateObject) -> bool {
		if !update.revert_from_backup(&mut self.graphs) {
			return false;
		}
		if update.requires_flood_fill() {
			self.flood_fill();
		}
		true
	}
	/// Run `hook` before every applied update batch
	pub fn on_graphs_will_be_updated(&mut self, hook: impl FnMut(&Graphs) + Send + Sync + 'static) {
		self.will_update_hooks.push(Box::new(hook));
	}
	/// Run `hook` after every applied update batch
	pub fn on_graphs_updated(&mut self, hook: impl FnMut(&Graphs) + Send + Sync + 'static) {
		self.updated_hooks.push(Box::new(hook));
	}
	/// Run `hook` on every dequeued path before it is prepared
	pub fn on_path_pre_search(&mut self, hook: impl FnMut(&Path) + Send + Sync + 'static) {
		self.pre_search_hooks.push(Box::new(hook));
	}
	/// Run `hook` on every path which was dequeued for searching once it has
	/// finished, ahead of its callback. Paths rejected on submission skip it
	pub fn on_path_post_search(&mut self, hook: impl FnMut(&Path) + Send + Sync + 'static) {
		self.post_search_hooks.push(Box::new(hook));
	}
	/// Run `update` as soon as no search is in progress, immediately when the
	/// engine is between searches
	pub fn register_safe_node_update(&mut self, update: impl FnOnce(&mut Graphs) + Send + Sync + 'static) {
		if self.active.is_none() {
			update(&mut self.graphs);
		} else {
			self.safe_updates.push(Box::new(update));
		}
	}
	/// Run every deferred closure
	fn run_safe_updates(&mut self) {
		for update in std::mem::take(&mut self.safe_updates) {
			update(&mut self.graphs);
		}
	}
	/// Whether applying `update` would disconnect `a` from `b`.
	///
	/// The update is applied with tracking, areas recomputed and compared,
	/// then the update is reverted and areas recomputed again. Two full flood
	/// fills make this expensive, avoid calling it every frame
	pub fn will_block_path(&mut self, update: &GraphUpdateObject, a: NodeRef, b: NodeRef) -> bool {
		let mut trial = update.clone().with_tracking(true);
		trial.update_graphs(&mut self.graphs);
		flood_fill(&mut self.graphs, self.settings.min_area_size);
		let blocked = !self.is_reachable(a, b);
		trial.revert_from_backup(&mut self.graphs);
		self.flood_fill();
		blocked
	}
	/// Whether a path between `a` and `b` can exist, in constant time.
	/// Components smaller than the minimum area size share an area and
	/// report as connected to each other
	pub fn is_reachable(&self, a: NodeRef, b: NodeRef) -> bool {
		match (self.graphs.node(a), self.graphs.node(b)) {
			(Some(a), Some(b)) => a.is_walkable() && b.is_walkable() && a.get_area() == b.get_area(),
			_ => {
				warn!("Reachability queried for a node which does not exist");
				false
			}
		}
	}
	/// Get the node nearest to `position` which satisfies `constraint`
	pub fn get_nearest(&self, position: Vec3, constraint: &NNConstraint) -> NearestInfo {
		self.graphs.get_nearest(
			position,
			constraint,
			self.settings.prioritize_graphs,
			self.settings.prioritize_graphs_limit,
		)
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::{Arc, Mutex};
	fn engine(width: u32, depth: u32) -> Pathfinder {
		let mut engine = Pathfinder::new(PathfinderSettings { log_path_results: PathLog::None, min_area_size: 0, ..Default::default() });
		engine.add_graph(NavGraph::Grid(GridGraph::new(GridGraphSettings { width, depth, ..Default::default() })));
		engine
	}
	#[test]
	fn callback_runs_once() {
		let mut engine = engine(5, 5);
		let calls = Arc::new(Mutex::new(Vec::new()));
		let sink = calls.clone();
		engine.find_path(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 0.0, 2.0), move |r, _| {
			sink.lock().unwrap().push(r.get_nodes().len());
		});
		engine.run_until_idle();
		engine.run_until_idle();
		assert_eq!(vec![5], *calls.lock().unwrap());
	}
	#[test]
	fn queue_is_fifo() {
		let mut engine = engine(5, 5);
		let order = Arc::new(Mutex::new(Vec::new()));
		for i in 0..3 {
			let sink = order.clone();
			engine.find_path(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, i as f32 - 1.0), move |_, _| {
				sink.lock().unwrap().push(i);
			});
		}
		assert_eq!(3, engine.queued_paths());
		engine.run_until_idle();
		assert_eq!(vec![0, 1, 2], *order.lock().unwrap());
	}
	#[test]
	fn callback_may_submit_another_path() {
		let mut engine = engine(3, 3);
		let done = Arc::new(Mutex::new(0));
		let outer = done.clone();
		engine.find_path(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0), move |_, engine| {
			*outer.lock().unwrap() += 1;
			let inner = outer.clone();
			engine.find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, -1.0), move |_, _| {
				*inner.lock().unwrap() += 1;
			});
		});
		engine.run_until_idle();
		assert_eq!(2, *done.lock().unwrap());
	}
	#[test]
	fn cancelled_queued_path_never_reports() {
		let mut engine = engine(3, 3);
		let called = Arc::new(Mutex::new(false));
		let sink = called.clone();
		let handle = engine.find_path(Vec3::ZERO, Vec3::ONE, move |_, _| *sink.lock().unwrap() = true);
		assert!(engine.cancel(handle));
		engine.run_until_idle();
		assert!(!*called.lock().unwrap());
		assert!(!engine.cancel(handle));
	}
	#[test]
	fn rejected_when_not_accepting() {
		let mut engine = engine(3, 3);
		engine.set_accept_new_paths(false);
		let error = Arc::new(Mutex::new(None));
		let sink = error.clone();
		engine.find_path(Vec3::ZERO, Vec3::ONE, move |r, _| *sink.lock().unwrap() = r.get_error());
		assert_eq!(Some(PathError::NotAcceptingPaths), *error.lock().unwrap());
		assert!(engine.is_idle());
	}
	#[test]
	fn rejected_without_graphs_before_any_tick() {
		let mut engine = Pathfinder::new(PathfinderSettings { log_path_results: PathLog::None, ..Default::default() });
		let error = Arc::new(Mutex::new(None));
		let sink = error.clone();
		engine.find_path(Vec3::ZERO, Vec3::ONE, move |r, _| *sink.lock().unwrap() = r.get_error());
		assert_eq!(Some(PathError::NoGraphs), *error.lock().unwrap());
		assert_eq!(0, engine.queued_paths());
		assert!(engine.is_idle());
	}
	#[test]
	fn initialize_failure_reaches_the_callback() {
		let mut engine = Pathfinder::new(PathfinderSettings { log_path_results: PathLog::None, min_area_size: 3, ..Default::default() });
		let mut grid = GridGraph::new(GridGraphSettings { width: 5, depth: 1, ..Default::default() });
		grid.set_walkable(1, 0, false);
		grid.set_walkable(3, 0, false);
		// lone cells share the undersized area and pass the area check
		engine.add_graph(NavGraph::Grid(grid));
		let outcome = Arc::new(Mutex::new(None));
		let sink = outcome.clone();
		engine.find_path(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), move |r, _| {
			*sink.lock().unwrap() = Some((r.get_error(), r.get_searched_nodes()));
		});
		engine.run_until_idle();
		assert_eq!(Some((Some(PathError::NoPathExists), 1)), *outcome.lock().unwrap());
	}
	#[test]
	fn search_hooks_bracket_each_path() {
		let mut engine = engine(3, 3);
		let events = Arc::new(Mutex::new(Vec::new()));
		let pre = events.clone();
		engine.on_path_pre_search(move |p| pre.lock().unwrap().push(("pre", p.get_ticket(), p.get_state())));
		let post = events.clone();
		engine.on_path_post_search(move |p| post.lock().unwrap().push(("post", p.get_ticket(), p.get_state())));
		let done = events.clone();
		engine.find_path(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0), move |r, _| {
			done.lock().unwrap().push(("callback", r.get_ticket(), PathState::Done));
		});
		engine.find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, -1.0), |_, _| {});
		engine.set_accept_new_paths(false);
		// rejected on submission, never searched
		engine.find_path(Vec3::ZERO, Vec3::ONE, |_, _| {});
		engine.set_accept_new_paths(true);
		engine.run_until_idle();
		assert_eq!(vec![
			("pre", 1, PathState::Created),
			("post", 1, PathState::Done),
			("callback", 1, PathState::Done),
			("pre", 2, PathState::Created),
			("post", 2, PathState::Done),
		], *events.lock().unwrap());
	}
	#[test]
	fn shutdown_resolves_queued_paths() {
		let mut engine = engine(3, 3);
		let errors = Arc::new(Mutex::new(Vec::new()));
		for _ in 0..2 {
			let sink = errors.clone();
			engine.find_path(Vec3::ZERO, Vec3::ONE, move |r, _| sink.lock().unwrap().push(r.get_error()));
		}
		assert_eq!(2, engine.shutdown());
		assert_eq!(vec![Some(PathError::ShutDown); 2], *errors.lock().unwrap());
		assert!(!engine.is_accepting_paths());
	}
	#[test]
	fn owned_results_are_collected() {
		let mut engine = engine(3, 3);
		let owner = Entity::from_raw(7);
		let path = engine.acquire_path(PathKind::Standard, Vec3::ZERO, Vec3::ONE).with_owner(owner);
		engine.submit(path);
		engine.find_path(Vec3::ZERO, Vec3::ONE, |_, _| {});
		engine.run_until_idle();
		let results = engine.drain_results();
		assert_eq!(1, results.len());
		assert_eq!(Some(owner), results[0].get_owner());
	}
	#[test]
	fn graph_updates_are_rate_limited() {
		let mut engine = engine(3, 3);
		engine.get_settings_mut().max_graph_update_freq = 3600.0;
		let bounds = UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(0.5));
		engine.update_graphs(GraphUpdateObject::new(bounds).with_penalty(10));
		engine.tick();
		// the first batch is never throttled
		assert_eq!(0, engine.pending_graph_updates());
		engine.update_graphs(GraphUpdateObject::new(bounds).with_penalty(10));
		engine.tick();
		assert_eq!(1, engine.pending_graph_updates());
		assert_eq!(1, engine.flush_graph_updates());
		assert_eq!(20, engine.get_graphs().node(NodeRef::new(0, 4)).unwrap().get_penalty());
	}
	#[test]
	fn update_hooks_fire_around_batches() {
		let mut engine = engine(3, 3);
		let events = Arc::new(Mutex::new(Vec::new()));
		let before = events.clone();
		engine.on_graphs_will_be_updated(move |_| before.lock().unwrap().push("will"));
		let after = events.clone();
		engine.on_graphs_updated(move |_| after.lock().unwrap().push("did"));
		engine.update_graphs(GraphUpdateObject::new(UpdateBounds::default()));
		engine.flush_graph_updates();
		assert_eq!(vec!["will", "did"], *events.lock().unwrap());
	}
	#[test]
	fn walkability_update_refloods_areas() {
		let mut engine = engine(5, 1);
		let a = NodeRef::new(0, 0);
		let b = NodeRef::new(0, 4);
		assert!(engine.is_reachable(a, b));
		let wall = GraphUpdateObject::new(UpdateBounds::from_center_size(Vec3::ZERO, Vec3::splat(0.5))).with_walkability(false);
		assert!(engine.will_block_path(&wall, a, b));
		// the trial left the graphs untouched
		assert!(engine.is_reachable(a, b));
		engine.update_graphs(wall);
		engine.flush_graph_updates();
		assert!(!engine.is_reachable(a, b));
	}
	#[test]
	fn safe_update_waits_for_active_search() {
		let mut engine = engine(40, 40);
		engine.get_settings_mut().max_frame_time = 0.0;
		engine.find_path(Vec3::new(-19.5, 0.0, -19.5), Vec3::new(19.5, 0.0, 19.5), |_, _| {});
		engine.tick();
		let ran = Arc::new(Mutex::new(false));
		let sink = ran.clone();
		engine.register_safe_node_update(move |_| *sink.lock().unwrap() = true);
		if !engine.is_idle() {
			assert!(!*ran.lock().unwrap());
		}
		engine.run_until_idle();
		assert!(*ran.lock().unwrap());
	}
	#[test]
	fn wraparound_cleanup_zeroes_every_tag() {
		let mut engine = engine(4, 4);
		engine.last_path_id = u16::MAX - 1;
		engine.find_path(Vec3::new(-1.5, 0.0, -1.5), Vec3::new(1.5, 0.0, 1.5), |_, _| {});
		engine.run_until_idle();
		assert_eq!(u16::MAX, engine.get_last_path_id());
		let graphs = engine.get_graphs();
		assert!(graphs.node_refs().any(|r| graphs.node(r).unwrap().get_path_id() == u16::MAX));
		let handle = engine.find_path(Vec3::new(-1.5, 0.0, -1.5), Vec3::new(1.5, 0.0, 1.5), |_, _| {});
		assert_eq!(1, handle.get_id());
		assert!(matches!(engine.queue.pop_front(), Some(QueueEntry::Cleanup)));
		engine.cleanup();
		assert_eq!(1, engine.get_cleanup_passes());
		let graphs = engine.get_graphs();
		assert!(graphs.node_refs().all(|r| graphs.node(r).unwrap().get_path_id() == 0));
		assert!(matches!(engine.queue.front(), Some(QueueEntry::Search(_))));
		engine.run_until_idle();
	}
	#[test]
	fn recycled_paths_return_to_pool() {
		let mut engine = engine(3, 3);
		engine.get_settings_mut().recycle_paths = true;
		engine.find_path(Vec3::ZERO, Vec3::ONE, |_, _| {});
		engine.run_until_idle();
		assert_eq!(1, engine.pooled_paths());
		let path = engine.acquire_path(PathKind::Standard, Vec3::ZERO, Vec3::ONE);
		assert_eq!(PathState::Created, path.get_state());
		assert_eq!(0, engine.pooled_paths());
	}
}
