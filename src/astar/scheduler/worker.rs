//! Runs a [Pathfinder] on a dedicated thread. The engine sits behind a
//! single lock which the worker only holds for one budgeted tick at a time,
//! so the owning thread can submit paths and queue graph updates between
//! ticks.
//!
//! Callbacks run on the worker thread. They may use the engine they are
//! handed but must not touch state owned by the main thread
//!

use crate::prelude::*;
use bevy::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Empty polls after which the worker sleeps for longer
const FAST_POLLS: u32 = 100;
/// Sleep between empty polls while work arrived recently
const FAST_POLL_SLEEP: Duration = Duration::from_millis(1);
/// Sleep between empty polls once the queue has been empty for a while
const SLOW_POLL_SLEEP: Duration = Duration::from_millis(10);
/// How long shutdown waits for the worker to stop
const JOIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Lock `engine`, recovering from a panic on the other side of the lock
fn lock(engine: &Mutex<Pathfinder>) -> MutexGuard<'_, Pathfinder> {
	engine.lock().unwrap_or_else(|poisoned| {
		error!("A path callback panicked while holding the pathfinder");
		poisoned.into_inner()
	})
}

/// A [Pathfinder] drained by a background thread which is started on demand
/// and exits after idling for [PathfinderSettings::thread_timeout]
#[derive(Debug)]
pub struct BackgroundPathfinder {
	/// The shared engine
	engine: Arc<Mutex<Pathfinder>>,
	/// Handle of the running or last worker
	worker: Option<JoinHandle<()>>,
	/// Tells the worker to exit
	stop: Arc<AtomicBool>,
}

impl BackgroundPathfinder {
	/// Create a new instance of [BackgroundPathfinder], no thread is started
	/// until work is submitted
	pub fn new(engine: Pathfinder) -> Self {
		BackgroundPathfinder {
			engine: Arc::new(Mutex::new(engine)),
			worker: None,
			stop: Arc::new(AtomicBool::new(false)),
		}
	}
	/// Run `f` with the engine locked
	pub fn with_engine<R>(&self, f: impl FnOnce(&mut Pathfinder) -> R) -> R {
		f(&mut lock(&self.engine))
	}
	/// Whether a worker thread is currently alive
	pub fn is_running(&self) -> bool {
		self.worker.as_ref().is_some_and(|w| !w.is_finished())
	}
	/// Queue `path` and make sure a worker is draining the queue
	pub fn submit(&mut self, path: Path) -> PathHandle {
		let handle = lock(&self.engine).submit(path);
		self.ensure_worker();
		handle
	}
	/// Queue `update` for the next batch the worker applies
	pub fn update_graphs(&mut self, update: GraphUpdateObject) {
		lock(&self.engine).update_graphs(update);
		self.ensure_worker();
	}
	/// Start a worker unless one is alive
	fn ensure_worker(&mut self) {
		if self.is_running() {
			return;
		}
		if let Some(finished) = self.worker.take() {
			let _ = finished.join();
		}
		if self.stop.load(Ordering::Acquire) {
			return;
		}
		let engine = self.engine.clone();
		let stop = self.stop.clone();
		let spawned = std::thread::Builder::new()
			.name("pathfinder".to_string())
			.spawn(move || drain(engine, stop));
		match spawned {
			Ok(handle) => self.worker = Some(handle),
			Err(e) => error!("Failed to start the pathfinding thread: {}", e),
		}
	}
	/// Stop accepting paths, stop the worker and fail whatever is still
	/// queued. Returns the number of paths resolved with an error.
	///
	/// A worker which does not stop within a short timeout is detached, it
	/// exits on its own once its current tick ends
	pub fn shutdown(&mut self) -> usize {
		lock(&self.engine).set_accept_new_paths(false);
		self.stop.store(true, Ordering::Release);
		if let Some(worker) = self.worker.take() {
			let deadline = Instant::now() + JOIN_TIMEOUT;
			while !worker.is_finished() && Instant::now() < deadline {
				std::thread::sleep(FAST_POLL_SLEEP);
			}
			if worker.is_finished() {
				let _ = worker.join();
			} else {
				error!(
					"Pathfinding thread did not stop within {} ms, detaching it",
					JOIN_TIMEOUT.as_millis()
				);
			}
		}
		lock(&self.engine).shutdown()
	}
}

impl Drop for BackgroundPathfinder {
	fn drop(&mut self) {
		if !self.stop.load(Ordering::Acquire) {
			self.shutdown();
		}
	}
}

/// Worker loop, ticks while there is work and backs off while there isn't
#[cfg(not(tarpaulin_include))]
fn drain(engine: Arc<Mutex<Pathfinder>>, stop: Arc<AtomicBool>) {
	let timeout = lock(&engine).get_settings().get_thread_timeout();
	let mut idle_polls = 0;
	let mut idle_since = Instant::now();
	while !stop.load(Ordering::Acquire) {
		let (worked, waiting) = {
			let mut engine = lock(&engine);
			let busy = !engine.is_idle();
			if busy || engine.pending_graph_updates() > 0 {
				engine.tick();
			}
			(busy, engine.pending_graph_updates() > 0)
		};
		if worked {
			idle_polls = 0;
			idle_since = Instant::now();
			continue;
		}
		// throttled updates keep the worker alive until they are applied
		if !waiting && idle_since.elapsed() >= timeout {
			debug!("Pathfinding thread idle for {:?}, exiting", timeout);
			break;
		}
		idle_polls += 1;
		std::thread::sleep(if idle_polls > FAST_POLLS {
			SLOW_POLL_SLEEP
		} else {
			FAST_POLL_SLEEP
		});
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::mpsc;
	fn background(thread_timeout: f32) -> BackgroundPathfinder {
		let mut engine = Pathfinder::new(PathfinderSettings { thread_timeout, min_area_size: 0, ..Default::default() });
		engine.add_graph(NavGraph::Grid(GridGraph::new(GridGraphSettings { width: 8, depth: 8, ..Default::default() })));
		BackgroundPathfinder::new(engine)
	}
	#[test]
	fn worker_delivers_results() {
		let mut bg = background(5.0);
		let (tx, rx) = mpsc::channel();
		let path = Path::new(Vec3::new(-3.5, 0.0, -3.5), Vec3::new(3.5, 0.0, 3.5))
			.with_callback(move |r, _| { let _ = tx.send(r.get_nodes().len()); });
		bg.submit(path);
		assert_eq!(8, rx.recv_timeout(Duration::from_secs(5)).unwrap());
		bg.shutdown();
	}
	#[test]
	fn idle_worker_exits_and_restarts() {
		let mut bg = background(0.02);
		let (tx, rx) = mpsc::channel();
		let first = tx.clone();
		bg.submit(Path::new(Vec3::ZERO, Vec3::ONE).with_callback(move |_, _| { let _ = first.send(1); }));
		rx.recv_timeout(Duration::from_secs(5)).unwrap();
		let deadline = Instant::now() + Duration::from_secs(5);
		while bg.is_running() && Instant::now() < deadline {
			std::thread::sleep(Duration::from_millis(5));
		}
		assert!(!bg.is_running());
		bg.submit(Path::new(Vec3::ONE, Vec3::ZERO).with_callback(move |_, _| { let _ = tx.send(2); }));
		assert_eq!(2, rx.recv_timeout(Duration::from_secs(5)).unwrap());
	}
	#[test]
	fn shutdown_rejects_new_paths() {
		let mut bg = background(5.0);
		bg.shutdown();
		let (tx, rx) = mpsc::channel();
		bg.submit(Path::new(Vec3::ZERO, Vec3::ONE).with_callback(move |r, _| { let _ = tx.send(r.get_error()); }));
		assert_eq!(Some(PathError::NotAcceptingPaths), rx.recv_timeout(Duration::from_secs(1)).unwrap());
		assert!(!bg.is_running());
	}
}
