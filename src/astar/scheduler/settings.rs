//! Tunables of a [Pathfinder]
//!

use crate::prelude::*;
use bevy::prelude::*;
use std::time::Duration;

/// Convert seconds to a [Duration] at microsecond precision, negative values
/// become zero
fn seconds_to_duration(seconds: f32) -> Duration {
	Duration::from_micros((seconds.max(0.0) * 1_000_000.0).round() as u64)
}

/// How much is logged about each finished path
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum PathLog {
	/// Nothing
	None,
	/// Failed paths only
	OnlyErrors,
	/// A line per path with its duration, searched nodes and length
	#[default]
	Normal,
	/// The normal line followed by the end points, heuristic and every
	/// traced node
	Heavy,
}

/// Configuration of a [Pathfinder]
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, PartialEq, Debug, Reflect)]
pub struct PathfinderSettings {
	/// Search time each tick may spend, in milliseconds. A tick always
	/// finishes the step it is in so this is a soft ceiling
	pub max_frame_time: f32,
	/// Capacity of the open list
	pub binary_heap_size: usize,
	/// Connected components with fewer nodes share the undersized area
	pub min_area_size: u32,
	/// Keep finished paths for reuse by later requests
	pub recycle_paths: bool,
	/// Throttle graph updates to at most one batch per
	/// [PathfinderSettings::max_graph_update_freq]
	pub limit_graph_updates: bool,
	/// Minimum time between two applied update batches, in seconds
	pub max_graph_update_freq: f32,
	/// Idle time after which a background worker exits, in seconds
	pub thread_timeout: f32,
	/// Accept the first graph with a node close enough instead of comparing
	/// all graphs
	pub prioritize_graphs: bool,
	/// Distance in world units under which a graph is accepted when
	/// prioritising
	pub prioritize_graphs_limit: f32,
	/// Result logging
	pub log_path_results: PathLog,
	/// Heuristic of paths which don't pick their own
	pub heuristic: Heuristic,
	/// Scale of the heuristic of paths which don't pick their own
	pub heuristic_scale: f32,
	/// Whether new requests are queued or rejected
	pub accept_new_paths: bool,
	/// Longest parent chain a trace follows, `None` uses the total node count
	pub max_trace_length: Option<usize>,
}

impl Default for PathfinderSettings {
	fn default() -> Self {
		PathfinderSettings {
			max_frame_time: 1.0,
			binary_heap_size: 5000,
			min_area_size: 10,
			recycle_paths: false,
			limit_graph_updates: true,
			max_graph_update_freq: 0.2,
			thread_timeout: 5.0,
			prioritize_graphs: false,
			prioritize_graphs_limit: 1.0,
			log_path_results: PathLog::Normal,
			heuristic: Heuristic::Euclidean,
			heuristic_scale: 1.0,
			accept_new_paths: true,
			max_trace_length: None,
		}
	}
}

impl PathfinderSettings {
	/// Get the per tick search budget
	pub fn get_frame_budget(&self) -> Duration {
		seconds_to_duration(self.max_frame_time / 1000.0)
	}
	/// Get the minimum time between update batches
	pub fn get_graph_update_interval(&self) -> Duration {
		seconds_to_duration(self.max_graph_update_freq)
	}
	/// Get the idle time after which a worker exits
	pub fn get_thread_timeout(&self) -> Duration {
		seconds_to_duration(self.thread_timeout)
	}
	/// Get the longest parent chain a trace may follow over `graphs`
	pub fn get_trace_limit(&self, graphs: &Graphs) -> usize {
		self.max_trace_length
			.unwrap_or_else(|| graphs.total_nodes())
			.max(1)
	}
	/// From a `ron` file generate the [PathfinderSettings], missing fields
	/// keep their defaults
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, LoadError> {
		let file = std::fs::File::open(path)?;
		let settings = ron::de::from_reader(file)?;
		Ok(settings)
	}
}
