//! Defines the Bevy [Plugin] which drives a [Pathfinder] once per frame
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod path_layer;
pub mod update_layer;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Path requests and graph updates are handed to the engine
	Submit,
	/// The engine searches within its frame budget
	Calculate,
	/// Finished paths are written to events and [Seeker]s
	Publish,
}

/// The engine shared by the pathfinding systems. Insert it to enable the
/// plugin, requests sent without it are logged and dropped
#[derive(Resource, Debug, Default)]
pub struct PathfindingEngine(Pathfinder);

impl PathfindingEngine {
	/// Create a new instance of [PathfindingEngine]
	pub fn new(pathfinder: Pathfinder) -> Self {
		PathfindingEngine(pathfinder)
	}
	pub fn get(&self) -> &Pathfinder {
		&self.0
	}
	pub fn get_mut(&mut self) -> &mut Pathfinder {
		&mut self.0
	}
}

pub struct AstarPathfindingPlugin;

impl Plugin for AstarPathfindingPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Int3>()
			.register_type::<NodeRef>()
			.register_type::<Heuristic>()
			.register_type::<PathfinderSettings>()
			.register_type::<GridGraphSettings>()
			.register_type::<PointGraphSettings>()
			.register_type::<NavMeshGraphSettings>()
			.register_type::<PathHandle>()
			.register_type::<Seeker>()
			.add_event::<path_layer::EventPathRequest>()
			.add_event::<path_layer::EventPathComplete>()
			.add_event::<update_layer::EventGraphUpdate>()
			.add_event::<update_layer::EventGraphsUpdated>()
			.configure_sets(
				Update,
				(
					OrderingSet::Submit,
					OrderingSet::Calculate,
					OrderingSet::Publish,
				)
					.chain(),
			)
			.add_systems(
				Update,
				(
					(
						path_layer::event_submit_path_requests,
						update_layer::event_enqueue_graph_updates,
					)
						.in_set(OrderingSet::Submit),
					update_layer::tick_engine.in_set(OrderingSet::Calculate),
					path_layer::publish_results.in_set(OrderingSet::Publish),
				),
			);
	}
}
