//! Graph updates requested through events and the per frame engine tick
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Queue a [GraphUpdateObject] for the next batch
#[derive(Event, Clone, Debug)]
pub struct EventGraphUpdate(GraphUpdateObject);

impl EventGraphUpdate {
	/// Create a new instance of [EventGraphUpdate]
	pub fn new(update: GraphUpdateObject) -> Self {
		EventGraphUpdate(update)
	}
	pub fn get_update(&self) -> &GraphUpdateObject {
		&self.0
	}
}

/// Emitted after the engine applied a batch of updates. Tracked updates
/// carry their node backups and can be reverted through the engine
#[derive(Event, Clone, Debug)]
pub struct EventGraphsUpdated(Vec<GraphUpdateObject>);

impl EventGraphsUpdated {
	pub fn get_updates(&self) -> &[GraphUpdateObject] {
		&self.0
	}
}

/// Read [EventGraphUpdate]s and hand them to the engine
#[cfg(not(tarpaulin_include))]
pub fn event_enqueue_graph_updates(
	mut events: EventReader<EventGraphUpdate>,
	engine: Option<ResMut<PathfindingEngine>>,
) {
	let Some(mut engine) = engine else {
		for _ in events.read() {
			warn!("No PathfindingEngine resource, dropping graph update");
		}
		return;
	};
	for event in events.read() {
		engine.get_mut().update_graphs(event.0.clone());
	}
}

/// Let the engine search for the frame budget and report applied updates
#[cfg(not(tarpaulin_include))]
pub fn tick_engine(
	engine: Option<ResMut<PathfindingEngine>>,
	mut event_updated: EventWriter<EventGraphsUpdated>,
) {
	let Some(mut engine) = engine else {
		return;
	};
	let engine = engine.get_mut();
	if engine.is_idle() && engine.pending_graph_updates() == 0 {
		return;
	}
	engine.tick();
	let applied = engine.take_applied_updates();
	if !applied.is_empty() {
		event_updated.write(EventGraphsUpdated(applied));
	}
}
