//! Path requests from entities and the delivery of their results
//!

use crate::prelude::*;
use bevy::prelude::*;
use std::collections::BTreeMap;

/// Tracks the path requests of an entity. A new request supersedes one still
/// in flight
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component)]
pub struct Seeker {
	/// The request waiting for a result
	in_flight: Option<PathHandle>,
	/// Outcome of the most recent request
	#[reflect(ignore)]
	last_result: Option<PathResult>,
	/// Whether routes begin and end on the requested positions rather than
	/// the centres of their end nodes
	exact_end_points: bool,
}

impl Default for Seeker {
	fn default() -> Self {
		Seeker {
			in_flight: None,
			last_result: None,
			exact_end_points: true,
		}
	}
}

impl Seeker {
	/// Keep the node centres at either end of each route instead of the
	/// requested positions
	pub fn with_exact_end_points(mut self, exact: bool) -> Self {
		self.exact_end_points = exact;
		self
	}
	pub fn has_exact_end_points(&self) -> bool {
		self.exact_end_points
	}
	pub fn get_in_flight(&self) -> Option<PathHandle> {
		self.in_flight
	}
	pub fn get_last_result(&self) -> Option<&PathResult> {
		self.last_result.as_ref()
	}
	/// Whether a request is being searched for
	pub fn is_searching(&self) -> bool {
		self.in_flight.is_some()
	}
	/// Take the latest result, leaving the seeker empty
	pub fn take_last_result(&mut self) -> Option<PathResult> {
		self.last_result.take()
	}
}

/// A request to find a path for an entity from `start` to `end`
#[derive(Event, Clone, Debug)]
pub struct EventPathRequest {
	/// The entity the path is for
	entity: Entity,
	/// World position the path starts from
	start: Vec3,
	/// World position the path leads to
	end: Vec3,
	/// Tags the path may traverse
	enabled_tags: u32,
}

impl EventPathRequest {
	pub fn new(entity: Entity, start: Vec3, end: Vec3) -> Self {
		EventPathRequest {
			entity,
			start,
			end,
			enabled_tags: u32::MAX,
		}
	}
	/// Restrict the path to nodes sharing a bit with `tags`
	pub fn with_enabled_tags(mut self, tags: u32) -> Self {
		self.enabled_tags = tags;
		self
	}
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	pub fn get_start(&self) -> Vec3 {
		self.start
	}
	pub fn get_end(&self) -> Vec3 {
		self.end
	}
}

/// Emitted once for every request which was searched to completion
#[derive(Event, Clone, Debug)]
pub struct EventPathComplete(PathResult);

impl EventPathComplete {
	pub fn get_result(&self) -> &PathResult {
		&self.0
	}
	/// The entity which requested the path
	pub fn get_entity(&self) -> Option<Entity> {
		self.0.get_owner()
	}
}

/// Read [EventPathRequest]s and submit them to the engine. Only the last
/// request of each entity within a frame is kept, and any earlier request
/// still in flight for a [Seeker] is cancelled
#[cfg(not(tarpaulin_include))]
pub fn event_submit_path_requests(
	mut events: EventReader<EventPathRequest>,
	engine: Option<ResMut<PathfindingEngine>>,
	mut seekers: Query<&mut Seeker>,
) {
	let Some(mut engine) = engine else {
		for event in events.read() {
			warn!(
				"No PathfindingEngine resource, dropping path request of {:?}",
				event.entity
			);
		}
		return;
	};
	// several requests from one entity within a frame collapse into the latest
	let mut latest: BTreeMap<Entity, &EventPathRequest> = BTreeMap::new();
	for event in events.read() {
		latest.insert(event.entity, event);
	}
	let engine = engine.get_mut();
	for (entity, event) in latest {
		let path = engine
			.acquire_path(PathKind::Standard, event.start, event.end)
			.with_owner(entity)
			.with_enabled_tags(event.enabled_tags);
		if let Ok(mut seeker) = seekers.get_mut(entity) {
			if let Some(old) = seeker.in_flight.take() {
				engine.cancel(old);
			}
			seeker.in_flight = Some(engine.submit(path));
		} else {
			engine.submit(path);
		}
	}
}

/// Write finished paths into their [Seeker]s and emit an
/// [EventPathComplete] for each. Results of a [Seeker] with exact end points
/// are adjusted before either sees them
#[cfg(not(tarpaulin_include))]
pub fn publish_results(
	engine: Option<ResMut<PathfindingEngine>>,
	mut seekers: Query<&mut Seeker>,
	mut event_complete: EventWriter<EventPathComplete>,
) {
	let Some(mut engine) = engine else {
		return;
	};
	for mut result in engine.get_mut().drain_results() {
		if let Some(mut seeker) = result.get_owner().and_then(|e| seekers.get_mut(e).ok()) {
			if seeker.exact_end_points {
				result.apply_exact_end_points();
			}
			if seeker
				.in_flight
				.is_some_and(|h| h.get_ticket() == result.get_ticket())
			{
				seeker.in_flight = None;
				seeker.last_result = Some(result.clone());
			}
		}
		event_complete.write(EventPathComplete(result));
	}
}
