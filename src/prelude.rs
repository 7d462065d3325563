//! `use bevy_astar_navigation_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::astar::{
	constraint::*,
	coordinate::*,
	error::*,
	graphs::{grid_graph::*, navmesh_graph::*, point_graph::*, *},
	heap::*,
	node::*,
	path::{expansion::*, *},
	scheduler::{settings::*, worker::*, *},
	updates::{flood_fill::*, *},
};

#[cfg(feature = "ron")]
#[doc(hidden)]
pub use crate::astar::persistence::*;

#[doc(hidden)]
pub use crate::plugin::{path_layer::*, update_layer::*, *};
