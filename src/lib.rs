//! This is a plugin for Bevy game engine to find paths with the A* algorithm over grid, point and navmesh graphs
//!

pub mod astar;
pub mod plugin;

pub mod prelude;
