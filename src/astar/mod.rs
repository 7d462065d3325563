//! A* search over a set of navigation graphs.
//!
//! Every walkable surface is described by a graph of [node::Node]s. A
//! [graphs::grid_graph::GridGraph] covers a regular grid of cells, a
//! [graphs::point_graph::PointGraph] links arbitrary points within a distance
//! of each other and a [graphs::navmesh_graph::NavMeshGraph] places a node on
//! each triangle of a mesh. Up to 32 graphs can be loaded at once and a
//! node is addressed by the pair of its graph index and its index inside
//! that graph.
//!
//! A [path::Path] snaps its end points to the nearest suitable nodes and then
//! expands nodes in order of `F = G + H` until the end is found:
//!
//! * G - the accumulated cost of reaching a node from the start
//! * H - the heuristic estimate from a node to the end
//!
//! Costs are integers, one world unit of distance costs `100`.
//!
//! The [scheduler::Pathfinder] owns the graphs and a FIFO queue of paths and
//! searches for a bounded amount of time per tick, so long searches are
//! spread across many frames. Graph updates are applied between searches.
//!
//! Connected components of the graphs are labelled with an area by
//! [updates::flood_fill], which makes unreachable requests fail without a
//! search.
//!

pub mod constraint;
pub mod coordinate;
pub mod error;
pub mod graphs;
pub mod heap;
pub mod node;
pub mod path;
#[cfg(feature = "ron")]
pub mod persistence;
pub mod scheduler;
pub mod updates;
