//! Saving and loading [Graphs] as `ron`.
//!
//! The save is an envelope holding the graph count twice and one block per
//! graph. A block carries the graph's index, kind, GUID and two independent
//! payloads, its settings and its node data, each as its own `ron` string so
//! that a damaged payload only takes its own graph down. Such a graph is
//! replaced by an empty one and the text of the block is handed back for
//! inspection
//!

use crate::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted form of one graph
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GraphBlock {
	/// Graph index at the time of saving, the block is placed at this slot
	pub index: u8,
	/// [NavGraph::type_name] of the graph
	pub type_name: String,
	/// Identity of the graph across saves
	pub guid: Uuid,
	/// Graph settings encoded as `ron`
	pub settings: String,
	/// Node data encoded as `ron`
	pub nodes: String,
}

/// Top level of a save
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GraphsEnvelope {
	/// Number of graphs
	pub graph_count: usize,
	/// Copy of [GraphsEnvelope::graph_count], a mismatch means corruption
	pub graph_count_check: usize,
	/// One block per graph
	pub blocks: Vec<GraphBlock>,
}

/// Node data of a [GridGraph]
#[derive(Serialize, Deserialize)]
struct GridNodes {
	/// Nodes row by row
	nodes: Vec<Node>,
	/// Packed neighbour flags
	links: Vec<u8>,
}

/// Node data of a [NavMeshGraph]
#[derive(Serialize, Deserialize)]
struct MeshNodes {
	/// Deduplicated vertices
	vertices: Vec<Int3>,
	/// Vertex indices of each triangle
	triangles: Vec<[u32; 3]>,
	/// One node per triangle
	nodes: Vec<Node>,
}

/// Outcome of a load which did not fail outright
#[derive(Debug, Default)]
pub struct LoadedGraphs {
	/// Recovered graphs, damaged ones are empty point graphs
	graphs: Graphs,
	/// Text of each block which could not be restored, or of the whole save
	/// when the envelope itself was unreadable
	corrupt: Vec<String>,
}

impl LoadedGraphs {
	pub fn get_graphs(&self) -> &Graphs {
		&self.graphs
	}
	pub fn into_graphs(self) -> Graphs {
		self.graphs
	}
	/// Get the raw text of everything that could not be restored
	pub fn get_corrupt(&self) -> &[String] {
		&self.corrupt
	}
	pub fn is_clean(&self) -> bool {
		self.corrupt.is_empty()
	}
}

/// Encode one graph
fn to_block(graph: &NavGraph) -> Result<GraphBlock, LoadError> {
	let (settings, nodes) = match graph {
		NavGraph::Grid(g) => (
			ron::to_string(g.get_settings())?,
			ron::to_string(&GridNodes {
				nodes: g.get_nodes().to_vec(),
				links: g.get_links().to_vec(),
			})?,
		),
		NavGraph::Point(g) => (
			ron::to_string(g.get_settings())?,
			ron::to_string(&g.get_nodes().to_vec())?,
		),
		NavGraph::NavMesh(g) => (
			ron::to_string(g.get_settings())?,
			ron::to_string(&MeshNodes {
				vertices: g.get_vertices().to_vec(),
				triangles: g.get_triangles().to_vec(),
				nodes: g.get_nodes().to_vec(),
			})?,
		),
	};
	Ok(GraphBlock {
		index: graph.get_graph_index(),
		type_name: graph.type_name().to_string(),
		guid: graph.get_guid(),
		settings,
		nodes,
	})
}

/// Decode one graph, the nodes keep the graph index of the block
fn from_block(block: &GraphBlock) -> Result<NavGraph, LoadError> {
	let mut graph = match block.type_name.as_str() {
		GridGraph::TYPE_NAME => {
			let settings: GridGraphSettings = ron::from_str(&block.settings)?;
			if settings.width == 0 || settings.depth == 0 || settings.node_size <= 0.0 {
				return Err(LoadError::Format("grid without cells".to_string()));
			}
			let data: GridNodes = ron::from_str(&block.nodes)?;
			let mut grid = GridGraph::new(settings);
			if !grid.set_scan(data.nodes, data.links) {
				return Err(LoadError::Format("grid node count does not match its size".to_string()));
			}
			grid.store_graph_index(block.index);
			NavGraph::Grid(grid)
		}
		PointGraph::TYPE_NAME => {
			let settings: PointGraphSettings = ron::from_str(&block.settings)?;
			let nodes: Vec<Node> = ron::from_str(&block.nodes)?;
			let mut points = PointGraph::new(settings);
			points.set_nodes(nodes);
			points.store_graph_index(block.index);
			NavGraph::Point(points)
		}
		NavMeshGraph::TYPE_NAME => {
			let settings: NavMeshGraphSettings = ron::from_str(&block.settings)?;
			let data: MeshNodes = ron::from_str(&block.nodes)?;
			let mut mesh = NavMeshGraph::new(settings);
			if !mesh.set_mesh(data.vertices, data.triangles, data.nodes) {
				return Err(LoadError::Format("triangles do not match the vertices or nodes".to_string()));
			}
			mesh.store_graph_index(block.index);
			NavGraph::NavMesh(mesh)
		}
		other => return Err(LoadError::Format(format!("unknown graph type `{}`", other))),
	};
	graph.set_guid(block.guid);
	Ok(graph)
}

/// Stand-in for a graph which could not be restored
fn empty_graph(index: u8, guid: Option<Uuid>) -> NavGraph {
	let mut points = PointGraph::new(PointGraphSettings::default());
	points.store_graph_index(index);
	if let Some(guid) = guid {
		points.set_guid(guid);
	}
	NavGraph::Point(points)
}

/// Encode every graph as `ron` text
pub fn serialise_graphs(graphs: &Graphs) -> Result<String, LoadError> {
	let blocks = graphs.iter().map(to_block).collect::<Result<Vec<_>, _>>()?;
	let envelope = GraphsEnvelope {
		graph_count: blocks.len(),
		graph_count_check: blocks.len(),
		blocks,
	};
	Ok(ron::ser::to_string_pretty(&envelope, ron::ser::PrettyConfig::default())?)
}

/// Decode graphs from `ron` text.
///
/// Fails only when the two graph counts disagree. An unreadable envelope
/// yields no graphs and a damaged block an empty graph, in both cases the
/// raw text is kept in [LoadedGraphs::get_corrupt]
pub fn deserialise_graphs(text: &str) -> Result<LoadedGraphs, LoadError> {
	let envelope: GraphsEnvelope = match ron::from_str(text) {
		Ok(envelope) => envelope,
		Err(e) => {
			error!("Graph save is corrupt, no graphs were loaded: {}", e);
			return Ok(LoadedGraphs {
				graphs: Graphs::new(),
				corrupt: vec![text.to_string()],
			});
		}
	};
	if envelope.graph_count != envelope.graph_count_check {
		error!(
			"Graph count {} does not match its check value {}",
			envelope.graph_count, envelope.graph_count_check
		);
		return Err(LoadError::GraphCountMismatch {
			count: envelope.graph_count,
			check: envelope.graph_count_check,
		});
	}
	let count = envelope.graph_count.min(MAX_GRAPHS);
	let mut slots: Vec<Option<NavGraph>> = (0..count).map(|_| None).collect();
	let mut corrupt = Vec::new();
	for block in envelope.blocks.iter() {
		let Some(slot) = slots.get_mut(block.index as usize) else {
			error!("Graph block {} lies outside the graph count {}", block.index, count);
			corrupt.push(ron::to_string(block)?);
			continue;
		};
		match from_block(block) {
			Ok(graph) => *slot = Some(graph),
			Err(e) => {
				error!(
					"Failed to load {} graph {}, using an empty graph: {}",
					block.type_name, block.index, e
				);
				*slot = Some(empty_graph(block.index, Some(block.guid)));
				corrupt.push(ron::to_string(block)?);
			}
		}
	}
	let mut graphs = Graphs::new();
	for (i, slot) in slots.into_iter().enumerate() {
		let graph = slot.unwrap_or_else(|| {
			warn!("No block found for graph {}, using an empty graph", i);
			empty_graph(i as u8, None)
		});
		graphs.add(graph);
	}
	Ok(LoadedGraphs { graphs, corrupt })
}

/// Write every graph to the file at `path`
pub fn save_graphs(graphs: &Graphs, path: &str) -> Result<(), LoadError> {
	let text = serialise_graphs(graphs)?;
	std::fs::write(path, text)?;
	Ok(())
}

/// Read graphs from the file at `path`
pub fn load_graphs(path: &str) -> Result<LoadedGraphs, LoadError> {
	let text = std::fs::read_to_string(path)?;
	deserialise_graphs(&text)
}
