//! Failure modes of path requests and of loading persisted data.
//!
//! A failed path is not exceptional, the error is a terminal state carried
//! by the path and handed to whoever requested it
//!

/// Why a path did not produce a route
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum PathError {
	/// The engine holds no graphs
	#[error("No graphs have been added to the pathfinder")]
	NoGraphs,
	/// The engine is shutting down or was told to reject requests
	#[error("The pathfinder is not accepting new paths")]
	NotAcceptingPaths,
	/// Nearest-node lookup of the start point found nothing
	#[error("Could not find a node close to the start point")]
	NoStartNode,
	/// The start resolved to a node which can't be traversed
	#[error("The node closest to the start point is not walkable")]
	StartNotWalkable,
	/// Nearest-node lookup of the end point found nothing
	#[error("Could not find a node close to the end point")]
	NoEndNode,
	/// The end resolved to a node which can't be traversed
	#[error("The node closest to the end point is not walkable")]
	EndNotWalkable,
	/// Start and end lie in areas which are not connected
	#[error("The start area {start_area} and end area {end_area} are not connected")]
	Unreachable {
		/// Area of the start node
		start_area: u8,
		/// Area of the end node
		end_area: u8,
	},
	/// The open list ran dry before the end was reached
	#[error("Searched all reachable nodes but could not find the target")]
	NoPathExists,
	/// Tracing the parent chain did not reach the start in time, a cycle is
	/// the likely cause
	#[error("Path trace exceeded {limit} nodes, the parent chain is probably cyclic")]
	TraceTooLong {
		/// Maximum chain length
		limit: usize,
	},
	/// The path has been searched before and was submitted again without a
	/// reset
	#[error("The path has already been processed")]
	AlreadyProcessed,
	/// The request was withdrawn by its owner
	#[error("The path was cancelled")]
	Cancelled,
	/// The engine shut down while the path was queued
	#[error("The pathfinder shut down before the path was calculated")]
	ShutDown,
}

impl PathError {
	/// Whether the error only says that no route connects the end points,
	/// as opposed to a misconfigured request
	pub fn is_no_path(&self) -> bool {
		matches!(self, PathError::Unreachable { .. } | PathError::NoPathExists)
	}
}

/// Why persisted data could not be read
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	/// Reading the file failed
	#[error("Failed to read file: {0}")]
	Io(#[from] std::io::Error),
	/// The text is not valid ron for the expected type
	#[cfg(feature = "ron")]
	#[error("Failed to decode ron: {0}")]
	Ron(#[from] ron::error::SpannedError),
	/// A value could not be encoded as ron
	#[cfg(feature = "ron")]
	#[error("Failed to encode ron: {0}")]
	RonEncode(#[from] ron::Error),
	/// The CSV reader rejected the file
	#[cfg(feature = "csv")]
	#[error("Failed to read csv: {0}")]
	Csv(#[from] csv::Error),
	/// The two graph counts of a save disagree
	#[error("Graph count {count} does not match its check value {check}, the data is corrupt")]
	GraphCountMismatch {
		/// First copy of the count
		count: usize,
		/// Second copy of the count
		check: usize,
	},
	/// The content is well formed but describes something impossible
	#[error("Invalid data: {0}")]
	Format(String),
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn no_path_classification() {
		assert!(PathError::NoPathExists.is_no_path());
		assert!(PathError::Unreachable { start_area: 1, end_area: 2 }.is_no_path());
		assert!(!PathError::NoGraphs.is_no_path());
	}
	#[test]
	fn messages_name_the_areas() {
		let e = PathError::Unreachable { start_area: 3, end_area: 7 };
		assert_eq!("The start area 3 and end area 7 are not connected", e.to_string());
	}
}
