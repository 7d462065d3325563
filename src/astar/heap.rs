//! The open list of a search, a fixed capacity binary min-heap keyed on the
//! F score of a node
//!
//! Slots are 1-indexed so that the parent of `i` is `i / 2` and its children
//! are `2i` and `2i + 1`. Slot `0` is never read
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A node waiting in the open list alongside the F score it was pushed with
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HeapEntry {
	/// The queued node
	node: NodeRef,
	/// F score at the time of insertion
	f: u32,
}

impl HeapEntry {
	/// Create a new instance of [HeapEntry]
	pub fn new(node: NodeRef, f: u32) -> Self {
		HeapEntry { node, f }
	}
	pub fn get_node(&self) -> NodeRef {
		self.node
	}
	pub fn get_f(&self) -> u32 {
		self.f
	}
}

/// Array backed min-heap which never grows past the capacity it was created
/// with. Ties are not ordered, callers must not rely on insertion order
#[derive(Clone, Debug)]
pub struct BinaryHeap {
	/// Storage, `entries[0]` is unused
	entries: Vec<HeapEntry>,
	/// Number of live entries
	num_items: usize,
}

impl BinaryHeap {
	/// Create a new instance of [BinaryHeap] able to hold `capacity` entries
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		BinaryHeap {
			entries: vec![HeapEntry::default(); capacity + 1],
			num_items: 0,
		}
	}
	/// Maximum number of entries the heap can hold
	pub fn capacity(&self) -> usize {
		self.entries.len() - 1
	}
	pub fn len(&self) -> usize {
		self.num_items
	}
	pub fn is_empty(&self) -> bool {
		self.num_items == 0
	}
	/// Drop every entry without releasing storage
	pub fn clear(&mut self) {
		self.num_items = 0;
	}
	/// Get the entry with the lowest F score without removing it
	pub fn peek(&self) -> Option<HeapEntry> {
		if self.is_empty() {
			None
		} else {
			Some(self.entries[1])
		}
	}
	/// Insert `node` with score `f`.
	///
	/// When the heap is full the last slot is overwritten, the entry that was
	/// stored there is lost
	pub fn add(&mut self, node: NodeRef, f: u32) {
		if self.num_items == self.capacity() {
			warn!(
				"Open list is full ({} entries), overwriting its last entry. Increase the binary heap size",
				self.capacity()
			);
		} else {
			self.num_items += 1;
		}
		let mut bubble = self.num_items;
		self.entries[bubble] = HeapEntry::new(node, f);
		while bubble > 1 {
			let parent = bubble / 2;
			if self.entries[bubble].f <= self.entries[parent].f {
				self.entries.swap(bubble, parent);
				bubble = parent;
			} else {
				break;
			}
		}
	}
	/// Remove and return the entry with the lowest F score
	pub fn remove(&mut self) -> Option<HeapEntry> {
		if self.is_empty() {
			return None;
		}
		let root = self.entries[1];
		self.entries[1] = self.entries[self.num_items];
		self.num_items -= 1;
		let mut v = 1;
		loop {
			let u = v;
			let left = 2 * u;
			let right = left + 1;
			if right <= self.num_items {
				if self.entries[u].f >= self.entries[left].f {
					v = left;
				}
				if self.entries[v].f >= self.entries[right].f {
					v = right;
				}
			} else if left <= self.num_items && self.entries[u].f >= self.entries[left].f {
				v = left;
			}
			if u != v {
				self.entries.swap(u, v);
			} else {
				break;
			}
		}
		Some(root)
	}
	/// Refresh every stored score with `score_of` and restore the heap
	/// property. Used when node costs change while they sit in the open list
	pub fn rebuild(&mut self, score_of: impl Fn(NodeRef) -> u32) {
		for i in 1..=self.num_items {
			let node = self.entries[i].node;
			self.entries[i].f = score_of(node);
		}
		for i in 2..=self.num_items {
			let mut bubble = i;
			while bubble > 1 {
				let parent = bubble / 2;
				if self.entries[bubble].f < self.entries[parent].f {
					self.entries.swap(bubble, parent);
					bubble = parent;
				} else {
					break;
				}
			}
		}
	}
}
