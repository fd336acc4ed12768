//! Mapping row positions to the partition (heading group) they fall into.

use crate::payload::PartitionSpec;
use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
	pub name: String,
	pub start_index: usize,
	pub limit_index: usize,
	/// Lowest coverage level of any row seen in this partition so far. Only ever decreases.
	pub min_coverage_seen: Option<i32>,
}

impl Partition {
	#[must_use]
	pub fn contains(&self, index: usize) -> bool {
		self.start_index <= index && index < self.limit_index
	}

	/// Unnamed partitions don't get a heading.
	#[must_use]
	pub fn is_named(&self) -> bool {
		!self.name.is_empty()
	}

	/// The coverage class of this partition's heading, if any row has been seen.
	#[must_use]
	pub fn coverage_class(&self) -> Option<String> {
		self.min_coverage_seen.map(|coverage| format!("cov{}", coverage))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionIndex {
	partitions: Vec<Partition>,
	current: Option<usize>,
}

impl PartitionIndex {
	#[must_use]
	pub fn new(specs: &[PartitionSpec]) -> Self {
		Self {
			partitions: specs
				.iter()
				.map(|spec| Partition {
					name: spec.name.clone(),
					start_index: spec.start,
					limit_index: spec.limit,
					min_coverage_seen: None,
				})
				.collect(),
			current: None,
		}
	}

	/// Finds the partition containing row position `index`.
	///
	/// The most recently returned partition is checked first, since rows are visited in order.
	/// A position outside every partition yields [`None`]: such rows render without a heading.
	pub fn locate(&mut self, index: usize) -> Option<usize> {
		if let Some(current) = self.current {
			if self.partitions[current].contains(index) {
				return Some(current);
			}
		}
		match self.partitions.iter().position(|partition| partition.contains(index)) {
			Some(found) => {
				trace!(index, partition = %self.partitions[found].name, "Entered partition.");
				self.current = Some(found);
				Some(found)
			}
			None => {
				if !self.partitions.is_empty() {
					warn!("Row position {} is outside every partition; showing it without a heading.", index);
				}
				self.current = None;
				None
			}
		}
	}

	/// Records a row of `coverage` in partition `partition`. Returns whether the minimum changed.
	pub fn observe(&mut self, partition: usize, coverage: i32) -> bool {
		let partition = match self.partitions.get_mut(partition) {
			Some(partition) => partition,
			None => return false,
		};
		match partition.min_coverage_seen {
			Some(min) if min <= coverage => false,
			_ => {
				partition.min_coverage_seen = Some(coverage);
				true
			}
		}
	}

	#[must_use]
	pub fn get(&self, partition: usize) -> Option<&Partition> {
		self.partitions.get(partition)
	}

	#[must_use]
	pub fn partitions(&self) -> &[Partition] {
		&self.partitions
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.partitions.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.partitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn spec(name: &str, start: usize, limit: usize) -> PartitionSpec {
		PartitionSpec { name: name.to_owned(), start, limit }
	}

	#[test]
	fn locate_in_order_and_out_of_order() {
		let mut index = PartitionIndex::new(&[spec("A", 0, 2), spec("B", 2, 5)]);
		assert_eq!(index.locate(0), Some(0));
		assert_eq!(index.locate(1), Some(0));
		assert_eq!(index.locate(4), Some(1));
		assert_eq!(index.locate(0), Some(0));
		assert_eq!(index.locate(5), None);
	}

	#[test]
	fn coverage_only_decreases() {
		let mut index = PartitionIndex::new(&[spec("A", 0, 3)]);
		assert!(index.observe(0, 60));
		assert!(index.observe(0, 10));
		assert!(!index.observe(0, 30));
		assert!(!index.observe(0, 10));
		assert_eq!(index.get(0).unwrap().min_coverage_seen, Some(10));
		assert_eq!(index.get(0).unwrap().coverage_class().as_deref(), Some("cov10"));
		assert!(!index.observe(7, 0));
	}

	#[test]
	fn unnamed_partitions() {
		let index = PartitionIndex::new(&[spec("", 0, 1)]);
		assert!(!index.get(0).unwrap().is_named());
	}
}
