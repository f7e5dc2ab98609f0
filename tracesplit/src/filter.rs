//! Set filter

// Imports
use {
	crate::{CacheGeometry, Error},
	itertools::Itertools,
	std::collections::HashSet,
};

/// The cache sets used in the paper "An Imitation Learning Approach to Cache Replacement"
pub const PAPER_CACHE_SETS: [u64; 32] = [
	4, 3, 2, 14, 8, 10, 5, 1, 11, 0, 7, 13, 6, 12, 9, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
];

/// Set filter.
///
/// Accepts accesses whose set index is one of the configured sets.
#[derive(Clone, Debug)]
pub struct SetFilter {
	/// Accepted set indices
	sets: HashSet<u64>,
}

impl SetFilter {
	/// Creates a new filter accepting `sets`.
	///
	/// # Errors
	/// Returns an error if any set doesn't exist in `geometry`.
	pub fn new(sets: impl IntoIterator<Item = u64>, geometry: &CacheGeometry) -> Result<Self, Error> {
		let sets = sets.into_iter().collect::<HashSet<_>>();

		let num_sets = geometry.num_sets();
		let invalid_sets = sets.iter().filter(|&&set| set >= num_sets).sorted().collect::<Vec<_>>();
		if !invalid_sets.is_empty() {
			return Err(Error::config(format!(
				"Cache sets [{}] are out of range, cache only has {num_sets} sets",
				invalid_sets.iter().format(", ")
			)));
		}

		Ok(Self { sets })
	}

	/// Creates a filter with the sets from [`PAPER_CACHE_SETS`] that exist in `geometry`.
	///
	/// Sets that don't exist are skipped with a warning.
	pub fn paper_sets(geometry: &CacheGeometry) -> Self {
		let num_sets = geometry.num_sets();
		let (sets, skipped) = PAPER_CACHE_SETS
			.iter()
			.copied()
			.partition::<Vec<_>, _>(|&set| set < num_sets);

		if !skipped.is_empty() {
			tracing::warn!(
				"Skipping default cache sets [{}], cache only has {num_sets} sets",
				skipped.iter().sorted().format(", ")
			);
		}

		Self {
			sets: sets.into_iter().collect(),
		}
	}

	/// Returns if `set_index` is accepted
	pub fn accepts(&self, set_index: u64) -> bool {
		self.sets.contains(&set_index)
	}

	/// Returns all accepted sets
	pub fn sets(&self) -> &HashSet<u64> {
		&self.sets
	}
}

#[cfg(test)]
mod tests {
	use {super::*, crate::AddressMode};

	fn geometry() -> CacheGeometry {
		CacheGeometry::new(1024 * 1024, 4096, 16, AddressMode::Raw).unwrap()
	}

	#[test]
	fn accepts_only_configured_sets() {
		let geometry = self::geometry();
		let filter = SetFilter::new([0, 1, 15], &geometry).unwrap();

		for set in 0..geometry.num_sets() {
			assert_eq!(filter.accepts(set), [0, 1, 15].contains(&set), "Set {set}");
		}
	}

	#[test]
	fn rejects_out_of_range() {
		let err = SetFilter::new([3, 16, 40], &self::geometry()).unwrap_err();
		match err {
			Error::Configuration(msg) => assert!(msg.contains("[16, 40]"), "Unexpected message: {msg}"),
			err => panic!("Unexpected error: {err:?}"),
		}
	}

	#[test]
	fn paper_sets_are_clamped() {
		let filter = SetFilter::paper_sets(&self::geometry());
		assert_eq!(filter.sets(), &(0..16).collect::<HashSet<_>>());

		let geometry = CacheGeometry::new(64 * 4096 * 16, 4096, 16, AddressMode::Raw).unwrap();
		let filter = SetFilter::paper_sets(&geometry);
		assert_eq!(filter.sets(), &(0..32).collect::<HashSet<_>>());
	}
}
