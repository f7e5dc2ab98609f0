//! Configuration

// Imports
use {
	crate::{filter::SetFilter, geometry::AddressMode, shuffle, CacheGeometry, Error},
	std::{path::PathBuf, time::Duration},
};

/// Configuration.
///
/// Every field may be omitted when deserializing, and takes its default value.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Cache sets to keep.
	///
	/// If `None`, uses the sets from the paper that exist in the cache.
	pub cache_sets: Option<Vec<u64>>,

	/// Associativity
	pub associativity: u64,

	/// Capacity, in bytes
	pub capacity: u64,

	/// Cache line size, in bytes
	pub cache_line_size: u64,

	/// Address mode
	pub address_mode: AddressMode,

	/// Batch size.
	///
	/// Training, validation and test sets have a multiple of this many records.
	/// A value of 1 disables the alignment.
	pub batch_size: u64,

	/// Records per shuffled chunk
	pub chunk_size: usize,

	/// Output directory
	pub output_dir: PathBuf,

	/// Progress output period (in seconds)
	pub progress_period_secs: f64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			cache_sets:           None,
			associativity:        16,
			capacity:             1024 * 1024,
			cache_line_size:      4096,
			address_mode:         AddressMode::Raw,
			batch_size:           32,
			chunk_size:           shuffle::DEFAULT_CHUNK_CAPACITY,
			output_dir:           PathBuf::from("."),
			progress_period_secs: 1.0,
		}
	}
}

impl Config {
	/// Validates this config, returning the cache geometry and set filter
	pub fn validate(&self) -> Result<(CacheGeometry, SetFilter), Error> {
		if self.batch_size == 0 {
			return Err(Error::config("Batch size must be at least 1"));
		}
		if self.chunk_size == 0 {
			return Err(Error::config("Chunk size must be at least 1"));
		}
		self.progress_period()?;

		let geometry = CacheGeometry::new(
			self.capacity,
			self.cache_line_size,
			self.associativity,
			self.address_mode,
		)?;
		let filter = match &self.cache_sets {
			Some(cache_sets) => SetFilter::new(cache_sets.iter().copied(), &geometry)?,
			None => SetFilter::paper_sets(&geometry),
		};

		Ok((geometry, filter))
	}

	/// Returns the progress output period.
	///
	/// # Errors
	/// Returns an error if the period is negative, not a number, or too large.
	pub fn progress_period(&self) -> Result<Duration, Error> {
		Duration::try_from_secs_f64(self.progress_period_secs).map_err(|err| {
			Error::config(format!(
				"Progress period must be a non-negative number of seconds, found {}: {err}",
				self.progress_period_secs
			))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_valid() {
		let (geometry, filter) = Config::default().validate().unwrap();
		assert_eq!(geometry.num_sets(), 16);
		assert_eq!(filter.sets().len(), 16);
		assert_eq!(Config::default().progress_period().unwrap(), Duration::from_secs(1));
	}

	#[test]
	fn deserialize_partial() {
		let config = serde_json::from_str::<Config>(
			r#"{ "cache_sets": [0, 1], "batch_size": 1, "address_mode": "line-aligned" }"#,
		)
		.unwrap();
		assert_eq!(config.cache_sets, Some(vec![0, 1]));
		assert_eq!(config.batch_size, 1);
		assert_eq!(config.address_mode, AddressMode::LineAligned);
		assert_eq!(config.associativity, 16);
		assert_eq!(config.chunk_size, 1000);
	}

	#[test]
	fn invalid() {
		let invalid_configs = [
			Config {
				batch_size: 0,
				..Config::default()
			},
			Config {
				chunk_size: 0,
				..Config::default()
			},
			Config {
				capacity: 1000,
				..Config::default()
			},
			Config {
				cache_sets: Some(vec![16]),
				..Config::default()
			},
			Config {
				progress_period_secs: f64::NAN,
				..Config::default()
			},
			Config {
				progress_period_secs: -1.0,
				..Config::default()
			},
			Config {
				progress_period_secs: 1e30,
				..Config::default()
			},
		];

		for config in invalid_configs {
			assert!(
				matches!(config.validate(), Err(Error::Configuration(_))),
				"Config should be invalid: {config:?}"
			);
		}
	}
}
