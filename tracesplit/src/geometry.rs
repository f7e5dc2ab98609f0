//! Cache geometry and set index decoding

// Imports
use crate::Error;

/// Cache geometry
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct CacheGeometry {
	/// Capacity, in bytes
	capacity: u64,

	/// Cache line size, in bytes
	line_size: u64,

	/// Associativity (lines per set)
	associativity: u64,

	/// Number of sets.
	///
	/// Always a power of two.
	num_sets: u64,

	/// Address mode
	address_mode: AddressMode,
}

impl CacheGeometry {
	/// Creates a new geometry.
	///
	/// # Errors
	/// Returns an error if any field is zero, if `capacity` isn't a multiple of
	/// `line_size * associativity`, or if the resulting number of sets isn't a power of two.
	/// With [`AddressMode::LineAligned`], `line_size` must also be a power of two.
	pub fn new(capacity: u64, line_size: u64, associativity: u64, address_mode: AddressMode) -> Result<Self, Error> {
		if capacity == 0 || line_size == 0 || associativity == 0 {
			return Err(Error::config(format!(
				"Cache geometry fields must be non-zero (capacity: {capacity}, line size: {line_size}, associativity: \
				 {associativity})"
			)));
		}

		let set_size = line_size
			.checked_mul(associativity)
			.ok_or_else(|| Error::config("Cache set size overflows"))?;
		if capacity % set_size != 0 {
			return Err(Error::config(format!(
				"Capacity {capacity} isn't a multiple of the set size {set_size} (line size {line_size} * associativity \
				 {associativity})"
			)));
		}

		let num_sets = capacity / set_size;
		if !num_sets.is_power_of_two() {
			return Err(Error::config(format!("Number of sets {num_sets} isn't a power of two")));
		}

		if address_mode == AddressMode::LineAligned && !line_size.is_power_of_two() {
			return Err(Error::config(format!(
				"Line size {line_size} must be a power of two to use line-aligned addresses"
			)));
		}

		Ok(Self {
			capacity,
			line_size,
			associativity,
			num_sets,
			address_mode,
		})
	}

	/// Returns the capacity, in bytes
	pub fn capacity(&self) -> u64 {
		self.capacity
	}

	/// Returns the cache line size, in bytes
	pub fn line_size(&self) -> u64 {
		self.line_size
	}

	/// Returns the associativity
	pub fn associativity(&self) -> u64 {
		self.associativity
	}

	/// Returns the number of sets
	pub fn num_sets(&self) -> u64 {
		self.num_sets
	}

	/// Returns the number of bits used for the set index
	pub fn set_bits(&self) -> u32 {
		self.num_sets.trailing_zeros()
	}

	/// Returns the number of bits used for the offset within a line
	pub fn line_bits(&self) -> u32 {
		self.line_size.trailing_zeros()
	}

	/// Returns the address mode
	pub fn address_mode(&self) -> AddressMode {
		self.address_mode
	}

	/// Decodes the set index of `addr`
	pub fn set_index(&self, addr: u64) -> u64 {
		let addr = match self.address_mode {
			AddressMode::Raw => addr,
			AddressMode::LineAligned => addr >> self.line_bits(),
		};

		addr & (self.num_sets - 1)
	}
}

/// How addresses are decoded into set indices
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressMode {
	/// The low bits of the address are the set index.
	///
	/// Traces produced by the cache simulator already store line numbers in the address field.
	#[default]
	Raw,

	/// The address is a byte address, and the line offset is shifted out first
	LineAligned,
}
