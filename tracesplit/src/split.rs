//! Split planning

// Imports
use {crate::Error, std::ops::Range};

/// Split plan.
///
/// The records are cut into [`SplitPlan::SEGMENTS`] segments of equal, batch-aligned,
/// length. The first 8 form the training set, the 9th the validation set and the 10th
/// the test set. Whatever is left after the 10th segment is dropped.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SplitPlan {
	/// Total records
	total: u64,

	/// Batch size
	batch_size: u64,

	/// Length of each segment
	split_len: u64,
}

impl SplitPlan {
	/// Number of equal segments
	pub const SEGMENTS: usize = 10;

	/// Segments used for training
	pub const TRAIN_SEGMENTS: Range<usize> = 0..8;

	/// Segment used for validation
	pub const VALID_SEGMENT: usize = 8;

	/// Segment used for testing
	pub const TEST_SEGMENT: usize = 9;

	/// Plans the split of `total` records, aligned to `batch_size`.
	///
	/// # Errors
	/// Returns an error if `batch_size` is 0.
	pub fn new(total: u64, batch_size: u64) -> Result<Self, Error> {
		if batch_size == 0 {
			return Err(Error::config("Batch size must be at least 1"));
		}

		let split_len = total / Self::SEGMENTS as u64 / batch_size * batch_size;
		Ok(Self {
			total,
			batch_size,
			split_len,
		})
	}

	/// Returns the total number of records
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Returns the batch size
	pub fn batch_size(&self) -> u64 {
		self.batch_size
	}

	/// Returns the length of each segment
	pub fn split_len(&self) -> u64 {
		self.split_len
	}

	/// Returns if all partitions are empty
	pub fn is_degenerate(&self) -> bool {
		self.split_len == 0
	}

	/// Returns the length of every segment, in order.
	///
	/// This is [`Self::SEGMENTS`] segments of [`Self::split_len`], followed by
	/// the dropped remainder, if any. The lengths always sum to [`Self::total`].
	pub fn segments(&self) -> Vec<u64> {
		let mut segments = vec![self.split_len; Self::SEGMENTS];
		if self.dropped_len() != 0 {
			segments.push(self.dropped_len());
		}

		segments
	}

	/// Returns the number of parts produced by splitting the records every [`Self::split_len`] records.
	///
	/// This is [`Self::SEGMENTS`], plus however many parts the dropped remainder spans.
	/// Returns 0 for degenerate plans, which can't be split.
	pub fn part_count(&self) -> u64 {
		match self.split_len {
			0 => 0,
			split_len => self.total.div_ceil(split_len),
		}
	}

	/// Returns the number of training records
	pub fn train_len(&self) -> u64 {
		Self::TRAIN_SEGMENTS.len() as u64 * self.split_len
	}

	/// Returns the number of validation records
	pub fn valid_len(&self) -> u64 {
		self.split_len
	}

	/// Returns the number of test records
	pub fn test_len(&self) -> u64 {
		self.split_len
	}

	/// Returns the number of records dropped after the test set
	pub fn dropped_len(&self) -> u64 {
		self.total - Self::SEGMENTS as u64 * self.split_len
	}

	/// Returns the record ranges of the training, validation and test sets
	pub fn ranges(&self) -> [Range<u64>; 3] {
		let segment = |idx: usize| idx as u64 * self.split_len;
		[
			segment(Self::TRAIN_SEGMENTS.start)..segment(Self::TRAIN_SEGMENTS.end),
			segment(Self::VALID_SEGMENT)..segment(Self::VALID_SEGMENT + 1),
			segment(Self::TEST_SEGMENT)..segment(Self::TEST_SEGMENT + 1),
		]
	}
}
