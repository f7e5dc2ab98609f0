//! Chunked shuffle buffer

// Imports
use rand::{seq::SliceRandom, Rng};

/// Default chunk capacity
pub const DEFAULT_CHUNK_CAPACITY: usize = 1000;

/// Chunked shuffle buffer.
///
/// Items are appended to fixed-size chunks in arrival order, and drained
/// with the chunks in a random order. The items within each chunk keep their
/// relative order, so only locality across chunks is broken up.
#[derive(Clone, Debug)]
pub struct ChunkedShuffleBuffer<T> {
	/// All chunks, indexed by their key.
	///
	/// Every chunk but the last is full, and the last is never empty.
	chunks: Vec<Vec<T>>,

	/// Maximum items per chunk
	chunk_capacity: usize,

	/// Total number of items
	len: usize,
}

impl<T> ChunkedShuffleBuffer<T> {
	/// Creates an empty buffer with chunks of `chunk_capacity` items.
	///
	/// # Panics
	/// Panics if `chunk_capacity` is 0.
	pub fn new(chunk_capacity: usize) -> Self {
		assert!(chunk_capacity > 0, "Chunk capacity must be non-zero");

		Self {
			chunks: vec![],
			chunk_capacity,
			len: 0,
		}
	}

	/// Appends an item to the last chunk, sealing it and opening a new one if it's full
	pub fn push(&mut self, item: T) {
		match self.chunks.last_mut() {
			Some(chunk) if chunk.len() < self.chunk_capacity => chunk.push(item),
			_ => {
				let mut chunk = Vec::with_capacity(self.chunk_capacity);
				chunk.push(item);
				self.chunks.push(chunk);
			},
		}

		self.len += 1;
	}

	/// Returns the total number of items
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns if there are no items
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the number of chunks, including the partially filled one
	pub fn chunk_count(&self) -> usize {
		self.chunks.len()
	}

	/// Returns the chunk capacity
	pub fn chunk_capacity(&self) -> usize {
		self.chunk_capacity
	}

	/// Drains all items, with chunks in a random order.
	///
	/// Each chunk is selected exactly once, uniformly among the remaining ones, and its
	/// items are yielded in the order they were pushed.
	pub fn drain_randomized<R: Rng + ?Sized>(self, rng: &mut R) -> Drain<T> {
		let mut chunks = self.chunks;
		chunks.shuffle(rng);

		Drain {
			chunks:    chunks.into_iter(),
			cur:       Vec::new().into_iter(),
			remaining: self.len,
		}
	}
}

/// Iterator returned by [`ChunkedShuffleBuffer::drain_randomized`]
#[derive(Debug)]
pub struct Drain<T> {
	/// Chunks not yet started
	chunks: std::vec::IntoIter<Vec<T>>,

	/// Current chunk
	cur: std::vec::IntoIter<T>,

	/// Remaining items
	remaining: usize,
}

impl<T> Iterator for Drain<T> {
	type Item = T;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(item) = self.cur.next() {
				self.remaining -= 1;
				return Some(item);
			}

			// Note: Dropping the finished chunk here releases its memory before the next is started
			self.cur = self.chunks.next()?.into_iter();
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<T> ExactSizeIterator for Drain<T> {}
