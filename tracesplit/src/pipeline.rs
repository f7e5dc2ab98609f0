//! Filter and split pipeline

// Imports
use {
	crate::{
		error::IoResultExt,
		partitioner::{self, FilePartitioner},
		Access,
		CacheGeometry,
		ChunkedShuffleBuffer,
		Config,
		Error,
		SetFilter,
		SplitPlan,
	},
	rand::Rng,
	std::{
		fmt,
		fs,
		io::{self, BufRead, BufReader, BufWriter, Write},
		path::{Path, PathBuf},
		time::{Duration, Instant},
	},
	tracesplit_util::{DisplayWrapper, ReadTrimmedLine},
};

/// Training set file name
pub const TRAIN_FILE: &str = "train.csv";

/// Validation set file name
pub const VALID_FILE: &str = "valid.csv";

/// Test set file name
pub const TEST_FILE: &str = "test.csv";

/// Shuffled, combined, file name
pub const ALL_FILE: &str = "all.csv";

/// Prefix for the split parts
pub const PART_PREFIX: &str = "_filter_traces";

/// Suffix for outputs before they're complete
const PARTIAL_SUFFIX: &str = ".partial";

/// Pipeline stage
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Stage {
	/// Not yet started
	Idle,

	/// Reading and filtering the trace
	Reading,

	/// Writing the shuffled trace
	Shuffling,

	/// Splitting the shuffled trace
	Splitting,

	/// Finished
	Done,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Idle => "idle",
			Self::Reading => "reading",
			Self::Shuffling => "shuffling",
			Self::Splitting => "splitting",
			Self::Done => "done",
		};

		f.pad(name)
	}
}

/// Pipeline
#[derive(Debug)]
pub struct Pipeline<P, R> {
	/// Config
	config: Config,

	/// Cache geometry
	geometry: CacheGeometry,

	/// Set filter
	filter: SetFilter,

	/// Progress output period
	progress_period: Duration,

	/// Partitioner
	partitioner: P,

	/// Random source for shuffling
	rng: R,

	/// Current stage
	stage: Stage,
}

impl<P: FilePartitioner, R: Rng> Pipeline<P, R> {
	/// Creates a new pipeline.
	///
	/// # Errors
	/// Returns an error if `config` is invalid.
	pub fn new(config: Config, partitioner: P, rng: R) -> Result<Self, Error> {
		let (geometry, filter) = config.validate()?;
		let progress_period = config.progress_period()?;
		tracing::debug!(?geometry, ?filter, ?progress_period, "Validated configuration");

		Ok(Self {
			config,
			geometry,
			filter,
			progress_period,
			partitioner,
			rng,
			stage: Stage::Idle,
		})
	}

	/// Returns the config
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns the cache geometry
	pub fn geometry(&self) -> &CacheGeometry {
		&self.geometry
	}

	/// Returns the set filter
	pub fn filter(&self) -> &SetFilter {
		&self.filter
	}

	/// Returns the current stage
	pub fn stage(&self) -> Stage {
		self.stage
	}

	/// Returns the path of output `name`
	pub fn output_path(&self, name: &str) -> PathBuf {
		self.config.output_dir.join(name)
	}

	/// Runs the whole pipeline on the trace at `input`.
	///
	/// Writes the shuffled trace to [`ALL_FILE`], and the partitions to
	/// [`TRAIN_FILE`], [`VALID_FILE`] and [`TEST_FILE`], all in the output directory.
	pub fn run(&mut self, input: &Path) -> Result<Report, Error> {
		self.warn_existing_outputs();

		let input_file = fs::File::open(input).io_context(|| format!("Unable to open trace file {input:?}"))?;
		let input_len = input_file
			.metadata()
			.io_context(|| format!("Unable to get metadata of {input:?}"))?
			.len();

		let read = self.read(BufReader::new(input_file), Some(input_len))?;
		let (records_read, accepted) = (read.records_read, read.accepted);

		let all_path = self.output_path(ALL_FILE);
		self.shuffle(read.buffer, &all_path)?;

		let plan = SplitPlan::new(accepted, self.config.batch_size)?;
		self.split(&plan, &all_path)?;

		self.enter(Stage::Done);
		let report = Report {
			records_read,
			accepted,
			batch_size: plan.batch_size(),
			split_len: plan.split_len(),
			train: plan.train_len(),
			valid: plan.valid_len(),
			test: plan.test_len(),
			dropped: plan.dropped_len(),
		};
		tracing::info!(?report, "Finished");

		Ok(report)
	}

	/// Reads all records from `reader`, keeping those in an accepted set.
	///
	/// `total_bytes`, if known, is only used to report progress.
	pub fn read<Rd: BufRead>(&mut self, mut reader: Rd, total_bytes: Option<u64>) -> Result<ReadOutput, Error> {
		self.enter(Stage::Reading);

		let mut buffer = ChunkedShuffleBuffer::new(self.config.chunk_size);
		let mut records_read = 0;
		let mut bytes_read = 0;
		let mut line_idx = 0;

		let mut last_progress_time = Instant::now();

		let mut line = vec![];
		loop {
			let len = reader
				.read_trimmed_line(&mut line)
				.io_context(|| format!("Unable to read line {}", line_idx + 1))?;
			if len == 0 {
				break;
			}
			line_idx += 1;
			bytes_read += len as u64;

			let parse_err = |reason: String| Error::Parse {
				line:    line_idx,
				content: String::from_utf8_lossy(&line).into_owned(),
				reason,
			};
			let line_str = std::str::from_utf8(&line).map_err(|err| parse_err(err.to_string()))?;

			// Skip any empty lines
			if line_str.trim().is_empty() {
				continue;
			}

			let access = line_str
				.parse::<Access>()
				.map_err(|err| parse_err(err.to_string()))?;
			records_read += 1;

			let set_index = self.geometry.set_index(access.addr);
			if self.filter.accepts(set_index) {
				buffer.push(access);
			}

			let cur_time = Instant::now();
			if cur_time.duration_since(last_progress_time) >= self.progress_period {
				tracing::info!(
					"[{}] Read {records_read} records, accepted {}",
					DisplayWrapper::new(|f| match total_bytes {
						Some(total_bytes) if total_bytes != 0 =>
							write!(f, "{:.2}%", 100.0 * (bytes_read as f64 / total_bytes as f64)),
						_ => write!(f, "{bytes_read}B"),
					}),
					buffer.len()
				);
				last_progress_time = cur_time;
			}
		}

		let accepted = buffer.len() as u64;
		tracing::info!(
			records_read,
			accepted,
			chunks = buffer.chunk_count(),
			"Read trace"
		);

		Ok(ReadOutput {
			records_read,
			accepted,
			buffer,
		})
	}

	/// Writes all records in `buffer` to `output`, shuffled by chunk.
	///
	/// Returns the number of records written.
	pub fn shuffle(&mut self, buffer: ChunkedShuffleBuffer<Access>, output: &Path) -> Result<u64, Error> {
		self.enter(Stage::Shuffling);

		let output_file = fs::File::create(output).io_context(|| format!("Unable to create {output:?}"))?;
		let mut output_file = BufWriter::new(output_file);

		let mut records_written = 0;
		for access in buffer.drain_randomized(&mut self.rng) {
			writeln!(output_file, "{access}").io_context(|| format!("Unable to write to {output:?}"))?;
			records_written += 1;
		}
		output_file
			.flush()
			.io_context(|| format!("Unable to flush {output:?}"))?;

		tracing::info!(records_written, ?output, "Wrote shuffled trace");
		Ok(records_written)
	}

	/// Splits the shuffled trace at `all_path` into the training, validation and test sets, according to `plan`.
	///
	/// The outputs are only moved to their final names once all of them were produced.
	pub fn split(&mut self, plan: &SplitPlan, all_path: &Path) -> Result<(), Error> {
		self.enter(Stage::Splitting);
		tracing::info!(
			split_len = plan.split_len(),
			segments = ?plan.segments(),
			ranges = ?plan.ranges(),
			"Splitting trace"
		);

		let outputs = [TRAIN_FILE, VALID_FILE, TEST_FILE].map(|name| {
			let path = self.output_path(name);
			let partial_path = self.output_path(&format!("{name}{PARTIAL_SUFFIX}"));
			(path, partial_path)
		});
		let [(_, train_partial), (_, valid_partial), (_, test_partial)] = &outputs;

		match plan.is_degenerate() {
			true => {
				tracing::warn!(
					accepted = plan.total(),
					batch_size = plan.batch_size(),
					"Not enough records to fill a single batch per partition, all partitions will be empty"
				);
				for (_, partial_path) in &outputs {
					fs::File::create(partial_path).io_context(|| format!("Unable to create {partial_path:?}"))?;
				}
			},
			false => {
				let prefix = self.output_path(PART_PREFIX);
				let parts = self
					.partitioner
					.split_by_count(all_path, plan.split_len(), &prefix)?;

				// Note: The remainder may span several parts, but there's always at least one per segment
				let expected_parts = plan.part_count();
				if parts.len() as u64 != expected_parts {
					return Err(Error::Io {
						context: format!("Split {all_path:?} into {} parts, expected {expected_parts}", parts.len()),
						source:  io::Error::new(io::ErrorKind::InvalidData, "unexpected number of parts"),
					});
				}

				// Remove everything past the test set
				let (segments, dropped) = parts.split_at(SplitPlan::SEGMENTS);
				if !dropped.is_empty() {
					tracing::info!(records = plan.dropped_len(), parts = dropped.len(), "Dropping remainder");
					self.partitioner.remove(dropped)?;
				}

				// Then assemble the test, validation and training sets
				self.partitioner
					.rename(&segments[SplitPlan::TEST_SEGMENT], test_partial)?;
				self.partitioner
					.rename(&segments[SplitPlan::VALID_SEGMENT], valid_partial)?;

				let train_segments = &segments[SplitPlan::TRAIN_SEGMENTS];
				self.partitioner.concatenate(train_segments, train_partial)?;
				self.partitioner.remove(train_segments)?;
			},
		}

		// Finally move everything into place
		for (path, partial_path) in &outputs {
			self.partitioner.rename(partial_path, path)?;
		}

		Ok(())
	}

	/// Warns about all outputs that already exist
	fn warn_existing_outputs(&self) {
		let part_prefix = self.output_path(PART_PREFIX);
		let outputs = [TRAIN_FILE, VALID_FILE, TEST_FILE, ALL_FILE]
			.into_iter()
			.map(|name| self.output_path(name))
			.chain((0..=SplitPlan::SEGMENTS).map(|idx| partitioner::part_path(&part_prefix, idx)));

		for output in outputs {
			if output.exists() {
				tracing::warn!("File {output:?} already exists, overwriting");
			}
		}
	}

	/// Enters stage `stage`
	fn enter(&mut self, stage: Stage) {
		tracing::info!(prev = %self.stage, "Entering stage {stage}");
		self.stage = stage;
	}
}

/// Output of [`Pipeline::read`]
#[derive(Debug)]
pub struct ReadOutput {
	/// Records read
	pub records_read: u64,

	/// Records accepted
	pub accepted: u64,

	/// Buffer with all accepted records
	pub buffer: ChunkedShuffleBuffer<Access>,
}

/// Report of a [`Pipeline::run`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Report {
	/// Records read
	pub records_read: u64,

	/// Records accepted
	pub accepted: u64,

	/// Batch size
	pub batch_size: u64,

	/// Records per segment
	pub split_len: u64,

	/// Training records
	pub train: u64,

	/// Validation records
	pub valid: u64,

	/// Test records
	pub test: u64,

	/// Dropped records
	pub dropped: u64,
}
