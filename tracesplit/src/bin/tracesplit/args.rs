//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
#[clap(about = "Filters an access trace by cache set and splits it into train (80%) / valid (10%) / test (10%)")]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Access trace, with a hex `pc,address` pair per line
	pub access_trace: PathBuf,

	/// Config file
	///
	/// Any options given on the command line override it.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Cache sets to keep.
	///
	/// Defaults to the sets used in the paper that exist in the cache.
	#[clap(short = 's', long = "cache-sets", value_delimiter = ',')]
	pub cache_sets: Option<Vec<u64>>,

	/// Associativity of the cache
	#[clap(short = 'a', long = "associativity")]
	pub associativity: Option<u64>,

	/// Capacity of the cache, in bytes
	#[clap(short = 'c', long = "capacity")]
	pub capacity: Option<u64>,

	/// Size of the cache lines, in bytes
	#[clap(short = 'l', long = "cache-line-size")]
	pub cache_line_size: Option<u64>,

	/// Batch size
	///
	/// Ensures the training, validation and test sets contain a multiple of
	/// this many accesses. Use 1 to avoid this.
	#[clap(short = 'b', long = "batch-size")]
	pub batch_size: Option<u64>,

	/// Accesses per shuffled chunk
	#[clap(long = "chunk-size")]
	pub chunk_size: Option<usize>,

	/// Shift out the line offset from addresses before taking the set index
	#[clap(long = "line-aligned")]
	pub line_aligned: bool,

	/// Output directory
	#[clap(short = 'o', long = "output-dir")]
	pub output_dir: Option<PathBuf>,

	/// Seed for shuffling.
	///
	/// If not given, a random seed is used (and logged).
	#[clap(long = "seed")]
	pub seed: Option<u64>,

	/// Use the `split`, `cat`, `mv` and `rm` utilities instead of splitting in-process
	#[clap(long = "external-tools")]
	pub external_tools: bool,

	/// Report file
	///
	/// Writes a summary of the run as json.
	#[clap(long = "report")]
	pub report_file: Option<PathBuf>,
}
