//! Cache access trace filtering and splitting (`tracesplit`)
//!
//! Keeps the accesses of a trace that map to a subset of cache sets, shuffles
//! them by chunks and splits them into training, validation and test sets.

// Modules
pub mod access;
pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod partitioner;
pub mod pipeline;
pub mod shuffle;
pub mod split;

// Exports
pub use self::{
	access::Access,
	config::Config,
	error::Error,
	filter::SetFilter,
	geometry::{AddressMode, CacheGeometry},
	partitioner::{CommandPartitioner, FilePartitioner, NativePartitioner},
	pipeline::{Pipeline, Report, Stage},
	shuffle::ChunkedShuffleBuffer,
	split::SplitPlan,
};
