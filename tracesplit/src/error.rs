//! Errors

// Imports
use std::{io, process::ExitStatus};

/// Error
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Invalid configuration
	#[error("Invalid configuration: {0}")]
	Configuration(String),

	/// Malformed trace record
	#[error("Unable to parse line {line} ({content:?}): {reason}")]
	Parse {
		line:    u64,
		content: String,
		reason:  String,
	},

	/// External command exited unsuccessfully
	#[error("Command `{command}` failed with {status}: {stderr}")]
	ExternalTool {
		command: String,
		status:  ExitStatus,
		stderr:  String,
	},

	/// I/O failure
	#[error("{context}")]
	Io {
		context: String,
		#[source]
		source:  io::Error,
	},
}

impl Error {
	/// Creates a configuration error
	pub fn config(msg: impl Into<String>) -> Self {
		Self::Configuration(msg.into())
	}
}

/// Extension trait to attach context to [`io::Error`]s
#[extend::ext(name = IoResultExt)]
pub impl<T> Result<T, io::Error> {
	/// Converts the error into [`Error::Io`] with a lazily built context
	fn io_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T, Error> {
		self.map_err(|source| Error::Io {
			context: f().into(),
			source,
		})
	}
}
