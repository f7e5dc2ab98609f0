//! Logger
//!
//! Logs to `stderr`, filtered by `RUST_LOG` (`info` by default), and optionally
//! to a file, filtered by `RUST_LOG_FILE` (`debug` by default).

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{prelude::*, EnvFilter},
};

/// Logging before the logger is initialized.
///
/// Messages are buffered and replayed once [`init`](super::init) is called.
pub mod pre_init {
	// Imports
	use {std::sync::Mutex, tracing::Level};

	/// Buffered messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(vec![]);

	/// Buffers a message with level `level`
	fn push(level: Level, msg: impl Into<String>) {
		// Note: A poisoned lock only means another thread panicked while pushing, the buffer is still usable.
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push((level, msg.into()));
	}

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::DEBUG, msg);
	}

	/// Takes all buffered messages
	pub(super) fn take() -> Vec<(Level, String)> {
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		std::mem::take(&mut *messages)
	}
}

/// Initializes the logger.
///
/// # Panics
/// Panics if a global subscriber was already set.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	// Create the terminal layer
	let term_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let term_layer = tracing_subscriber::fmt::layer()
		.with_writer(io::stderr)
		.with_filter(term_filter);

	// Then the file layer, if any
	let mut file_err = None;
	let file_layer = log_file.and_then(|path| match self::open_log_file(path, log_file_append) {
		Ok(file) => {
			let file_filter = EnvFilter::try_from_env("RUST_LOG_FILE").unwrap_or_else(|_| EnvFilter::new("debug"));
			let layer = tracing_subscriber::fmt::layer()
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.with_filter(file_filter);
			Some(layer)
		},
		Err(err) => {
			file_err = Some((path.to_path_buf(), err));
			None
		},
	});

	tracing_subscriber::registry().with(term_layer).with(file_layer).init();

	if let Some((path, err)) = file_err {
		tracing::warn!(?path, ?err, "Unable to open log file, logging to stderr only");
	}

	// Finally replay everything logged before now
	for (level, msg) in pre_init::take() {
		match level {
			tracing::Level::ERROR => tracing::error!("{msg}"),
			tracing::Level::WARN => tracing::warn!("{msg}"),
			tracing::Level::INFO => tracing::info!("{msg}"),
			tracing::Level::DEBUG => tracing::debug!("{msg}"),
			_ => tracing::trace!("{msg}"),
		}
	}
}

/// Opens the log file
fn open_log_file(path: &Path, append: bool) -> Result<fs::File, io::Error> {
	let mut options = fs::File::options();
	options.create(true);
	match append {
		true => options.append(true),
		false => options.write(true).truncate(true),
	};

	options.open(path)
}
