//! File partitioning
//!
//! The final on-disk split goes through [`FilePartitioner`], which can either be
//! done in-process ([`NativePartitioner`]) or by the usual command line utilities
//! ([`CommandPartitioner`]).

// Imports
use {
	crate::{error::IoResultExt, Error},
	itertools::Itertools,
	std::{
		ffi::OsString,
		fs,
		io::{self, BufRead, BufReader, BufWriter, Write},
		path::{Path, PathBuf},
		process::{Command, Stdio},
	},
};

/// File partitioner
pub trait FilePartitioner {
	/// Splits `input` into parts of `lines_per_part` lines each, the last possibly shorter.
	///
	/// Parts are named `{prefix}{idx}`, with `idx` zero-padded to at least 2 digits,
	/// and are returned in order. An empty input produces no parts.
	fn split_by_count(&self, input: &Path, lines_per_part: u64, prefix: &Path) -> Result<Vec<PathBuf>, Error>;

	/// Concatenates all `inputs` into `output`, overwriting it
	fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<(), Error>;

	/// Renames `from` to `to`, overwriting it
	fn rename(&self, from: &Path, to: &Path) -> Result<(), Error>;

	/// Removes all of `paths`
	fn remove(&self, paths: &[PathBuf]) -> Result<(), Error>;
}

impl<P: FilePartitioner + ?Sized> FilePartitioner for Box<P> {
	fn split_by_count(&self, input: &Path, lines_per_part: u64, prefix: &Path) -> Result<Vec<PathBuf>, Error> {
		(**self).split_by_count(input, lines_per_part, prefix)
	}

	fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<(), Error> {
		(**self).concatenate(inputs, output)
	}

	fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
		(**self).rename(from, to)
	}

	fn remove(&self, paths: &[PathBuf]) -> Result<(), Error> {
		(**self).remove(paths)
	}
}

/// Returns the path of part `idx` with prefix `prefix`
pub fn part_path(prefix: &Path, idx: usize) -> PathBuf {
	let mut path = OsString::from(prefix.as_os_str());
	path.push(format!("{idx:02}"));
	PathBuf::from(path)
}

/// Ensures `lines_per_part` is non-zero
fn ensure_lines_per_part(lines_per_part: u64) -> Result<(), Error> {
	match lines_per_part {
		0 => Err(Error::config("Cannot split into parts of 0 lines")),
		_ => Ok(()),
	}
}

/// Finds all existing parts with prefix `prefix`, in order
fn find_parts(prefix: &Path) -> Result<Vec<PathBuf>, Error> {
	let prefix_name = prefix
		.file_name()
		.and_then(|name| name.to_str())
		.ok_or_else(|| Error::config(format!("Split prefix {prefix:?} must end in a valid file name")))?;
	let dir = match prefix.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut parts = vec![];
	for entry in fs::read_dir(dir).io_context(|| format!("Unable to read directory {dir:?}"))? {
		let entry = entry.io_context(|| format!("Unable to read entry of {dir:?}"))?;
		let file_name = entry.file_name();
		let Some(suffix) = file_name.to_str().and_then(|name| name.strip_prefix(prefix_name)) else {
			continue;
		};
		if suffix.is_empty() || !suffix.bytes().all(|ch| ch.is_ascii_digit()) {
			continue;
		}

		match suffix.parse::<u64>() {
			Ok(idx) => parts.push((idx, prefix.with_file_name(&file_name))),
			Err(err) => tracing::warn!(?file_name, ?err, "Ignoring file with unparseable part suffix"),
		}
	}
	parts.sort_by_key(|&(idx, _)| idx);

	Ok(parts.into_iter().map(|(_, path)| path).collect())
}

/// Removes any parts with prefix `prefix` left over from a previous split
fn remove_stale_parts(partitioner: &impl FilePartitioner, prefix: &Path) -> Result<(), Error> {
	let stale_parts = self::find_parts(prefix)?;
	if !stale_parts.is_empty() {
		tracing::warn!(?stale_parts, "Removing parts left over from a previous split");
		partitioner.remove(&stale_parts)?;
	}

	Ok(())
}

/// In-process partitioner
#[derive(Clone, Copy, Default, Debug)]
pub struct NativePartitioner;

impl FilePartitioner for NativePartitioner {
	fn split_by_count(&self, input: &Path, lines_per_part: u64, prefix: &Path) -> Result<Vec<PathBuf>, Error> {
		self::ensure_lines_per_part(lines_per_part)?;
		self::remove_stale_parts(self, prefix)?;

		let input_file = fs::File::open(input).io_context(|| format!("Unable to open {input:?}"))?;
		let mut input_file = BufReader::new(input_file);

		let mut parts = Vec::<PathBuf>::new();
		let mut writer = None;
		let mut lines_read = 0;
		let mut line = vec![];
		loop {
			line.clear();
			let len = input_file
				.read_until(b'\n', &mut line)
				.io_context(|| format!("Unable to read {input:?}"))?;
			if len == 0 {
				break;
			}

			// Start a new part every `lines_per_part` lines
			let cur_writer = match lines_read % lines_per_part {
				0 => {
					if let Some(writer) = writer.take() {
						self::finish_part(writer, parts.last().expect("Part was created"))?;
					}

					let path = self::part_path(prefix, parts.len());
					let file = fs::File::create(&path).io_context(|| format!("Unable to create {path:?}"))?;
					tracing::trace!(?path, "Created part");
					parts.push(path);
					writer.insert(BufWriter::new(file))
				},
				_ => writer.as_mut().expect("Part is created on its first line"),
			};

			cur_writer
				.write_all(&line)
				.io_context(|| format!("Unable to write to {:?}", parts.last()))?;
			lines_read += 1;
		}

		if let Some(writer) = writer {
			self::finish_part(writer, parts.last().expect("Part was created"))?;
		}

		Ok(parts)
	}

	fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<(), Error> {
		let output_file = fs::File::create(output).io_context(|| format!("Unable to create {output:?}"))?;
		let mut output_file = BufWriter::new(output_file);

		for input in inputs {
			let input_file = fs::File::open(input).io_context(|| format!("Unable to open {input:?}"))?;
			io::copy(&mut BufReader::new(input_file), &mut output_file)
				.io_context(|| format!("Unable to copy {input:?} to {output:?}"))?;
		}

		output_file
			.flush()
			.io_context(|| format!("Unable to flush {output:?}"))
	}

	fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
		fs::rename(from, to).io_context(|| format!("Unable to rename {from:?} to {to:?}"))
	}

	fn remove(&self, paths: &[PathBuf]) -> Result<(), Error> {
		for path in paths {
			fs::remove_file(path).io_context(|| format!("Unable to remove {path:?}"))?;
		}

		Ok(())
	}
}

/// Flushes a finished part
fn finish_part(mut writer: BufWriter<fs::File>, path: &Path) -> Result<(), Error> {
	writer.flush().io_context(|| format!("Unable to flush {path:?}"))
}

/// Partitioner using `split`, `cat`, `mv` and `rm`
#[derive(Clone, Debug)]
pub struct CommandPartitioner {
	/// `split` program
	split: OsString,

	/// `cat` program
	cat: OsString,

	/// `mv` program
	mv: OsString,

	/// `rm` program
	rm: OsString,
}

impl CommandPartitioner {
	/// Creates a partitioner using the programs found in `PATH`
	pub fn new() -> Self {
		Self {
			split: "split".into(),
			cat:   "cat".into(),
			mv:    "mv".into(),
			rm:    "rm".into(),
		}
	}

	/// Sets the `split` program
	#[must_use]
	pub fn with_split(mut self, split: impl Into<OsString>) -> Self {
		self.split = split.into();
		self
	}

	/// Runs `cmd`, failing if it exits unsuccessfully
	fn run(cmd: &mut Command) -> Result<(), Error> {
		let command = std::iter::once(cmd.get_program())
			.chain(cmd.get_args())
			.map(|arg| arg.to_string_lossy())
			.join(" ");
		tracing::info!("{command}");

		let output = cmd
			.stdin(Stdio::null())
			.stderr(Stdio::piped())
			.output()
			.io_context(|| format!("Unable to run `{command}`"))?;

		if !output.status.success() {
			return Err(Error::ExternalTool {
				command,
				status: output.status,
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
			});
		}

		Ok(())
	}
}

impl Default for CommandPartitioner {
	fn default() -> Self {
		Self::new()
	}
}

impl FilePartitioner for CommandPartitioner {
	fn split_by_count(&self, input: &Path, lines_per_part: u64, prefix: &Path) -> Result<Vec<PathBuf>, Error> {
		self::ensure_lines_per_part(lines_per_part)?;
		self::remove_stale_parts(self, prefix)?;

		Self::run(
			Command::new(&self.split)
				.arg("-l")
				.arg(lines_per_part.to_string())
				.arg("-d")
				.arg(input)
				.arg(prefix),
		)?;

		// Then find all the parts `split` created
		self::find_parts(prefix)
	}

	fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<(), Error> {
		let output_file = fs::File::create(output).io_context(|| format!("Unable to create {output:?}"))?;
		Self::run(Command::new(&self.cat).args(inputs).stdout(output_file))
	}

	fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
		Self::run(Command::new(&self.mv).arg("-f").arg(from).arg(to))
	}

	fn remove(&self, paths: &[PathBuf]) -> Result<(), Error> {
		if paths.is_empty() {
			return Ok(());
		}

		Self::run(Command::new(&self.rm).arg("-f").arg("--").args(paths))
	}
}
