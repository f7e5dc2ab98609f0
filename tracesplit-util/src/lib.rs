//! Utilities

// Modules
pub mod logger;

// Imports
use std::{cell::RefCell, fmt, io};

/// Extension trait for `R: io::BufRead` types to read lines without their terminator
#[extend::ext(name = ReadTrimmedLine)]
pub impl<R: io::BufRead> R {
	/// Reads the next line's bytes into `line`, clearing it first.
	///
	/// The trailing `\n` (or `\r\n`) is removed. Returns the number of bytes
	/// consumed from the reader, including the terminator, so `Ok(0)` means end of input.
	fn read_trimmed_line(&mut self, line: &mut Vec<u8>) -> Result<usize, io::Error> {
		line.clear();
		let len = self.read_until(b'\n', line)?;

		// Pop the newline
		if line.ends_with(b"\n") {
			line.pop();
			if line.ends_with(b"\r") {
				line.pop();
			}
		}

		Ok(len)
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}


impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

#[cfg(test)]
mod tests {
	use {super::*, std::io::Cursor};

	#[test]
	fn read_trimmed_line_strips_terminators() {
		let mut reader = Cursor::new(b"0x1,0x2\r\n0x3,\xff\n0x5,0x6");
		let mut line = vec![];

		assert_eq!(reader.read_trimmed_line(&mut line).unwrap(), 9);
		assert_eq!(line, b"0x1,0x2");
		assert_eq!(reader.read_trimmed_line(&mut line).unwrap(), 6);
		assert_eq!(line, b"0x3,\xff");
		assert_eq!(reader.read_trimmed_line(&mut line).unwrap(), 7);
		assert_eq!(line, b"0x5,0x6");
		assert_eq!(reader.read_trimmed_line(&mut line).unwrap(), 0);
		assert!(line.is_empty());
	}

	#[test]
	fn display_wrapper_formats() {
		let count = 3;
		let wrapper = DisplayWrapper::new(|f| write!(f, "{count} records"));
		assert_eq!(wrapper.to_string(), "3 records");
	}
}
