//! Trace accesses

// Imports
use std::{fmt, num::ParseIntError, str::FromStr};

/// Memory access, as recorded by the cache simulator
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct Access {
	/// Program counter of the instruction that performed the access
	pub pc: u64,

	/// Address accessed
	pub addr: u64,
}

impl Access {
	/// Creates a new access
	#[must_use]
	pub const fn new(pc: u64, addr: u64) -> Self {
		Self { pc, addr }
	}
}

/// Formats as `0x{pc:x},0x{addr:x}`
impl fmt::Display for Access {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x},{:#x}", self.pc, self.addr)
	}
}

impl FromStr for Access {
	type Err = ParseAccessError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (pc, addr) = s.split_once(',').ok_or(ParseAccessError::MissingComma)?;
		if addr.contains(',') {
			return Err(ParseAccessError::TooManyFields);
		}

		let pc = self::parse_hex(pc).map_err(ParseAccessError::Pc)?;
		let addr = self::parse_hex(addr).map_err(ParseAccessError::Addr)?;

		Ok(Self { pc, addr })
	}
}

/// Parses a hex field, with an optional `0x` prefix
fn parse_hex(field: &str) -> Result<u64, ParseIntError> {
	let field = field.trim();
	let digits = field
		.strip_prefix("0x")
		.or_else(|| field.strip_prefix("0X"))
		.unwrap_or(field);

	u64::from_str_radix(digits, 16)
}

/// Error for [`Access`]'s [`FromStr`] impl
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum ParseAccessError {
	/// Line had no comma separating the fields
	#[error("Expected `pc,address`, found no comma")]
	MissingComma,

	/// Line had more than 2 fields
	#[error("Expected `pc,address`, found more than 2 fields")]
	TooManyFields,

	/// Program counter wasn't valid hex
	#[error("Invalid program counter: {0}")]
	Pc(ParseIntError),

	/// Address wasn't valid hex
	#[error("Invalid address: {0}")]
	Addr(ParseIntError),
}
