use crate::compiler_diagnostic::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::num::IntErrorKind;
use thiserror::Error;

/// Describes error types encountered when parsing strings
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum NumberParseErrorKind {
	#[error("0 and 1 are the only valid binary digits")]
	BadBinaryDigit,

	#[error("0-7 are the only valid octal digits")]
	BadOctalDigit,

	#[error("0-9 are the only valid decimal digits")]
	BadDecimalDigit,

	#[error("0-9, a-f and A-F are the only valid hexadecimal digits")]
	BadHexDigit,

	#[error("Unknown base specifier")]
	BadBase,

	#[error("Missing digits")]
	MissingDigits,

	#[error("Insufficient width")]
	InsufficientWidth,

	#[error("Too many bits")]
	TooManyBits,
}

/// Describes number parsing error (type + location within string)
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub struct NumberParseError {
	pub kind: NumberParseErrorKind,
	pub range: (usize, usize),
}

impl fmt::Display for NumberParseError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.kind)
	}
}

impl NumberParseError {
	fn new(kind: NumberParseErrorKind, s: &str) -> Self {
		Self {
			kind,
			range: (0, s.len()),
		}
	}

	/// Help message describing the problem
	pub fn help(&self) -> &'static str {
		use NumberParseErrorKind::*;
		match self.kind {
			BadBinaryDigit => "1 and 0 are the only valid binary digits",
			BadOctalDigit => "0-7 are the only valid octal digits",
			BadDecimalDigit => "0-9 are the only valid decimal digits",
			BadHexDigit => "0-9, a-f and A-F are the only valid hexadecimal digits",
			BadBase => "Use 'b, 'o, 'd or 'h to specify the base",
			MissingDigits => "Add digits after the base prefix",
			InsufficientWidth => "Width of this constant is insufficient to represent this number",
			TooManyBits => "Numeric constants must fit in 64 bits",
		}
	}
}

impl ProvidesCompilerDiagnostic for NumberParseError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		CompilerDiagnosticBuilder::from_error(&self)
			.label(self.range.into(), "This is not a valid number")
			.help(self.help())
			.build()
	}
}

lazy_static! {
	/// Verilog-style sized constant (`8'hff`, `'d12`)
	static ref VERILOG_NUMBER: Regex = Regex::new(r"^([0-9]*)'([a-z])([0-9a-z]*)$").unwrap();
}

/// Parses digits in the given radix
fn parse_digits(digits: &str, radix: u32, bad_digit: NumberParseErrorKind, s: &str) -> Result<u64, NumberParseError> {
	u64::from_str_radix(digits, radix).map_err(|err| {
		let kind = match err.kind() {
			IntErrorKind::Empty => NumberParseErrorKind::MissingDigits,
			IntErrorKind::PosOverflow => NumberParseErrorKind::TooManyBits,
			_ => bad_digit,
		};
		NumberParseError::new(kind, s)
	})
}

/// Parses a Verilog-style constant: optional width, base letter and digits
fn parse_verilog_number(s: &str, width: &str, base: &str, digits: &str) -> Result<u64, NumberParseError> {
	use NumberParseErrorKind::*;
	let value = match base {
		"b" => parse_digits(digits, 2, BadBinaryDigit, s)?,
		"o" => parse_digits(digits, 8, BadOctalDigit, s)?,
		"d" => parse_digits(digits, 10, BadDecimalDigit, s)?,
		"h" => parse_digits(digits, 16, BadHexDigit, s)?,
		_ => return Err(NumberParseError::new(BadBase, s)),
	};

	if width.is_empty() {
		return Ok(value);
	}

	let width: u32 = width.parse().map_err(|_| NumberParseError::new(TooManyBits, s))?;
	if width == 0 {
		return Err(NumberParseError::new(InsufficientWidth, s));
	}
	if width > 64 {
		return Err(NumberParseError::new(TooManyBits, s));
	}
	if width < 64 && value >> width != 0 {
		return Err(NumberParseError::new(InsufficientWidth, s));
	}
	Ok(value)
}

/// Parses numeric constant strings
pub fn parse_number_str(s: &str) -> Result<u64, NumberParseError> {
	use NumberParseErrorKind::*;

	// Get rid of all '_' and convert to lowercase
	let clean = s.replace('_', "").to_lowercase();

	if let Some(captures) = VERILOG_NUMBER.captures(&clean) {
		return parse_verilog_number(s, &captures[1], &captures[2], &captures[3]);
	}
	if clean.contains('\'') {
		return Err(NumberParseError::new(BadBase, s));
	}

	if let Some(digits) = clean.strip_prefix("0x") {
		parse_digits(digits, 16, BadHexDigit, s)
	}
	else if let Some(digits) = clean.strip_prefix("0b") {
		parse_digits(digits, 2, BadBinaryDigit, s)
	}
	else {
		parse_digits(&clean, 10, BadDecimalDigit, s)
	}
}
