use crate::compiler_diagnostic::*;
use crate::lexer::LexerError;
use crate::SourceSpan;
use std::fmt;
use thiserror::Error;

/// Types of syntax errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParserErrorKind {
	#[error("Unexpected token, expected {expected}")]
	UnexpectedToken { expected: String },

	#[error("Unexpected end of file, expected {expected}")]
	UnexpectedEof { expected: String },

	#[error("Division by zero in constant expression")]
	DivisionByZero,

	#[error("Constant expression value is out of range")]
	ValueOutOfRange,

	#[error(transparent)]
	LexerError(LexerError),
}

/// Syntax error
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub struct ParserError {
	pub kind: ParserErrorKind,
	pub range: SourceSpan,
}

impl fmt::Display for ParserError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.kind)
	}
}

impl ParserError {
	pub fn new(kind: ParserErrorKind, range: SourceSpan) -> Self {
		Self { kind, range }
	}

	pub fn unexpected_token(expected: &str, range: SourceSpan) -> Self {
		Self::new(
			ParserErrorKind::UnexpectedToken {
				expected: expected.into(),
			},
			range,
		)
	}

	pub fn unexpected_eof(expected: &str, range: SourceSpan) -> Self {
		Self::new(
			ParserErrorKind::UnexpectedEof {
				expected: expected.into(),
			},
			range,
		)
	}
}

impl From<LexerError> for ParserError {
	fn from(err: LexerError) -> Self {
		Self::new(ParserErrorKind::LexerError(err), err.range)
	}
}

impl ProvidesCompilerDiagnostic for ParserError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use ParserErrorKind::*;
		match &self.kind {
			LexerError(lexer_error) => lexer_error.to_diagnostic(),

			UnexpectedToken { .. } => CompilerDiagnosticBuilder::from_error(&self)
				.label(self.range, "This token is not allowed here")
				.error_code("rdl::syntax")
				.build(),

			UnexpectedEof { .. } => CompilerDiagnosticBuilder::from_error(&self)
				.label(self.range, "The file ends here")
				.help("Some statement or component body is not closed")
				.error_code("rdl::syntax")
				.build(),

			DivisionByZero => CompilerDiagnosticBuilder::from_error(&self)
				.label(self.range, "The divisor evaluates to zero")
				.error_code("rdl::syntax")
				.build(),

			ValueOutOfRange => CompilerDiagnosticBuilder::from_error(&self)
				.label(self.range, "This value cannot be represented")
				.help("Addresses, sizes and bit indices must be non-negative 64-bit values")
				.error_code("rdl::syntax")
				.build(),
		}
	}
}
