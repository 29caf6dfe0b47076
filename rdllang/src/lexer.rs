mod diagnostic;
mod logos_lexer;
mod number_parser;

use crate::SourceSpan;
use std::fmt;
use thiserror::Error;

pub use logos_lexer::{LogosLexer, LogosLexerContext};
pub use number_parser::{parse_number_str, NumberParseError, NumberParseErrorKind};

/// Lexer token type
/// In this case, it's defined by the Logos-based lexer implementation.
pub type TokenKind<'source> = logos_lexer::TokenKind<'source>;

/// Types of lexer errors
#[derive(Copy, Clone, Error, Debug, PartialEq, Eq)]
pub enum LexerErrorKind {
	/// Lexer couldn't match token to any regex
	#[error("Invalid token")]
	InvalidToken,

	/// Numeric constant could not be parsed correctly
	#[error("Invalid number token")]
	InvalidNumber(NumberParseError),

	/// Unterminated block comment
	#[error("Unterminated block comment")]
	UnterminatedBlockComment,

	/// String literal without the closing quote
	#[error("Unterminated string literal")]
	UnterminatedString,

	/// Unsupported escape sequence in a string literal
	#[error("Invalid escape sequence")]
	InvalidEscape,
}

/// Lexer error
#[derive(Copy, Clone, Error, Debug, PartialEq, Eq)]
pub struct LexerError {
	pub range: SourceSpan,
	pub kind: LexerErrorKind,
}

impl fmt::Display for LexerError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.kind)
	}
}

/// All language keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
	Addrmap,
	Alias,
	Default,
	External,
	Field,
	Internal,
	Mem,
	Reg,
	Regfile,
}

/// All language punctuators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunctuatorKind {
	Arrow,            // ->
	Assignment,       // =
	AssignmentModulo, // %=
	AssignmentPlus,   // +=
	Asterisk,         // *
	At,               // @
	BitwiseAnd,       // &
	BitwiseNot,       // ~
	BitwiseOr,        // |
	BitwiseXor,       // ^
	Colon,            // :
	Comma,            // ,
	Dot,              // .
	LBrace,           // {
	LBracket,         // [
	LPar,             // (
	LShift,           // <<
	Minus,            // -
	Modulo,           // %
	Plus,             // +
	RBrace,           // }
	RBracket,         // ]
	RPar,             // )
	RShift,           // >>
	Semicolon,        // ;
	Slash,            // /
}

impl PunctuatorKind {
	/// Source text of the punctuator
	pub fn text(&self) -> &'static str {
		use PunctuatorKind::*;
		match self {
			Arrow => "->",
			Assignment => "=",
			AssignmentModulo => "%=",
			AssignmentPlus => "+=",
			Asterisk => "*",
			At => "@",
			BitwiseAnd => "&",
			BitwiseNot => "~",
			BitwiseOr => "|",
			BitwiseXor => "^",
			Colon => ":",
			Comma => ",",
			Dot => ".",
			LBrace => "{",
			LBracket => "[",
			LPar => "(",
			LShift => "<<",
			Minus => "-",
			Modulo => "%",
			Plus => "+",
			RBrace => "}",
			RBracket => "]",
			RPar => ")",
			RShift => ">>",
			Semicolon => ";",
			Slash => "/",
		}
	}
}

/// Token as produced by the lexer (token kind + source location)
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'source> {
	/// Type of the token
	pub kind: TokenKind<'source>,

	/// Source code location
	pub range: SourceSpan,
}

/// Abstract lexer
pub trait Lexer<'source> {
	/// Creates a lexer for provided source code
	fn new(source: &'source str) -> Self;

	/// Processes the text and returns a vector of tokens
	fn process(&mut self) -> Result<Vec<Token<'source>>, LexerError>;
}
