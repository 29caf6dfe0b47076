mod expression;
mod parser_error;
mod rdl_parser;
mod token_stream;

pub use expression::{parse_const_expr, ConstValue};
pub use parser_error::{ParserError, ParserErrorKind};
pub use rdl_parser::RdlParser;
pub use token_stream::TokenStream;

use crate::lexer::{Lexer, LogosLexer};
use crate::LineIndex;
use log::info;
use regmap::syntax::Root;

/// Lexes and parses a complete source file
///
/// Stops at the first lexer or syntax error.
pub fn parse_source(source: &str) -> Result<Root, ParserError> {
	let tokens = LogosLexer::new(source).process()?;
	info!("Parsing {} tokens", tokens.len());

	let lines = LineIndex::new(source);
	let stream = TokenStream::new(&tokens, source.len(), &lines);
	RdlParser::new(stream).parse_root()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn eval(s: &str) -> Result<i128, ParserError> {
		let tokens = LogosLexer::new(s).process()?;
		let lines = LineIndex::new(s);
		let mut stream = TokenStream::new(&tokens, s.len(), &lines);
		let value = parse_const_expr(&mut stream)?;
		assert!(stream.is_at_end(), "trailing tokens in {}", s);
		Ok(value.value)
	}

	#[rstest]
	#[case("1 + 2 * 3", 7)]
	#[case("(1 + 2) * 3", 9)]
	#[case("10 - 4 - 3", 3)]
	#[case("100 / 10 / 5", 2)]
	#[case("1 << 4 + 1", 32)]
	#[case("0xff & 0x0f | 0x30", 0x3f)]
	#[case("6 ^ 3 & 1", 7)]
	#[case("-4 + 10", 6)]
	#[case("~0 & 0xf", 0xf)]
	#[case("17 % 5", 2)]
	#[case("0x100 >> 4", 0x10)]
	#[case("4'b1010 + 'd2", 12)]
	fn test_precedence(#[case] expr: &str, #[case] value: i128) {
		assert_eq!(eval(expr).unwrap(), value);
	}

	#[rstest]
	#[case("4 / 0", ParserErrorKind::DivisionByZero)]
	#[case("4 % (2 - 2)", ParserErrorKind::DivisionByZero)]
	#[case("1 << 200", ParserErrorKind::ValueOutOfRange)]
	#[case("(1 + 2", ParserErrorKind::UnexpectedEof { expected: "')'".into() })]
	#[case("1 + ;", ParserErrorKind::UnexpectedToken { expected: "constant expression".into() })]
	fn test_expression_errors(#[case] expr: &str, #[case] kind: ParserErrorKind) {
		assert_eq!(eval(expr).unwrap_err().kind, kind);
	}

	#[test]
	fn test_division_by_zero_span() {
		let err = eval("8 / (1 - 1)").unwrap_err();
		assert_eq!(err.range.start(), 4);
		assert_eq!(err.range.end(), 11);
	}
}
