use super::token_stream::TokenStream;
use super::{ParserError, ParserErrorKind};
use crate::lexer::{PunctuatorKind, TokenKind};
use crate::SourceSpan;
use log::trace;

/// Value of an evaluated constant expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstValue {
	pub value: i128,
	pub range: SourceSpan,
}

impl ConstValue {
	fn out_of_range(&self) -> ParserError {
		ParserError::new(ParserErrorKind::ValueOutOfRange, self.range)
	}

	/// Value usable as an address, size or bit index
	pub fn to_u64(&self) -> Result<u64, ParserError> {
		u64::try_from(self.value).map_err(|_| self.out_of_range())
	}

	/// Value usable as an integer property
	pub fn to_i64(&self) -> Result<i64, ParserError> {
		i64::try_from(self.value).map_err(|_| self.out_of_range())
	}
}

/// Binary operators in the order of increasing precedence
const BINARY_OPERATORS: &[&[PunctuatorKind]] = &[
	&[PunctuatorKind::BitwiseOr],
	&[PunctuatorKind::BitwiseXor],
	&[PunctuatorKind::BitwiseAnd],
	&[PunctuatorKind::LShift, PunctuatorKind::RShift],
	&[PunctuatorKind::Plus, PunctuatorKind::Minus],
	&[PunctuatorKind::Asterisk, PunctuatorKind::Slash, PunctuatorKind::Modulo],
];

/// Parses and evaluates a constant integer expression
pub fn parse_const_expr(stream: &mut TokenStream) -> Result<ConstValue, ParserError> {
	let value = parse_binary(stream, 0)?;
	trace!("Constant expression evaluates to {}", value.value);
	Ok(value)
}

fn binary_operator(stream: &TokenStream, level: usize) -> Option<PunctuatorKind> {
	match stream.peek() {
		Some(TokenKind::Punctuator(p)) if BINARY_OPERATORS[level].contains(p) => Some(*p),
		_ => None,
	}
}

/// Left-associative binary operators starting at the given precedence level
fn parse_binary(stream: &mut TokenStream, level: usize) -> Result<ConstValue, ParserError> {
	if level == BINARY_OPERATORS.len() {
		return parse_unary(stream);
	}

	let mut lhs = parse_binary(stream, level + 1)?;
	while let Some(op) = binary_operator(stream, level) {
		stream.advance();
		let rhs = parse_binary(stream, level + 1)?;
		lhs = apply_binary(op, lhs, rhs)?;
	}
	Ok(lhs)
}

fn apply_binary(op: PunctuatorKind, lhs: ConstValue, rhs: ConstValue) -> Result<ConstValue, ParserError> {
	use PunctuatorKind::*;
	let range = lhs.range.join(rhs.range);
	let out_of_range = || ParserError::new(ParserErrorKind::ValueOutOfRange, range);
	let (a, b) = (lhs.value, rhs.value);

	let value = match op {
		BitwiseOr => a | b,
		BitwiseXor => a ^ b,
		BitwiseAnd => a & b,
		LShift | RShift => {
			let shift = u32::try_from(b).ok().filter(|s| *s < 64).ok_or_else(out_of_range)?;
			match op {
				LShift => a.checked_shl(shift).ok_or_else(out_of_range)?,
				_ => a >> shift,
			}
		},
		Plus => a.checked_add(b).ok_or_else(out_of_range)?,
		Minus => a.checked_sub(b).ok_or_else(out_of_range)?,
		Asterisk => a.checked_mul(b).ok_or_else(out_of_range)?,
		Slash | Modulo if b == 0 => return Err(ParserError::new(ParserErrorKind::DivisionByZero, rhs.range)),
		Slash => a / b,
		Modulo => a % b,
		_ => return Err(ParserError::unexpected_token("operator", range)),
	};
	Ok(ConstValue { value, range })
}

fn parse_unary(stream: &mut TokenStream) -> Result<ConstValue, ParserError> {
	let start = stream.span();
	let op = match stream.peek() {
		Some(TokenKind::Punctuator(p @ (PunctuatorKind::Minus | PunctuatorKind::Plus | PunctuatorKind::BitwiseNot))) => *p,
		_ => return parse_primary(stream),
	};
	stream.advance();

	let operand = parse_unary(stream)?;
	let value = match op {
		PunctuatorKind::Minus => -operand.value,
		PunctuatorKind::BitwiseNot => !operand.value,
		_ => operand.value,
	};
	Ok(ConstValue {
		value,
		range: start.join(operand.range),
	})
}

fn parse_primary(stream: &mut TokenStream) -> Result<ConstValue, ParserError> {
	match stream.peek() {
		Some(TokenKind::Number(value)) => {
			stream.advance();
			Ok(ConstValue {
				value: *value as i128,
				range: stream.last_span(),
			})
		},
		Some(TokenKind::Boolean(value)) => {
			stream.advance();
			Ok(ConstValue {
				value: *value as i128,
				range: stream.last_span(),
			})
		},
		Some(TokenKind::Punctuator(PunctuatorKind::LPar)) => {
			let start = stream.span();
			stream.advance();
			let inner = parse_const_expr(stream)?;
			let end = stream.expect_punct(PunctuatorKind::RPar)?;
			Ok(ConstValue {
				value: inner.value,
				range: start.join(end),
			})
		},
		_ => Err(stream.error("constant expression")),
	}
}
