use super::number_parser::parse_number_str;
use super::{KeywordKind, Lexer, LexerError, LexerErrorKind, PunctuatorKind, SourceSpan, Token};
use log::trace;
use logos::{Filter, Logos, Skip};

/// Parses numeric constant tokens
fn parse_number_token<'source>(lex: &mut logos::Lexer<'source, TokenKind<'source>>) -> Option<u64> {
	parse_number_str(lex.slice())
		.map_err(|err| {
			lex.extras.last_err = Some(LexerError {
				range: SourceSpan::new_from_range(&lex.span()),
				kind: LexerErrorKind::InvalidNumber(err),
			});
		})
		.ok()
}

/// Consumes a string literal and resolves escape sequences
fn consume_string<'source>(lex: &mut logos::Lexer<'source, TokenKind<'source>>) -> Option<String> {
	let mut value = String::new();
	let mut chars = lex.remainder().char_indices();

	while let Some((offset, c)) = chars.next() {
		match c {
			'"' => {
				lex.bump(offset + 1);
				return Some(value);
			},
			'\\' => match chars.next() {
				Some((_, '"')) => value.push('"'),
				Some((_, '\\')) => value.push('\\'),
				Some((_, 'n')) => value.push('\n'),
				Some((_, 't')) => value.push('\t'),
				Some((escape_offset, _)) => {
					let start = lex.span().end + offset;
					lex.extras.last_err = Some(LexerError {
						range: SourceSpan::new_between(start, lex.span().end + escape_offset + 1),
						kind: LexerErrorKind::InvalidEscape,
					});
					lex.bump(escape_offset + 1);
					return None;
				},
				None => break,
			},
			c => value.push(c),
		}
	}

	let span = lex.span();
	lex.extras.last_err = Some(LexerError {
		range: SourceSpan::new(span.start, lex.remainder().len() + span.end - span.start),
		kind: LexerErrorKind::UnterminatedString,
	});
	lex.bump(lex.remainder().len());
	None
}

/// Causes lexer to consume and ignore multi-line comments (/* */)
fn consume_block_comment<'source>(lex: &mut logos::Lexer<'source, TokenKind<'source>>) -> Filter<()> {
	match lex.remainder().find("*/") {
		Some(offset) => {
			lex.bump(offset + 2);
			Filter::Skip
		},
		None => {
			let span = lex.span();
			lex.extras.last_err = Some(LexerError {
				range: SourceSpan::new(span.start, lex.remainder().len() + span.end - span.start),
				kind: LexerErrorKind::UnterminatedBlockComment,
			});
			lex.bump(lex.remainder().len());
			Filter::Emit(())
		},
	}
}

/// Causes lexer to consume and ignore single-line comments (//)
fn consume_line_comment<'source>(lex: &mut logos::Lexer<'source, TokenKind<'source>>) -> Skip {
	match lex.remainder().find('\n') {
		Some(offset) => lex.bump(offset + 1),
		None => lex.bump(lex.remainder().len()),
	}
	Skip
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(extras = LogosLexerContext)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind<'source> {
	/// Only emitted for unterminated block comments
	#[token("/*", consume_block_comment)]
	#[token("//", consume_line_comment)]
	Ignored,

	#[token("false", |_| false)]
	#[token("true", |_| true)]
	Boolean(bool),

	#[regex(r"[0-9][a-zA-Z0-9_]*('[a-zA-Z0-9_]*)?", parse_number_token)]
	#[regex(r"'[a-zA-Z0-9_]+", parse_number_token)]
	Number(u64),

	#[token("\"", consume_string)]
	String(String),

	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
	Id(&'source str),

	#[token("addrmap",  |_| KeywordKind::Addrmap)]
	#[token("alias",    |_| KeywordKind::Alias)]
	#[token("default",  |_| KeywordKind::Default)]
	#[token("external", |_| KeywordKind::External)]
	#[token("field",    |_| KeywordKind::Field)]
	#[token("internal", |_| KeywordKind::Internal)]
	#[token("mem",      |_| KeywordKind::Mem)]
	#[token("reg",      |_| KeywordKind::Reg)]
	#[token("regfile",  |_| KeywordKind::Regfile)]
	Keyword(KeywordKind),

	#[token("->", |_| PunctuatorKind::Arrow)]
	#[token("=",  |_| PunctuatorKind::Assignment)]
	#[token("%=", |_| PunctuatorKind::AssignmentModulo)]
	#[token("+=", |_| PunctuatorKind::AssignmentPlus)]
	#[token("*",  |_| PunctuatorKind::Asterisk)]
	#[token("@",  |_| PunctuatorKind::At)]
	#[token("&",  |_| PunctuatorKind::BitwiseAnd)]
	#[token("~",  |_| PunctuatorKind::BitwiseNot)]
	#[token("|",  |_| PunctuatorKind::BitwiseOr)]
	#[token("^",  |_| PunctuatorKind::BitwiseXor)]
	#[token(":",  |_| PunctuatorKind::Colon)]
	#[token(",",  |_| PunctuatorKind::Comma)]
	#[token(".",  |_| PunctuatorKind::Dot)]
	#[token("{",  |_| PunctuatorKind::LBrace)]
	#[token("[",  |_| PunctuatorKind::LBracket)]
	#[token("(",  |_| PunctuatorKind::LPar)]
	#[token("<<", |_| PunctuatorKind::LShift)]
	#[token("-",  |_| PunctuatorKind::Minus)]
	#[token("%",  |_| PunctuatorKind::Modulo)]
	#[token("+",  |_| PunctuatorKind::Plus)]
	#[token("}",  |_| PunctuatorKind::RBrace)]
	#[token("]",  |_| PunctuatorKind::RBracket)]
	#[token(")",  |_| PunctuatorKind::RPar)]
	#[token(">>", |_| PunctuatorKind::RShift)]
	#[token(";",  |_| PunctuatorKind::Semicolon)]
	#[token("/",  |_| PunctuatorKind::Slash)]
	Punctuator(PunctuatorKind),
}

/// Additional data accessed by the token callbacks
///
/// Owned by logos::Lexer as its extras.
#[derive(Debug, Default)]
pub struct LogosLexerContext {
	/// Last lexing error (written by custom token parsing functions)
	last_err: Option<LexerError>,
}

/// Logos-based lexer implementation
pub struct LogosLexer<'source> {
	lexer: logos::Lexer<'source, TokenKind<'source>>,
}

impl<'source> LogosLexer<'source> {
	/// Error for the token which has just failed to lex
	fn current_error(&mut self) -> LexerError {
		self.lexer.extras.last_err.take().unwrap_or(LexerError {
			kind: LexerErrorKind::InvalidToken,
			range: SourceSpan::new_from_range(&self.lexer.span()),
		})
	}
}

/// Lexer implementation based on logos <3
impl<'source> Lexer<'source> for LogosLexer<'source> {
	/// Creates a new lexer given a source code string
	fn new(source: &'source str) -> Self {
		LogosLexer {
			lexer: TokenKind::lexer_with_extras(source, LogosLexerContext::default()),
		}
	}

	/// Processes the string and produces a vector of tokens
	fn process(&mut self) -> Result<Vec<Token<'source>>, LexerError> {
		let mut tokens = Vec::<Token>::with_capacity(self.lexer.source().len() / 4);

		while let Some(token_result) = self.lexer.next() {
			match token_result {
				Ok(TokenKind::Ignored) | Err(_) => return Err(self.current_error()),
				Ok(token_kind) => {
					trace!("Token {:?} at {:?}", token_kind, self.lexer.span());
					tokens.push(Token {
						kind: token_kind,
						range: SourceSpan::new_from_range(&self.lexer.span()),
					})
				},
			}
		}

		Ok(tokens)
	}
}
