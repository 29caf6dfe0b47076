use super::ParserError;
use crate::lexer::{KeywordKind, PunctuatorKind, Token, TokenKind};
use crate::{LineIndex, SourceSpan};
use regmap::SourcePos;

/// Cursor over the lexed tokens
pub struct TokenStream<'t, 'source> {
	tokens: &'t [Token<'source>],
	index: usize,
	eof: SourceSpan,
	lines: &'t LineIndex,
}

impl<'t, 'source> TokenStream<'t, 'source> {
	pub fn new(tokens: &'t [Token<'source>], source_len: usize, lines: &'t LineIndex) -> Self {
		Self {
			tokens,
			index: 0,
			eof: SourceSpan::new(source_len, 0),
			lines,
		}
	}

	pub fn peek(&self) -> Option<&'t TokenKind<'source>> {
		self.peek_nth(0)
	}

	pub fn peek_nth(&self, n: usize) -> Option<&'t TokenKind<'source>> {
		self.tokens.get(self.index + n).map(|t| &t.kind)
	}

	pub fn is_at_end(&self) -> bool {
		self.index >= self.tokens.len()
	}

	/// Span of the current token (empty span at the end of input)
	pub fn span(&self) -> SourceSpan {
		self.tokens.get(self.index).map(|t| t.range).unwrap_or(self.eof)
	}

	/// Span of the most recently consumed token
	pub fn last_span(&self) -> SourceSpan {
		match self.index {
			0 => SourceSpan::new(0, 0),
			i => self.tokens[i - 1].range,
		}
	}

	/// Source position of the current token
	pub fn pos(&self) -> SourcePos {
		self.pos_of(self.span())
	}

	pub fn pos_of(&self, span: SourceSpan) -> SourcePos {
		self.lines.position(span.start())
	}

	pub fn advance(&mut self) -> Option<&'t Token<'source>> {
		let token = self.tokens.get(self.index)?;
		self.index += 1;
		Some(token)
	}

	/// Error describing the current token as unexpected
	pub fn error(&self, expected: &str) -> ParserError {
		match self.is_at_end() {
			true => ParserError::unexpected_eof(expected, self.eof),
			false => ParserError::unexpected_token(expected, self.span()),
		}
	}

	pub fn is_punct(&self, punct: PunctuatorKind) -> bool {
		matches!(self.peek(), Some(TokenKind::Punctuator(p)) if *p == punct)
	}

	pub fn is_keyword(&self, keyword: KeywordKind) -> bool {
		matches!(self.peek(), Some(TokenKind::Keyword(k)) if *k == keyword)
	}

	/// Consumes the punctuator if it's next
	pub fn eat_punct(&mut self, punct: PunctuatorKind) -> bool {
		if self.is_punct(punct) {
			self.index += 1;
			return true;
		}
		false
	}

	pub fn eat_keyword(&mut self, keyword: KeywordKind) -> bool {
		if self.is_keyword(keyword) {
			self.index += 1;
			return true;
		}
		false
	}

	pub fn expect_punct(&mut self, punct: PunctuatorKind) -> Result<SourceSpan, ParserError> {
		if self.eat_punct(punct) {
			return Ok(self.last_span());
		}
		Err(self.error(&format!("'{}'", punct.text())))
	}

	/// Consumes an identifier
	pub fn expect_id(&mut self, expected: &str) -> Result<(&'source str, SourceSpan), ParserError> {
		match self.peek() {
			Some(TokenKind::Id(name)) => {
				self.index += 1;
				Ok((*name, self.last_span()))
			},
			_ => Err(self.error(expected)),
		}
	}
}
