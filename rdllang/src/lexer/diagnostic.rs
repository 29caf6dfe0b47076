use super::LexerError;
use super::LexerErrorKind;
use crate::compiler_diagnostic::*;

impl ProvidesCompilerDiagnostic for LexerError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		let diag = CompilerDiagnosticBuilder::from_error(&self);
		match self.kind {
			LexerErrorKind::InvalidNumber(parse_error) => diag
				.label(self.range, "This is not a valid number")
				.help(parse_error.help()),

			LexerErrorKind::UnterminatedBlockComment => diag
				.label(self.range, "This comment never ends")
				.help("Did you forget to use '*/'?"),

			LexerErrorKind::UnterminatedString => diag
				.label(self.range, "This string never ends")
				.help("Strings must be closed with '\"' before the end of the file"),

			LexerErrorKind::InvalidEscape => diag
				.label(self.range, "Unknown escape sequence")
				.help("Supported escape sequences are \\\", \\\\, \\n and \\t"),

			LexerErrorKind::InvalidToken => diag
				.label(self.range, "This token doesn't make sense")
				.help("This is neither a keyword, an identifier nor a valid numeric constant"),
		}
		.build()
	}
}
