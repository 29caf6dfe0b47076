use crate::compiler_diagnostic::*;
use crate::lexer::LexerError;
use crate::parser::ParserError;
use regmap::{ElabError, RenderError};
use thiserror::Error;

/// General compiler error
///
/// Includes errors from all stages of the tool
#[derive(Debug, Error)]
pub enum CompilerError {
	#[error(transparent)]
	LexerError(#[from] LexerError),

	#[error(transparent)]
	ParserError(#[from] ParserError),

	#[error(transparent)]
	IoError(#[from] std::io::Error),

	#[error("File not found")]
	FileNotFound(String),

	#[error(transparent)]
	ElabError(#[from] ElabError),

	#[error("Could not render the register map")]
	RenderError(#[from] RenderError),
}

impl ProvidesCompilerDiagnostic for CompilerError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use CompilerError::*;
		match self {
			LexerError(lexer_error) => lexer_error.into(),

			ParserError(parser_error) => parser_error.into(),

			IoError(io_error) => CompilerDiagnosticBuilder::from_error(&self)
				.help(&io_error.to_string())
				.build(),

			FileNotFound(file_name) => CompilerDiagnosticBuilder::from_error(&self)
				.help(&format!("Make sure this file exists: {}", file_name))
				.build(),

			ElabError(elab_error) => {
				use regmap::ElabError::*;
				let help = match elab_error {
					NoRootAddrmap => "Define or instantiate at least one addrmap at the root of the file".to_string(),
					TopNotFound(name) => format!("Make sure `{}` is defined at the root of the file", name),
					TopNotAddrmap(name) => format!("`{}` must be an addrmap to be used as the top component", name),
				};
				CompilerDiagnosticBuilder::from_error(&self)
					.help(&help)
					.error_code("rdl::elab::top")
					.build()
			},

			RenderError(render_error) => CompilerDiagnosticBuilder::from_error(&self)
				.help(&render_error.to_string())
				.build(),
		}
	}
}
