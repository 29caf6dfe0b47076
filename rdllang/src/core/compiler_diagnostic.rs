use crate::SourceSpan;
use miette::{Diagnostic, LabeledSpan, Severity};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// A generic compiler diagnostic message
#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
	severity: Severity,
	error_text: String,
	help_text: Option<String>,
	error_code: Option<String>,
	labels: Vec<LabeledSpan>,
}

/// Used to conveniently craft compiler error messages
pub struct CompilerDiagnosticBuilder {
	diag: CompilerDiagnostic,
}

impl From<CompilerDiagnostic> for CompilerDiagnosticBuilder {
	fn from(diag: CompilerDiagnostic) -> Self {
		Self { diag }
	}
}

impl CompilerDiagnosticBuilder {
	/// Creates an error diagnostic from an error type
	pub fn from_error<ErrorType>(err: &ErrorType) -> Self
	where
		ErrorType: Error,
	{
		Self::new_error(&err.to_string())
	}

	/// Creates a new error message
	pub fn new_error(msg: &str) -> Self {
		CompilerDiagnostic::new_error(msg).into()
	}

	/// Creates a new warning message
	pub fn new_warning(msg: &str) -> Self {
		CompilerDiagnostic::new_warning(msg).into()
	}

	/// Adds a source code label
	pub fn label(mut self, span: SourceSpan, msg: &str) -> Self {
		self.diag.add_label(span, msg);
		self
	}

	/// Attaches an error code
	pub fn error_code(mut self, code: &str) -> Self {
		self.diag.set_error_code(code);
		self
	}

	/// Attaches a help message
	pub fn help(mut self, help: &str) -> Self {
		self.diag.set_help(help);
		self
	}

	/// Returns the new diagnostic
	pub fn build(self) -> CompilerDiagnostic {
		self.diag
	}
}

impl Display for CompilerDiagnostic {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.error_text)
	}
}

impl Error for CompilerDiagnostic {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		None
	}
}

impl Diagnostic for CompilerDiagnostic {
	fn code<'a>(&'a self) -> Option<Box<(dyn std::fmt::Display + 'a)>> {
		self.error_code
			.as_ref()
			.map(|code| Box::new(code) as Box<dyn Display + 'a>)
	}

	fn severity(&self) -> Option<miette::Severity> {
		Some(self.severity)
	}

	fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
		self.help_text
			.as_ref()
			.map(|msg| Box::new(msg) as Box<dyn Display + 'a>)
	}

	fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
		if self.labels.is_empty() {
			return None;
		}
		Some(Box::new(self.labels.iter().cloned()))
	}
}

impl CompilerDiagnostic {
	/// Creates a new diagnostic message
	fn new(severity: miette::Severity, msg: &str) -> Self {
		Self {
			severity,
			help_text: None,
			error_text: msg.into(),
			error_code: None,
			labels: Vec::new(),
		}
	}

	/// Creates a new error diagnostic
	pub fn new_error(msg: &str) -> Self {
		Self::new(miette::Severity::Error, msg)
	}

	/// Creates a new warning diagnostic
	pub fn new_warning(msg: &str) -> Self {
		Self::new(miette::Severity::Warning, msg)
	}

	pub fn message(&self) -> &str {
		&self.error_text
	}

	/// Labeled source spans attached so far
	pub fn spans(&self) -> &[LabeledSpan] {
		&self.labels
	}

	/// Attaches source code label
	pub fn add_label(&mut self, span: SourceSpan, msg: &str) {
		self.labels.push(miette::LabeledSpan::new_with_span(
			Some(String::from(msg)),
			<SourceSpan as Into<miette::SourceSpan>>::into(span),
		));
	}

	/// Sets the help message
	pub fn set_help(&mut self, help: &str) {
		self.help_text = Some(help.into());
	}

	/// Set the error code
	pub fn set_error_code(&mut self, code: &str) {
		self.error_code = Some(code.into());
	}
}

/// Indicates that type can provide a CompilerDiagnostic message.
/// All compiler error types must implement this trait.
pub trait ProvidesCompilerDiagnostic: Into<CompilerDiagnostic> {
	/// Must be implemented by the error type
	fn to_diagnostic(&self) -> CompilerDiagnostic;

	/// Returns a diagnostic message builder - useful when you want to modify the message
	fn to_diagnostic_builder(&self) -> CompilerDiagnosticBuilder {
		self.to_diagnostic().into()
	}

	/// Returns a Miette report
	fn to_miette_report(&self) -> miette::Report {
		miette::Report::new(self.to_diagnostic())
	}
}

/// Implements ProvidesCompilerDiagnostic for reference types
/// for convenience
impl<T> ProvidesCompilerDiagnostic for &T
where
	T: ProvidesCompilerDiagnostic,
{
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		(*self).to_diagnostic()
	}
}

/// Implements conversions between CompilerDiagnostic and error types
impl<T> From<T> for CompilerDiagnostic
where
	T: ProvidesCompilerDiagnostic,
{
	fn from(err: T) -> Self {
		err.to_diagnostic()
	}
}
