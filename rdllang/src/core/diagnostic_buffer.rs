use crate::compiler_diagnostic::CompilerDiagnostic;
use miette::NamedSource;

/// Collects diagnostics so that all of them can be reported at once
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBuffer {
	buffer: Vec<CompilerDiagnostic>,
	error_buffer: Vec<CompilerDiagnostic>,
}

impl DiagnosticBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_diagnostic(&mut self, diag: CompilerDiagnostic) {
		self.buffer.push(diag);
	}

	pub fn push_error(&mut self, diag: CompilerDiagnostic) {
		self.error_buffer.push(diag);
	}

	pub fn contains_errors(&self) -> bool {
		!self.error_buffer.is_empty()
	}

	pub fn error_count(&self) -> usize {
		self.error_buffer.len()
	}

	pub fn errors(&self) -> &[CompilerDiagnostic] {
		&self.error_buffer
	}

	pub fn is_empty(&self) -> bool {
		self.buffer.is_empty() && self.error_buffer.is_empty()
	}

	/// Prints every buffered diagnostic to stderr.
	///
	/// The last error (if any) is not printed but returned instead,
	/// so that the caller can fail with it.
	pub fn print_diagnostics(mut self, file_name: &str, source_code: &str) -> miette::Result<()> {
		let source = || NamedSource::new(file_name, source_code.to_string());

		if !self.buffer.is_empty() {
			eprintln!("During elaboration the following diagnostics were generated:");
		}
		for diag in self.buffer {
			eprintln!("{:?}", miette::Report::new(diag).with_source_code(source()));
		}

		let Some(last) = self.error_buffer.pop()
		else {
			return Ok(());
		};

		eprintln!("During elaboration the following errors were generated:");
		for diag in self.error_buffer {
			eprintln!("{:?}", miette::Report::new(diag).with_source_code(source()));
		}
		Err(miette::Report::new(last).with_source_code(source()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_last_error_is_returned() {
		let mut buffer = DiagnosticBuffer::new();
		assert!(buffer.clone().print_diagnostics("a.rdl", "").is_ok());

		buffer.push_error(CompilerDiagnostic::new_error("first"));
		buffer.push_error(CompilerDiagnostic::new_error("second"));
		assert!(buffer.contains_errors());
		assert_eq!(buffer.error_count(), 2);

		let err = buffer.print_diagnostics("a.rdl", "").unwrap_err();
		assert_eq!(err.to_string(), "second");
	}
}
