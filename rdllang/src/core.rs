pub mod compiler_diagnostic;
pub mod compiler_error;
pub mod diagnostic_buffer;
pub mod line_index;
pub mod source_span;

pub use compiler_diagnostic::{CompilerDiagnostic, CompilerDiagnosticBuilder, ProvidesCompilerDiagnostic};
pub use compiler_error::CompilerError;
pub use diagnostic_buffer::DiagnosticBuffer;
pub use line_index::LineIndex;
pub use source_span::SourceSpan;
