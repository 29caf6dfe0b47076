pub mod core;
pub mod elab_diagnostic;
pub mod lexer;
pub mod parser;
pub mod utils;

pub use crate::core::compiler_diagnostic;
pub use crate::core::CompilerDiagnostic;
pub use crate::core::CompilerError;
pub use crate::core::DiagnosticBuffer;
pub use crate::core::LineIndex;
pub use crate::core::ProvidesCompilerDiagnostic;
pub use crate::core::SourceSpan;
