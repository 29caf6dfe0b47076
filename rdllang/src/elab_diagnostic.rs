//! Presentation of elaboration messages as compiler diagnostics.

use crate::compiler_diagnostic::*;
use crate::{DiagnosticBuffer, LineIndex, SourceSpan};
use regmap::{ElabMessage, ElabMessageKind, ElabReport};

/// Instance name without the array element suffix (`regs[2]` -> `regs`)
fn base_instance_name(name: &str) -> &str {
	name.split('[').next().unwrap_or(name)
}

/// Elaboration message located in the source code
pub struct ElabDiagnostic<'m> {
	message: &'m ElabMessage,
	span: SourceSpan,
}

impl<'m> ElabDiagnostic<'m> {
	pub fn new(message: &'m ElabMessage, lines: &LineIndex, source: &str) -> Self {
		Self {
			message,
			span: lines.span_at(message.pos(), source),
		}
	}

	pub fn span(&self) -> SourceSpan {
		self.span
	}

	fn error_code(&self) -> &'static str {
		use ElabMessageKind::*;
		match self.message.kind() {
			UnknownType { .. } => "rdl::elab::unknown_type",
			DuplicateDefinition { .. } => "rdl::elab::duplicate_definition",
			UnknownProperty { .. } => "rdl::elab::unknown_property",
			AddressOverlap { .. } => "rdl::elab::address_overlap",
			InvalidBitRange { .. } => "rdl::elab::invalid_bit_range",
			InvalidRegWidth { .. } => "rdl::elab::invalid_regwidth",
			FieldOverlap { .. } => "rdl::elab::field_overlap",
			InvalidNesting { .. } => "rdl::elab::invalid_nesting",
			InvalidArrayDimension { .. } => "rdl::elab::invalid_array_dimension",
			MissingMemEntries { .. } => "rdl::elab::missing_mementries",
			UnknownInstance { .. } => "rdl::elab::unknown_instance",
			RecursiveInstantiation { .. } => "rdl::elab::recursive_instantiation",
		}
	}
}

impl<'m> ProvidesCompilerDiagnostic for ElabDiagnostic<'m> {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use ElabMessageKind::*;
		let diag = CompilerDiagnosticBuilder::from_error(self.message.kind()).error_code(self.error_code());
		match self.message.kind() {
			UnknownType { .. } => diag
				.label(self.span, "This type is not defined")
				.help("Types must be defined in this scope or in one of the enclosing scopes"),

			DuplicateDefinition { .. } => diag
				.label(self.span, "Redefined here")
				.help("The first definition is used"),

			UnknownProperty { .. } => diag
				.label(self.span, "Not a built-in property")
				.help("The value is kept, but no tool will understand it"),

			AddressOverlap { other, .. } => diag
				.label(self.span, "This instance")
				.help(&format!(
					"Move the instance, or declare it as `alias {}` if both are meant to share the address",
					base_instance_name(other)
				)),

			InvalidBitRange { regwidth, .. } => diag
				.label(self.span, "This field")
				.help(&format!("Bit indices must satisfy lsb <= msb < {}", regwidth)),

			InvalidRegWidth { .. } => diag
				.label(self.span, "This register")
				.help("regwidth must be a positive multiple of 8"),

			FieldOverlap { .. } => diag
				.label(self.span, "This field")
				.help("Overlapping fields are allowed only if one is read-only (sw = r) and the other write-only (sw = w)"),

			InvalidNesting { .. } => diag
				.label(self.span, "Instantiated here")
				.help("addrmap may contain addrmap, regfile, reg and mem; regfile may contain regfile and reg; reg may contain field"),

			InvalidArrayDimension { .. } => diag
				.label(self.span, "This instance")
				.help("Array dimensions must be positive; fields accept a single [width] or [msb:lsb]"),

			MissingMemEntries { .. } => diag
				.label(self.span, "This memory")
				.help("Set `mementries` to the number of memory entries"),

			UnknownInstance { .. } => diag
				.label(self.span, "Referenced here")
				.help("Only instances declared in the same body can be referenced"),

			RecursiveInstantiation { .. } => diag
				.label(self.span, "Instantiated here")
				.help("A component cannot contain an instance of itself"),
		}
		.build()
	}
}

/// Converts every message of the report into an error diagnostic
pub fn elab_diagnostics(report: &ElabReport, source: &str) -> DiagnosticBuffer {
	let lines = LineIndex::new(source);
	let mut buffer = DiagnosticBuffer::new();
	for message in report.messages() {
		buffer.push_error(ElabDiagnostic::new(message, &lines, source).to_diagnostic());
	}
	buffer
}

#[cfg(test)]
mod tests {
	use super::*;
	use regmap::SourcePos;

	#[test]
	fn test_located_diagnostic() {
		let source = "addrmap top {\n  foo_t x;\n};\n";
		let mut report = ElabReport::default();
		report.add(
			ElabMessageKind::UnknownType { name: "foo_t".into() },
			SourcePos::new(2, 3),
		);

		let buffer = elab_diagnostics(&report, source);
		assert_eq!(buffer.error_count(), 1);
		let diag = &buffer.errors()[0];
		assert_eq!(diag.to_string(), "Unknown component type `foo_t`");
		assert_eq!(diag.spans()[0].offset(), 16);
		assert_eq!(diag.spans()[0].len(), 5);
	}

	#[test]
	fn test_overlap_suggests_base_name() {
		let source = "addrmap top {\n  r_t regs[4];\n  r_t x @ 0x8;\n};\n";
		let mut report = ElabReport::default();
		report.add(
			ElabMessageKind::AddressOverlap {
				name: "x".into(),
				other: "regs[2]".into(),
				address: 0x8,
			},
			SourcePos::new(3, 7),
		);

		let buffer = elab_diagnostics(&report, source);
		let help = miette::Diagnostic::help(&buffer.errors()[0]).unwrap().to_string();
		assert!(help.contains("`alias regs`"), "{}", help);
		assert!(!help.contains("regs[2]"));
	}
}
