use crate::compiler_diagnostic::ProvidesCompilerDiagnostic;
use crate::elab_diagnostic::elab_diagnostics;
use crate::lexer::{Lexer, LogosLexer};
use crate::parser::parse_source;
use crate::{CompilerError, DiagnosticBuffer};
use log::{info, warn};
use regmap::elab::{ElabOptions, ElabResult, Elaborator, RegisterElaborator};
use regmap::render::{AddressMapRender, JsonRender, Render, TreeRender};
use regmap::syntax::Root;
use regmap::ElaboratedModel;
use std::fs;
use std::io::Write;

/// Reads the input file, providing the file name if it's missing
pub fn read_input_from_file(filename: &str) -> miette::Result<String> {
	fs::read_to_string(filename).map_err(|_| CompilerError::FileNotFound(filename.to_string()).to_miette_report())
}

fn write_output(output: &mut dyn Write, text: &str) -> miette::Result<()> {
	output
		.write_all(text.as_bytes())
		.map_err(|e| CompilerError::IoError(e).to_miette_report())
}

/// Tokenizes the source code and lists the tokens
pub fn tokenize(code: &str, output: &mut dyn Write) -> miette::Result<()> {
	let mut lexer = LogosLexer::new(code);
	let tokens = lexer
		.process()
		.map_err(|err| err.to_miette_report().with_source_code(code.to_string()))?;

	info!("{} tokens have been extracted from the source code", tokens.len());
	for t in &tokens {
		writeln!(output, "Token {:?} - '{}'", t.kind, &code[t.range.start()..t.range.end()])
			.map_err(|e| CompilerError::IoError(e).to_miette_report())?;
	}
	Ok(())
}

/// Parses the source code into a syntax tree
pub fn parse_to_ast(code: &str) -> miette::Result<Root> {
	parse_source(code).map_err(|err| err.to_miette_report().with_source_code(code.to_string()))
}

/// Parses the source code and dumps the syntax tree
pub fn parse(code: &str, output: &mut dyn Write) -> miette::Result<()> {
	let ast = parse_to_ast(code)?;
	writeln!(output, "{:#?}", ast).map_err(|e| CompilerError::IoError(e).to_miette_report())
}

/// Parses and elaborates the source code
///
/// Returns the elaboration result together with diagnostics for all
/// problems found in the register description.
pub fn elaborate_source(code: &str, options: ElabOptions) -> miette::Result<(ElabResult, DiagnosticBuffer)> {
	let ast = parse_to_ast(code)?;
	let result = RegisterElaborator::new(options)
		.elaborate(&ast)
		.map_err(|err| CompilerError::ElabError(err).to_miette_report())?;
	let diagnostics = elab_diagnostics(result.report(), code);
	Ok((result, diagnostics))
}

fn emit(render: &mut dyn Render, model: &ElaboratedModel, output: &mut dyn Write) -> miette::Result<()> {
	let text = render
		.render_to_string(model)
		.map_err(|err| CompilerError::RenderError(err).to_miette_report())?;
	write_output(output, &text)
}

/// Writes the serialized (JSON) form of the model
pub fn emit_json(model: &ElaboratedModel, output: &mut dyn Write) -> miette::Result<()> {
	emit(&mut JsonRender::new(), model, output)
}

/// Writes the indented tree listing of the model
pub fn emit_tree(model: &ElaboratedModel, output: &mut dyn Write) -> miette::Result<()> {
	emit(&mut TreeRender::new(), model, output)
}

/// Writes the flat address map table
pub fn emit_address_map(model: &ElaboratedModel, output: &mut dyn Write) -> miette::Result<()> {
	emit(&mut AddressMapRender::new(), model, output)
}

/// Output produced after a successful elaboration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitKind {
	/// Tree listing followed by the address map
	Listing,
	Json,
	AddressMap,
	Tree,
}

/// Elaborates the source and emits the requested output
///
/// Every elaboration diagnostic is printed. Unless `keep_going` is set,
/// any diagnostic makes the whole run fail and nothing is emitted.
pub fn compile(
	code: &str,
	file_name: &str,
	options: ElabOptions,
	emit_kind: EmitKind,
	keep_going: bool,
	output: &mut dyn Write,
) -> miette::Result<()> {
	let (result, diagnostics) = elaborate_source(code, options)?;

	if diagnostics.contains_errors() {
		let count = diagnostics.error_count();
		if !keep_going {
			return diagnostics.print_diagnostics(file_name, code);
		}
		if let Err(last) = diagnostics.print_diagnostics(file_name, code) {
			eprintln!("{:?}", last);
		}
		warn!("Emitting output despite {} elaboration errors", count);
	}

	let model = result.model();
	match emit_kind {
		EmitKind::Listing => {
			emit_tree(model, output)?;
			writeln!(output).map_err(|e| CompilerError::IoError(e).to_miette_report())?;
			emit_address_map(model, output)
		},
		EmitKind::Json => emit_json(model, output),
		EmitKind::AddressMap => emit_address_map(model, output),
		EmitKind::Tree => emit_tree(model, output),
	}
}
