use clap::{arg, command, Arg, ArgAction};
use log::{info, LevelFilter};
use miette::Diagnostic;
use rdllang::utils::{compile, parse, read_input_from_file, tokenize, EmitKind};
use regmap::elab::ElabOptions;
use std::fs;
use std::io;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum OutputError {
	#[error("Cannot create output file `{path}`")]
	#[diagnostic(code(rdl::output), help("Check that the directory exists and is writable"))]
	CreateFailed {
		path: String,
		#[source]
		source: io::Error,
	},
}

fn main() -> miette::Result<()> {
	let matches = command!()
		.arg(Arg::new("source").required(true).help("Register description file"))
		.arg(Arg::new("output").short('o').long("output").help("Output file (stdout by default)"))
		.arg(
			arg!(<MODE>)
				.help("Specify which action should be performed")
				.value_parser(["tokenize", "parse", "elaborate", "json", "address-map", "tree"])
				.required(false)
				.short('m')
				.long("mode"),
		)
		.arg(
			Arg::new("top")
				.long("top")
				.help("Name of the addrmap to use as the root of the register map"),
		)
		.arg(
			Arg::new("keep-going")
				.long("keep-going")
				.action(ArgAction::SetTrue)
				.help("Emit output even if the register description has errors"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Enable debug logging"),
		)
		.get_matches();

	let default_level = match matches.get_flag("verbose") {
		true => LevelFilter::Debug,
		false => LevelFilter::Warn,
	};
	env_logger::Builder::new()
		.filter_level(default_level)
		.parse_default_env()
		.init();

	let mode = matches.get_one::<String>("MODE").map(String::as_str).unwrap_or("elaborate");
	let file_name = matches.get_one::<String>("source").cloned().unwrap_or_default();
	let code = read_input_from_file(&file_name)?;

	let mut output: Box<dyn Write> = match matches.get_one::<String>("output") {
		None => Box::new(io::stdout()),
		Some(path) => Box::new(fs::File::create(path).map_err(|source| OutputError::CreateFailed {
			path: path.clone(),
			source,
		})?),
	};

	let mut options = ElabOptions::default();
	if let Some(top) = matches.get_one::<String>("top") {
		options = options.with_top(top);
	}
	let keep_going = matches.get_flag("keep-going");

	info!("Running `{}` on {}", mode, file_name);
	match mode {
		"tokenize" => tokenize(&code, &mut output),
		"parse" => parse(&code, &mut output),
		"json" => compile(&code, &file_name, options, EmitKind::Json, keep_going, &mut output),
		"address-map" => compile(&code, &file_name, options, EmitKind::AddressMap, keep_going, &mut output),
		"tree" => compile(&code, &file_name, options, EmitKind::Tree, keep_going, &mut output),
		_ => compile(&code, &file_name, options, EmitKind::Listing, keep_going, &mut output),
	}
}
