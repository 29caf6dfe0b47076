use rdllang::utils::{compile, EmitKind};
use regmap::elab::ElabOptions;
use rstest::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn run_rdl(input_path: &Path, emit_kind: EmitKind) -> miette::Result<NamedTempFile> {
	let src = std::fs::read_to_string(input_path).expect("failed to read source code");
	let file_name = input_path
		.file_name()
		.and_then(|name| name.to_str())
		.expect("filename needed");
	let mut tmpfile = NamedTempFile::new().unwrap();
	compile(&src, file_name, ElabOptions::default(), emit_kind, false, &mut tmpfile)?;
	Ok(tmpfile)
}

fn read_output(file: &NamedTempFile) -> String {
	let mut text = String::new();
	file.reopen().unwrap().read_to_string(&mut text).unwrap();
	text
}

#[rstest]
fn test_compile_success(#[files("tests/input/*.rdl")] path: PathBuf) {
	let listing = run_rdl(&path, EmitKind::Listing).unwrap();
	assert!(read_output(&listing).starts_with("addrmap: "));

	let json = run_rdl(&path, EmitKind::Json).unwrap();
	let value: serde_json::Value = serde_json::from_str(&read_output(&json)).unwrap();
	assert_eq!(value["format"], "SystemRDL_ElaboratedModel");
	assert_eq!(value["model"][0]["node_type"], "addrmap");
	assert_eq!(value["model"][0]["absolute_address"], "0x0");
}

#[rstest]
fn test_compile_failure(#[files("tests/input_invalid/*.rdl")] path: PathBuf) {
	assert!(run_rdl(&path, EmitKind::Listing).is_err());
}

#[rstest]
fn test_elab_failure(#[files("tests/input_elab_invalid/*.rdl")] path: PathBuf) {
	let src = std::fs::read_to_string(&path).unwrap();
	assert!(run_rdl(&path, EmitKind::Listing).is_err());

	// The same file still yields a model when errors are tolerated
	let mut tmpfile = NamedTempFile::new().unwrap();
	compile(&src, "keep_going.rdl", ElabOptions::default(), EmitKind::AddressMap, true, &mut tmpfile).unwrap();
	assert!(read_output(&tmpfile).starts_with("Address"));
}

#[test]
fn test_uart_address_map() {
	let output = run_rdl(Path::new("tests/input/uart.rdl"), EmitKind::AddressMap).unwrap();
	let text = read_output(&output);
	let rows: Vec<(&str, &str)> = text
		.lines()
		.skip(2)
		.filter_map(|line| {
			let mut columns = line.split_whitespace();
			let address = columns.next()?;
			Some((address, columns.last()?))
		})
		.collect();
	assert_eq!(
		rows,
		vec![
			("0x00000000", "uart"),
			("0x00000000", "uart.data"),
			("0x00000004", "uart.status"),
			("0x00000004", "uart.status_clear"),
			("0x00000010", "uart.baud"),
			("0x00000100", "uart.fifo"),
		]
	);
}

#[test]
fn test_top_option() {
	let src = std::fs::read_to_string("tests/input/two_maps.rdl").unwrap();
	let mut output = NamedTempFile::new().unwrap();
	compile(&src, "two_maps.rdl", ElabOptions::default().with_top("dma"), EmitKind::Tree, false, &mut output).unwrap();
	assert!(read_output(&output).starts_with("addrmap: dma @ 0x0"));

	let mut output = NamedTempFile::new().unwrap();
	let err = compile(&src, "two_maps.rdl", ElabOptions::default().with_top("nope"), EmitKind::Tree, false, &mut output);
	assert!(err.is_err());
}
