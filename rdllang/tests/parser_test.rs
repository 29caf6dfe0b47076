use rdllang::parser::{parse_source, ParserErrorKind};
use regmap::syntax::*;
use regmap::{NodeKind, PropertyValue};

fn parse(source: &str) -> Root {
	parse_source(source).expect("parsing failed")
}

fn only_instances(item: &BodyItem) -> &InstanceStmt {
	match item {
		BodyItem::Instances(stmt) => stmt,
		other => panic!("expected instances, got {:?}", other),
	}
}

fn definition(item: &BodyItem) -> &ComponentDef {
	match item {
		BodyItem::Definition(def) => def,
		other => panic!("expected a definition, got {:?}", other),
	}
}

#[test]
fn named_definition() {
	let root = parse("reg ctrl_t { regwidth = 16; field {} en[0:0]; };");
	assert_eq!(root.items.len(), 1);

	let def = definition(&root.items[0]);
	assert_eq!(def.kind, NodeKind::Reg);
	assert_eq!(def.name.as_deref(), Some("ctrl_t"));
	assert_eq!(def.pos, SourcePos::new(1, 1));

	let props: Vec<_> = def.properties().collect();
	assert_eq!(props[0].name, "regwidth");
	assert_eq!(props[0].value, PropertyValue::Integer(16));

	let field = only_instances(&def.items[1]);
	assert!(matches!(&field.type_ref, TypeRef::Anonymous(d) if d.kind == NodeKind::Field && d.name.is_none()));
	assert_eq!(field.instances[0].suffixes, vec![ArraySuffix::Range(0, 0)]);
}

#[test]
fn anonymous_definition_with_instances() {
	let root = parse("addrmap top { external reg { field {} f; } a @ 0x10, b[4] += 0x8 %= 0x40; };");
	let top = definition(&root.items[0]);
	let stmt = only_instances(&top.items[0]);

	assert_eq!(stmt.external, Some(true));
	assert_eq!(stmt.instances.len(), 2);
	assert_eq!(stmt.instances[0].name, "a");
	assert_eq!(stmt.instances[0].address, Some(0x10));
	assert_eq!(stmt.instances[1].suffixes, vec![ArraySuffix::Count(4)]);
	assert_eq!(stmt.instances[1].stride, Some(8));
	assert_eq!(stmt.instances[1].alignment, Some(0x40));
	assert_eq!(stmt.instances[1].pos, SourcePos::new(1, 54));
}

#[test]
fn named_definition_with_instance() {
	let root = parse("addrmap top { regfile rf_t { } rf; rf_t rf2; };");
	let top = definition(&root.items[0]);
	let stmt = only_instances(&top.items[0]);
	assert!(matches!(&stmt.type_ref, TypeRef::Anonymous(d) if d.name.as_deref() == Some("rf_t")));

	let stmt = only_instances(&top.items[1]);
	assert!(matches!(&stmt.type_ref, TypeRef::Named { name, .. } if name == "rf_t"));
}

#[test]
fn property_values() {
	let root = parse(
		r#"field f_t {
			sw = r;
			woclr;
			desc = "Status \"flag\"";
			reset = 2 * (3 + 1);
			hwclr = false;
			incrvalue = -1;
		};"#,
	);
	let def = definition(&root.items[0]);
	let values: Vec<(&str, &PropertyValue)> = def.properties().map(|p| (p.name.as_str(), &p.value)).collect();
	assert_eq!(
		values,
		vec![
			("sw", &PropertyValue::Enum("r".into())),
			("woclr", &PropertyValue::Boolean(true)),
			("desc", &PropertyValue::String("Status \"flag\"".into())),
			("reset", &PropertyValue::Integer(8)),
			("hwclr", &PropertyValue::Boolean(false)),
			("incrvalue", &PropertyValue::Integer(-1)),
		]
	);
	assert_eq!(def.properties().nth(1).map(|p| p.pos), Some(SourcePos::new(3, 4)));
}

#[test]
fn defaults_and_dynamic_assignments() {
	let root = parse("addrmap top { default regwidth = 64; ctrl_t c; c.en->reset = 1; c->desc = \"x\"; };");
	let top = definition(&root.items[0]);

	assert!(matches!(&top.items[0], BodyItem::Default(p) if p.name == "regwidth"));
	match &top.items[2] {
		BodyItem::Dynamic(dynamic) => {
			assert_eq!(dynamic.path, vec!["c".to_string(), "en".to_string()]);
			assert_eq!(dynamic.property.name, "reset");
			assert_eq!(dynamic.property.value, PropertyValue::Integer(1));
		},
		other => panic!("expected a dynamic assignment, got {:?}", other),
	}
	assert!(matches!(&top.items[3], BodyItem::Dynamic(d) if d.path == vec!["c".to_string()]));
}

#[test]
fn alias_and_field_reset() {
	let root = parse("reg r_t { field {} a[3:0] = 0xa, b[2] = 1 @ 8; }; addrmap m { r_t r0; alias r0 r_t r0_alias; };");
	let reg = definition(&root.items[0]);
	let fields = only_instances(&reg.items[0]);
	assert_eq!(fields.instances[0].reset, Some(0xa));
	assert_eq!(fields.instances[1].reset, Some(1));
	assert_eq!(fields.instances[1].address, Some(8));

	let map = definition(&root.items[1]);
	let alias = only_instances(&map.items[1]);
	assert_eq!(alias.alias_of.as_deref(), Some("r0"));
	assert_eq!(alias.instances[0].name, "r0_alias");
}

#[test]
fn verilog_constants() {
	let root = parse("reg r_t { regwidth = 8'd32; field {} f[4'h7:'b0]; };");
	let reg = definition(&root.items[0]);
	assert_eq!(reg.properties().next().map(|p| &p.value), Some(&PropertyValue::Integer(32)));
	let fields = only_instances(&reg.items[1]);
	assert_eq!(fields.instances[0].suffixes, vec![ArraySuffix::Range(7, 0)]);
}

#[test]
fn syntax_errors() {
	let err = parse_source("addrmap top { reg r }").unwrap_err();
	assert!(matches!(err.kind, ParserErrorKind::UnexpectedToken { .. }));

	let err = parse_source("addrmap top {").unwrap_err();
	assert!(matches!(err.kind, ParserErrorKind::UnexpectedEof { .. }));

	let err = parse_source("reg { field {} f; };").unwrap_err();
	assert_eq!(err.kind, ParserErrorKind::UnexpectedToken { expected: "instance name".into() });

	let err = parse_source("enum e { a; };").unwrap_err();
	assert!(matches!(err.kind, ParserErrorKind::UnexpectedToken { .. }));

	let err = parse_source("reg r_t { field {} f[4 / 0]; };").unwrap_err();
	assert_eq!(err.kind, ParserErrorKind::DivisionByZero);

	let err = parse_source("addrmap m { r_t r @ -4; };").unwrap_err();
	assert_eq!(err.kind, ParserErrorKind::ValueOutOfRange);

	let err = parse_source("reg r_t { /* broken").unwrap_err();
	assert!(matches!(err.kind, ParserErrorKind::LexerError(_)));
}

#[test]
fn reset_values_must_fit_property_range() {
	let root = parse("reg r_t { field {} f[63:0] = 0x7fffffffffffffff; };");
	let fields = only_instances(&definition(&root.items[0]).items[0]);
	assert_eq!(fields.instances[0].reset, Some(i64::MAX));

	for source in [
		"reg r_t { field {} f[63:0] = 0xffffffffffffffff; };",
		"reg r_t { field { reset = 0xffffffffffffffff; } f[63:0]; };",
	] {
		let err = parse_source(source).unwrap_err();
		assert_eq!(err.kind, ParserErrorKind::ValueOutOfRange, "{}", source);
	}
}
