use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::model::NodeKind;

/// Value of a component property
///
/// Values are stored exactly as provided by the front end - no type checking
/// against the property definition is performed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
	String(String),
	Integer(i64),
	Boolean(bool),

	/// Enumerated value carried by name (e.g. `rw`, `woclr`)
	Enum(String),
}

impl PropertyValue {
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			PropertyValue::Integer(v) => Some(*v),
			PropertyValue::Boolean(v) => Some(*v as i64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			PropertyValue::Boolean(v) => Some(*v),
			PropertyValue::Integer(v) => Some(*v != 0),
			_ => None,
		}
	}

	/// Returns the name of an enumerated value
	pub fn as_enum(&self) -> Option<&str> {
		match self {
			PropertyValue::Enum(name) => Some(name),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropertyValue::String(s) => Some(s),
			_ => None,
		}
	}
}

impl fmt::Display for PropertyValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PropertyValue::String(s) => write!(f, "\"{}\"", s.escape_default()),
			PropertyValue::Integer(v) => write!(f, "{}", v),
			PropertyValue::Boolean(v) => write!(f, "{}", v),
			PropertyValue::Enum(name) => write!(f, "{}", name),
		}
	}
}

impl From<i64> for PropertyValue {
	fn from(v: i64) -> Self {
		PropertyValue::Integer(v)
	}
}

impl From<bool> for PropertyValue {
	fn from(v: bool) -> Self {
		PropertyValue::Boolean(v)
	}
}

impl From<&str> for PropertyValue {
	fn from(s: &str) -> Self {
		PropertyValue::String(s.into())
	}
}

/// Names of properties computed by the elaborator itself
pub const DERIVED_PROPERTIES: &[&str] = &["lsb", "msb", "fieldwidth"];

use NodeKind::*;

const ALL_KINDS: &[NodeKind] = &[Addrmap, Regfile, Reg, Field, Mem];

const GENERAL_PROPERTIES: &[&str] = &["name", "desc", "ispresent", "donttest", "dontcompare", "external"];

const FIELD_PROPERTIES: &[&str] = &[
	"sw", "hw", "reset", "resetsignal", "rclr", "rset", "onread", "woclr", "woset", "onwrite", "swwe", "swwel", "we",
	"wel", "anded", "ored", "xored", "fieldwidth", "hwclr", "hwset", "hwenable", "hwmask", "counter", "incrvalue",
	"incrwidth", "decrvalue", "decrwidth", "incr", "decr", "saturate", "threshold", "incrsaturate",
	"incrthreshold", "decrsaturate", "decrthreshold", "overflow", "underflow", "intr", "enable", "mask",
	"haltenable", "haltmask", "sticky", "stickybit", "singlepulse", "encode", "precedence", "paritycheck", "swacc",
	"swmod", "next",
];

const REG_PROPERTIES: &[&str] = &["regwidth", "accesswidth", "errextbus", "intr", "shared"];

const REGFILE_PROPERTIES: &[&str] = &["alignment", "sharedextbus", "errextbus"];

const ADDRMAP_PROPERTIES: &[&str] = &[
	"alignment",
	"sharedextbus",
	"errextbus",
	"bigendian",
	"littleendian",
	"addressing",
	"rsvdset",
	"rsvdsetX",
	"msb0",
	"lsb0",
	"bridge",
];

const MEM_PROPERTIES: &[&str] = &["mementries", "memwidth", "sw"];

lazy_static! {
	/// Built-in properties and the component kinds they apply to
	static ref BUILTIN_PROPERTIES: HashMap<&'static str, Vec<NodeKind>> = {
		let mut table: HashMap<&'static str, Vec<NodeKind>> = HashMap::new();
		let mut add = |names: &[&'static str], kinds: &[NodeKind]| {
			for name in names {
				let entry = table.entry(*name).or_default();
				for kind in kinds {
					if !entry.contains(kind) {
						entry.push(*kind);
					}
				}
			}
		};

		add(GENERAL_PROPERTIES, ALL_KINDS);
		add(FIELD_PROPERTIES, &[Field]);
		add(REG_PROPERTIES, &[Reg]);
		add(REGFILE_PROPERTIES, &[Regfile]);
		add(ADDRMAP_PROPERTIES, &[Addrmap]);
		add(MEM_PROPERTIES, &[Mem]);
		add(&["lsb", "msb"], &[Field]);
		table
	};
}

/// Checks whether the property is part of the built-in set
pub fn is_builtin_property(name: &str) -> bool {
	BUILTIN_PROPERTIES.contains_key(name)
}

/// Checks whether a built-in property applies to the given component kind
pub fn property_applies_to(name: &str, kind: NodeKind) -> bool {
	BUILTIN_PROPERTIES
		.get(name)
		.map(|kinds| kinds.contains(&kind))
		.unwrap_or(false)
}
