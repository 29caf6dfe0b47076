//! Syntax tree consumed by the elaborator.
//!
//! This is the boundary between a front end and the core. The front end is
//! expected to have resolved all constant expressions already, so every
//! numeric value in here is a plain integer.

use std::fmt;

use crate::model::NodeKind;
use crate::property::PropertyValue;

/// Position in the source code (both 1-based)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
	pub line: u32,
	pub column: u32,
}

impl SourcePos {
	pub fn new(line: u32, column: u32) -> Self {
		Self { line, column }
	}
}

impl fmt::Display for SourcePos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// Top of the syntax tree - a single source file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Root {
	pub items: Vec<BodyItem>,
}

/// Anything that can appear inside a component body (or at the root)
#[derive(Clone, Debug, PartialEq)]
pub enum BodyItem {
	/// Named type definition without instances
	Definition(ComponentDef),

	/// One or more instances of a single type
	Instances(InstanceStmt),

	/// Property assignment applying to the enclosing component
	Property(PropertyAssignment),

	/// `default` assignment applying to nested components
	Default(PropertyAssignment),

	/// `inst->prop = value` assignment
	Dynamic(DynamicAssignment),
}

/// Component type definition (named or anonymous)
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDef {
	pub kind: NodeKind,
	pub name: Option<String>,
	pub items: Vec<BodyItem>,
	pub pos: SourcePos,
}

impl ComponentDef {
	pub fn new(kind: NodeKind, name: Option<&str>, pos: SourcePos) -> Self {
		Self {
			kind,
			name: name.map(String::from),
			items: Vec::new(),
			pos,
		}
	}

	/// Appends a body item (builder style)
	pub fn with_item(mut self, item: BodyItem) -> Self {
		self.items.push(item);
		self
	}

	/// Type-level property assignments in document order
	pub fn properties(&self) -> impl Iterator<Item = &PropertyAssignment> {
		self.items.iter().filter_map(|item| match item {
			BodyItem::Property(p) => Some(p),
			_ => None,
		})
	}
}

/// Reference to the type being instantiated
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRef {
	Named { name: String, pos: SourcePos },
	Anonymous(Box<ComponentDef>),
}

/// Instantiation statement (`reg_t a, b @ 0x10;`)
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceStmt {
	pub type_ref: TypeRef,

	/// Name of the primary register for `alias` instances
	pub alias_of: Option<String>,

	/// `external` / `internal` modifier (`None` if absent)
	pub external: Option<bool>,

	pub instances: Vec<InstanceSpec>,
}

impl InstanceStmt {
	pub fn named(type_name: &str, pos: SourcePos, instances: Vec<InstanceSpec>) -> Self {
		Self {
			type_ref: TypeRef::Named {
				name: type_name.into(),
				pos,
			},
			alias_of: None,
			external: None,
			instances,
		}
	}

	pub fn anonymous(def: ComponentDef, instances: Vec<InstanceSpec>) -> Self {
		Self {
			type_ref: TypeRef::Anonymous(Box::new(def)),
			alias_of: None,
			external: None,
			instances,
		}
	}
}

/// Bracketed suffix of an instance name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArraySuffix {
	/// `[n]` - array dimension (or field width)
	Count(u64),

	/// `[msb:lsb]` - field bit range
	Range(u64, u64),
}

/// Single instance in an instantiation statement
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceSpec {
	pub name: String,
	pub suffixes: Vec<ArraySuffix>,

	/// `= value` (field reset)
	pub reset: Option<i64>,

	/// `@ address`
	pub address: Option<u64>,

	/// `+= stride`
	pub stride: Option<u64>,

	/// `%= alignment`
	pub alignment: Option<u64>,

	pub pos: SourcePos,
}

impl InstanceSpec {
	pub fn new(name: &str, pos: SourcePos) -> Self {
		Self {
			name: name.into(),
			suffixes: Vec::new(),
			reset: None,
			address: None,
			stride: None,
			alignment: None,
			pos,
		}
	}

	pub fn array(mut self, count: u64) -> Self {
		self.suffixes.push(ArraySuffix::Count(count));
		self
	}

	pub fn bits(mut self, msb: u64, lsb: u64) -> Self {
		self.suffixes.push(ArraySuffix::Range(msb, lsb));
		self
	}

	pub fn at(mut self, address: u64) -> Self {
		self.address = Some(address);
		self
	}

	pub fn stride(mut self, stride: u64) -> Self {
		self.stride = Some(stride);
		self
	}

	pub fn align(mut self, alignment: u64) -> Self {
		self.alignment = Some(alignment);
		self
	}

	pub fn reset(mut self, value: i64) -> Self {
		self.reset = Some(value);
		self
	}
}

/// `name = value;`
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyAssignment {
	pub name: String,
	pub value: PropertyValue,
	pub pos: SourcePos,
}

impl PropertyAssignment {
	pub fn new(name: &str, value: PropertyValue, pos: SourcePos) -> Self {
		Self {
			name: name.into(),
			value,
			pos,
		}
	}
}

/// `a.b.c->prop = value;`
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicAssignment {
	pub path: Vec<String>,
	pub property: PropertyAssignment,
}
