use std::fmt::Display;

use log::debug;
use thiserror::Error;

use crate::model::NodeKind;
use crate::syntax::SourcePos;

/// Append-only collection of elaboration messages
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElabReport {
	messages: Vec<ElabMessage>,
}

impl ElabReport {
	pub fn extend(&mut self, other: &ElabReport) {
		for msg in other.messages.iter() {
			self.add_message(msg.clone());
		}
	}

	pub fn add_message(&mut self, msg: ElabMessage) {
		debug!("Elab message: {}", msg);
		self.messages.push(msg);
	}

	pub fn add(&mut self, kind: ElabMessageKind, pos: SourcePos) {
		self.add_message(ElabMessage::new(kind, pos));
	}

	pub fn messages(&self) -> &[ElabMessage] {
		&self.messages
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	/// Counts messages matching the predicate
	pub fn count(&self, pred: impl Fn(&ElabMessageKind) -> bool) -> usize {
		self.messages.iter().filter(|m| pred(m.kind())).count()
	}
}

/// Single elaboration error together with its source position
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElabMessage {
	kind: ElabMessageKind,
	pos: SourcePos,
}

impl ElabMessage {
	pub fn new(kind: ElabMessageKind, pos: SourcePos) -> Self {
		Self { kind, pos }
	}

	pub fn kind(&self) -> &ElabMessageKind {
		&self.kind
	}

	pub fn pos(&self) -> SourcePos {
		self.pos
	}

	pub fn line(&self) -> u32 {
		self.pos.line
	}

	pub fn column(&self) -> u32 {
		self.pos.column
	}

	pub fn message(&self) -> String {
		self.kind.to_string()
	}
}

impl Display for ElabMessage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.pos, self.kind)
	}
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum ElabMessageKind {
	#[error("Unknown component type `{name}`")]
	UnknownType { name: String },

	#[error("Component type `{name}` is already defined in this scope")]
	DuplicateDefinition { name: String },

	#[error("Unknown property `{name}`")]
	UnknownProperty { name: String },

	#[error("Instance `{name}` at offset {address:#x} overlaps `{other}`")]
	AddressOverlap { name: String, other: String, address: u64 },

	#[error("Field `{field}` has invalid bit range [{msb}:{lsb}] for a {regwidth}-bit register")]
	InvalidBitRange {
		field: String,
		msb: u64,
		lsb: u64,
		regwidth: u64,
	},

	#[error("Register width {width} is not a whole number of bytes")]
	InvalidRegWidth { width: i64 },

	#[error("Field `{field}` overlaps field `{other}`")]
	FieldOverlap { field: String, other: String },

	#[error("`{child}` cannot be instantiated inside `{parent}`")]
	InvalidNesting { child: NodeKind, parent: NodeKind },

	#[error("Invalid array dimensions of `{name}`")]
	InvalidArrayDimension { name: String },

	#[error("Memory `{name}` does not specify a valid `mementries`")]
	MissingMemEntries { name: String },

	#[error("No instance named `{name}` in this scope")]
	UnknownInstance { name: String },

	#[error("Component type `{name}` instantiates itself")]
	RecursiveInstantiation { name: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_report_is_append_only() {
		let mut report = ElabReport::default();
		report.add(ElabMessageKind::UnknownType { name: "foo".into() }, SourcePos::new(3, 7));
		report.add(ElabMessageKind::UnknownType { name: "foo".into() }, SourcePos::new(3, 7));

		let mut other = ElabReport::default();
		other.extend(&report);
		assert_eq!(other.len(), 2);
		assert_eq!(other.messages()[0].line(), 3);
		assert_eq!(other.messages()[0].column(), 7);
		assert_eq!(other.count(|k| matches!(k, ElabMessageKind::UnknownType { .. })), 2);
	}

	#[test]
	fn test_message_format() {
		let msg = ElabMessage::new(
			ElabMessageKind::AddressOverlap {
				name: "b".into(),
				other: "a".into(),
				address: 0x10,
			},
			SourcePos::new(12, 3),
		);
		assert_eq!(msg.to_string(), "12:3: Instance `b` at offset 0x10 overlaps `a`");
		assert_eq!(msg.message(), "Instance `b` at offset 0x10 overlaps `a`");
	}
}
