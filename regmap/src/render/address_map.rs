use std::fmt;

use serde::Serialize;

use crate::model::{ElaboratedModel, ElaboratedNode, ModelVisitor};

use super::{Render, RenderError};

/// Single row of the address map summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddressMapEntry {
	pub address: u64,
	pub size: u64,
	pub name: String,
	pub path: String,
}

/// Collects entries, keeping track of the path on the way down
#[derive(Default)]
struct EntryCollector {
	path: Vec<String>,
	entries: Vec<AddressMapEntry>,
}

impl ModelVisitor for EntryCollector {
	fn pre_visit(&mut self, node: &ElaboratedNode, _depth: usize) {
		let name = node.display_name();
		self.path.push(name.clone());
		if node.kind().is_address_bearing() {
			self.entries.push(AddressMapEntry {
				address: node.absolute_address(),
				size: node.size(),
				name,
				path: self.path.join("."),
			});
		}
	}

	fn post_visit(&mut self, _node: &ElaboratedNode, _depth: usize) {
		self.path.pop();
	}
}

/// Flat, document-ordered list of every address-bearing node
pub fn address_map(model: &ElaboratedModel) -> Vec<AddressMapEntry> {
	let mut collector = EntryCollector::default();
	model.traverse(&mut collector);
	collector.entries
}

/// Renders the address map as a table
#[derive(Clone, Debug, Default)]
pub struct AddressMapRender;

impl AddressMapRender {
	pub fn new() -> Self {
		Self
	}
}

impl Render for AddressMapRender {
	fn render(&mut self, w: &mut dyn fmt::Write, model: &ElaboratedModel) -> Result<(), RenderError> {
		writeln!(w, "{:<12}{:<8}{:<20}Path", "Address", "Size", "Name")?;
		writeln!(w, "{}", "-".repeat(60))?;
		for entry in address_map(model) {
			writeln!(
				w,
				"{:<12}{:<8}{:<20}{}",
				format!("{:#010x}", entry.address),
				entry.size,
				entry.name,
				entry.path
			)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::NodeKind;
	use crate::syntax::SourcePos;

	fn sample_model() -> ElaboratedModel {
		let pos = SourcePos::default();
		let mut model = ElaboratedModel::new(ElaboratedNode::new(NodeKind::Addrmap, "top", "top", pos));
		let root = model.root_id();
		for i in 0..2 {
			let mut reg = ElaboratedNode::new(NodeKind::Reg, "regs", "", pos);
			reg.absolute_address = 0x10 * i;
			reg.size = 4;
			reg.array_dimensions = vec![2];
			reg.array_index = vec![i];
			let reg = model.push(Some(root), reg);
			model.push(Some(reg), ElaboratedNode::new(NodeKind::Field, "f", "", pos));
		}
		model
	}

	#[test]
	fn test_entries() {
		let entries = address_map(&sample_model());
		let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
		assert_eq!(paths, vec!["top", "top.regs[0]", "top.regs[1]"]);
		assert_eq!(entries[2].name, "regs[1]");
		assert_eq!(entries[2].address, 0x10);
		assert_eq!(entries[2].size, 4);
	}

	#[test]
	fn test_table() {
		let text = AddressMapRender::new().render_to_string(&sample_model()).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines.len(), 5);
		assert!(lines[0].starts_with("Address"));
		assert_eq!(lines[4], "0x00000010  4       regs[1]             top.regs[1]");
	}
}
