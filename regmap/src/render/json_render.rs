use std::collections::BTreeMap;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::model::{ElaboratedModel, ElaboratedNode, ModelVisitor, NodeKind};
use crate::property::PropertyValue;

use super::{Render, RenderError};

pub const MODEL_FORMAT: &str = "SystemRDL_ElaboratedModel";
pub const MODEL_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDimension {
	pub size: u64,
}

/// Serialized form of a single node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
	pub node_type: NodeKind,
	pub inst_name: String,

	/// Hexadecimal, `0x` prefixed
	pub absolute_address: String,

	pub size: u64,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub array_dimensions: Vec<ArrayDimension>,

	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub properties: BTreeMap<String, PropertyValue>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<SerializedNode>,
}

impl SerializedNode {
	fn new(node: &ElaboratedNode) -> Self {
		Self {
			node_type: node.kind(),
			inst_name: node.inst_name().into(),
			absolute_address: format!("{:#x}", node.absolute_address()),
			size: node.size(),
			array_dimensions: node
				.array_dimensions()
				.iter()
				.map(|size| ArrayDimension { size: *size })
				.collect(),
			properties: node.properties().clone(),
			children: vec![],
		}
	}

	/// Parses the `absolute_address` string back into a number
	pub fn address(&self) -> Option<u64> {
		let digits = self.absolute_address.strip_prefix("0x")?;
		u64::from_str_radix(digits, 16).ok()
	}

	/// Visits this node and all of its descendants in document order
	pub fn walk<'n>(&'n self, f: &mut dyn FnMut(&'n SerializedNode)) {
		f(self);
		for child in &self.children {
			child.walk(f);
		}
	}
}

/// Top-level serialized document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedModel {
	pub format: String,
	pub version: String,
	pub model: Vec<SerializedNode>,
}

impl SerializedModel {
	pub fn from_model(model: &ElaboratedModel) -> Self {
		let mut builder = TreeBuilder::default();
		model.traverse(&mut builder);
		Self {
			format: MODEL_FORMAT.into(),
			version: MODEL_VERSION.into(),
			model: builder.roots,
		}
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Counts serialized nodes of each kind
	pub fn count_by_kind(&self) -> BTreeMap<NodeKind, usize> {
		let mut counts = BTreeMap::new();
		for root in &self.model {
			root.walk(&mut |node| *counts.entry(node.node_type).or_insert(0) += 1);
		}
		counts
	}
}

/// Assembles nested nodes from a flat traversal
#[derive(Default)]
struct TreeBuilder {
	stack: Vec<SerializedNode>,
	roots: Vec<SerializedNode>,
}

impl ModelVisitor for TreeBuilder {
	fn pre_visit(&mut self, node: &ElaboratedNode, _depth: usize) {
		self.stack.push(SerializedNode::new(node));
	}

	fn post_visit(&mut self, _node: &ElaboratedNode, _depth: usize) {
		let Some(done) = self.stack.pop()
		else {
			return;
		};
		match self.stack.last_mut() {
			Some(parent) => parent.children.push(done),
			None => self.roots.push(done),
		}
	}
}

/// Renders the model as pretty-printed JSON
#[derive(Clone, Debug, Default)]
pub struct JsonRender;

impl JsonRender {
	pub fn new() -> Self {
		Self
	}
}

impl Render for JsonRender {
	fn render(&mut self, w: &mut dyn fmt::Write, model: &ElaboratedModel) -> Result<(), RenderError> {
		info!("Rendering JSON model ({} nodes)", model.len());
		let document = SerializedModel::from_model(model);
		let json = serde_json::to_string_pretty(&document)?;
		writeln!(w, "{}", json)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::BitRange;
	use crate::syntax::SourcePos;

	fn sample_model() -> ElaboratedModel {
		let pos = SourcePos::default();
		let mut model = ElaboratedModel::new(ElaboratedNode::new(NodeKind::Addrmap, "top", "top", pos));
		let root = model.root_id();
		let mut reg = ElaboratedNode::new(NodeKind::Reg, "ctrl", "", pos);
		reg.absolute_address = 0x1c;
		reg.size = 4;
		reg.array_dimensions = vec![2];
		reg.array_index = vec![0];
		let reg = model.push(Some(root), reg);
		let mut field = ElaboratedNode::new(NodeKind::Field, "en", "", pos);
		field.bit_range = Some(BitRange::new(0, 0));
		field.properties.insert("sw".into(), PropertyValue::Enum("rw".into()));
		field.properties.insert("desc".into(), "Enable".into());
		model.push(Some(reg), field);
		model
	}

	#[test]
	fn test_node_shape() {
		let json = JsonRender::new().render_to_string(&sample_model()).unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();

		assert_eq!(value["format"], "SystemRDL_ElaboratedModel");
		assert_eq!(value["version"], "1.0");
		let top = &value["model"][0];
		assert_eq!(top["node_type"], "addrmap");
		assert!(top.get("properties").is_none());
		assert!(top.get("array_dimensions").is_none());

		let reg = &top["children"][0];
		assert_eq!(reg["absolute_address"], "0x1c");
		assert_eq!(reg["size"], 4);
		assert_eq!(reg["array_dimensions"][0]["size"], 2);

		let field = &reg["children"][0];
		assert_eq!(field["properties"]["sw"], "rw");
		assert_eq!(field["properties"]["desc"], "Enable");
		assert!(field.get("children").is_none());
	}

	#[test]
	fn test_read_back() {
		let model = sample_model();
		let json = JsonRender::new().render_to_string(&model).unwrap();
		let document = SerializedModel::from_json(&json).unwrap();
		assert_eq!(document.count_by_kind(), model.count_by_kind());
		assert_eq!(document.model[0].children[0].address(), Some(0x1c));
	}
}
