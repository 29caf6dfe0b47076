mod traverse;

pub use traverse::ModelVisitor;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::property::PropertyValue;
use crate::syntax::SourcePos;

/// Kind of a component (closed set)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	Addrmap,
	Regfile,
	Reg,
	Field,
	Mem,
}

impl NodeKind {
	/// Keyword used for this component kind
	pub fn keyword(&self) -> &'static str {
		match self {
			NodeKind::Addrmap => "addrmap",
			NodeKind::Regfile => "regfile",
			NodeKind::Reg => "reg",
			NodeKind::Field => "field",
			NodeKind::Mem => "mem",
		}
	}

	/// Whether the component occupies byte address space
	pub fn is_address_bearing(&self) -> bool {
		!matches!(self, NodeKind::Field)
	}

	/// Whether a component of this kind may be instantiated inside `self`
	pub fn can_contain(&self, child: NodeKind) -> bool {
		use NodeKind::*;
		match self {
			Addrmap => matches!(child, Addrmap | Regfile | Reg | Mem),
			Regfile => matches!(child, Regfile | Reg),
			Reg => matches!(child, Field),
			Field | Mem => false,
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.keyword())
	}
}

/// References a node in an elaborated model
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct NodeId {
	id: usize,
}

impl NodeId {
	pub(crate) fn new(id: usize) -> Self {
		Self { id }
	}

	/// Position of the node in the model arena
	pub fn index(&self) -> usize {
		self.id
	}
}

/// Bit range of a field within its register
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitRange {
	pub lsb: u64,
	pub msb: u64,
}

impl BitRange {
	pub fn new(msb: u64, lsb: u64) -> Self {
		Self { lsb, msb }
	}

	/// Number of bits (0 for inverted ranges)
	pub fn width(&self) -> u64 {
		if self.msb >= self.lsb {
			self.msb - self.lsb + 1
		}
		else {
			0
		}
	}

	pub fn is_inverted(&self) -> bool {
		self.lsb > self.msb
	}

	pub fn overlaps(&self, other: &BitRange) -> bool {
		self.lsb <= other.msb && other.lsb <= self.msb
	}
}

impl fmt::Display for BitRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}:{}]", self.msb, self.lsb)
	}
}

/// Single instantiated component
#[derive(Clone, Debug, PartialEq)]
pub struct ElaboratedNode {
	pub(crate) id: NodeId,
	pub(crate) parent: Option<NodeId>,
	pub(crate) kind: NodeKind,
	pub(crate) inst_name: String,
	pub(crate) type_name: String,
	pub(crate) absolute_address: u64,
	pub(crate) size: u64,
	pub(crate) bit_range: Option<BitRange>,
	pub(crate) array_dimensions: Vec<u64>,
	pub(crate) array_index: Vec<u64>,
	pub(crate) properties: BTreeMap<String, PropertyValue>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) pos: SourcePos,
}

impl ElaboratedNode {
	pub(crate) fn new(kind: NodeKind, inst_name: &str, type_name: &str, pos: SourcePos) -> Self {
		Self {
			id: NodeId::new(0),
			parent: None,
			kind,
			inst_name: inst_name.into(),
			type_name: type_name.into(),
			absolute_address: 0,
			size: 0,
			bit_range: None,
			array_dimensions: vec![],
			array_index: vec![],
			properties: BTreeMap::new(),
			children: vec![],
			pos,
		}
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	pub fn kind(&self) -> NodeKind {
		self.kind
	}

	pub fn inst_name(&self) -> &str {
		&self.inst_name
	}

	/// Name of the instantiated type (empty for anonymous types)
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn absolute_address(&self) -> u64 {
		self.absolute_address
	}

	/// Size in bytes (0 for fields)
	pub fn size(&self) -> u64 {
		self.size
	}

	/// End of the occupied byte range (exclusive)
	pub fn end_address(&self) -> u64 {
		self.absolute_address.saturating_add(self.size)
	}

	/// Bit range within the parent register (fields only)
	pub fn bit_range(&self) -> Option<BitRange> {
		self.bit_range
	}

	pub fn array_dimensions(&self) -> &[u64] {
		&self.array_dimensions
	}

	/// Multi-index of this element within its array (empty if not an array)
	pub fn array_index(&self) -> &[u64] {
		&self.array_index
	}

	pub fn is_array_element(&self) -> bool {
		!self.array_dimensions.is_empty()
	}

	pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
		&self.properties
	}

	pub fn property(&self, name: &str) -> Option<&PropertyValue> {
		self.properties.get(name)
	}

	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Position of the instantiation in the source
	pub fn pos(&self) -> SourcePos {
		self.pos
	}

	/// Instance name with array index suffix (`regs[1][2]`)
	pub fn display_name(&self) -> String {
		let mut name = self.inst_name.clone();
		for index in &self.array_index {
			name.push_str(&format!("[{}]", index));
		}
		name
	}
}

/// Fully elaborated register map
///
/// Nodes live in an arena and refer to each other by `NodeId`.
/// The model is never modified after elaboration completes.
#[derive(Clone, Debug, PartialEq)]
pub struct ElaboratedModel {
	nodes: Vec<ElaboratedNode>,
	root: NodeId,
}

impl ElaboratedModel {
	/// Creates a model containing only the root node
	pub(crate) fn new(root: ElaboratedNode) -> Self {
		let mut model = Self {
			nodes: vec![],
			root: NodeId::new(0),
		};
		model.root = model.push(None, root);
		model
	}

	/// Adds a node to the arena and links it with its parent
	pub(crate) fn push(&mut self, parent: Option<NodeId>, mut node: ElaboratedNode) -> NodeId {
		let id = NodeId::new(self.nodes.len());
		node.id = id;
		node.parent = parent;
		self.nodes.push(node);
		if let Some(parent) = parent {
			self.nodes[parent.id].children.push(id);
		}
		id
	}

	pub(crate) fn node_ref(&self, id: NodeId) -> &ElaboratedNode {
		&self.nodes[id.id]
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ElaboratedNode {
		&mut self.nodes[id.id]
	}

	/// Moves every node in the arena range by `delta` bytes
	pub(crate) fn shift_range(&mut self, range: Range<usize>, delta: u64) {
		for node in &mut self.nodes[range] {
			node.absolute_address = node.absolute_address.saturating_add(delta);
		}
	}

	/// Appends a copy of a contiguous subtree and links it to the parent of the original
	///
	/// `range` must start at the subtree root and cover all of its descendants.
	pub(crate) fn copy_subtree(&mut self, range: Range<usize>) -> NodeId {
		let offset = self.nodes.len() - range.start;
		let remap = |id: NodeId| NodeId::new(id.id + offset);

		for index in range.clone() {
			let mut node = self.nodes[index].clone();
			node.id = remap(node.id);
			node.children = node.children.iter().copied().map(remap).collect();
			if index != range.start {
				node.parent = node.parent.map(remap);
			}
			self.nodes.push(node);
		}

		let copy = remap(NodeId::new(range.start));
		if let Some(parent) = self.nodes[copy.id].parent {
			self.nodes[parent.id].children.push(copy);
		}
		copy
	}

	pub fn root_id(&self) -> NodeId {
		self.root
	}

	pub fn root(&self) -> &ElaboratedNode {
		&self.nodes[self.root.id]
	}

	pub fn node(&self, id: NodeId) -> Option<&ElaboratedNode> {
		self.nodes.get(id.id)
	}

	pub fn parent(&self, id: NodeId) -> Option<&ElaboratedNode> {
		self.node(id)?.parent.and_then(|p| self.node(p))
	}

	/// Iterates over children of a node in document order
	pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ElaboratedNode> {
		self.node(id)
			.map(|n| n.children.as_slice())
			.unwrap_or(&[])
			.iter()
			.map(move |c| &self.nodes[c.id])
	}

	/// Number of nodes in the model
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Iterates over all nodes in creation (pre-order) order
	pub fn nodes(&self) -> impl Iterator<Item = &ElaboratedNode> {
		self.nodes.iter()
	}

	/// Hierarchical, dot-separated path of a node (`top.block.regs[2].en`)
	pub fn path(&self, id: NodeId) -> String {
		let mut segments = vec![];
		let mut current = self.node(id);
		while let Some(node) = current {
			segments.push(node.display_name());
			current = node.parent.and_then(|p| self.node(p));
		}
		segments.reverse();
		segments.join(".")
	}

	/// Counts nodes of each kind
	pub fn count_by_kind(&self) -> BTreeMap<NodeKind, usize> {
		let mut counts = BTreeMap::new();
		for node in &self.nodes {
			*counts.entry(node.kind).or_insert(0) += 1;
		}
		counts
	}

	/// Finds a node by its hierarchical path
	pub fn find(&self, path: &str) -> Option<&ElaboratedNode> {
		self.nodes.iter().find(|n| self.path(n.id) == path)
	}
}
