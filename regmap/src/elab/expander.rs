use std::collections::HashSet;
use std::ptr;

use itertools::Itertools;
use log::{debug, trace};

use crate::model::{BitRange, ElaboratedModel, ElaboratedNode, NodeId, NodeKind};
use crate::property::PropertyValue;
use crate::syntax::{
	ArraySuffix, BodyItem, ComponentDef, InstanceSpec, InstanceStmt, PropertyAssignment, Root, SourcePos, TypeRef,
};

use super::address_alloc::{AddressAllocator, AddressingMode, PlacementRequest};
use super::property_resolver::{PropertyMap, PropertyResolver};
use super::registry::{ScopeId, TypeRegistry};
use super::report::{ElabMessage, ElabMessageKind, ElabReport};
use super::{ElabError, ElabOptions};

/// Dynamic assignment on its way down to the instance it targets
///
/// `path` is relative to the body currently being expanded.
#[derive(Clone, Copy, Debug)]
struct PendingAssignment<'a> {
	path: &'a [String],
	property: &'a PropertyAssignment,
}

fn dynamic_assignments(items: &[BodyItem]) -> impl Iterator<Item = PendingAssignment<'_>> {
	items.iter().filter_map(|item| match item {
		BodyItem::Dynamic(dynamic) => Some(PendingAssignment {
			path: &dynamic.path,
			property: &dynamic.property,
		}),
		_ => None,
	})
}

fn find_instance<'a>(items: &'a [BodyItem], name: &str) -> Option<&'a InstanceStmt> {
	items.iter().find_map(|item| match item {
		BodyItem::Instances(stmt) if stmt.instances.iter().any(|spec| spec.name == name) => Some(stmt),
		_ => None,
	})
}

/// Names of types instantiated anywhere inside the given bodies
fn collect_references<'a>(items: &'a [BodyItem], names: &mut HashSet<&'a str>) {
	for item in items {
		match item {
			BodyItem::Definition(def) => collect_references(&def.items, names),
			BodyItem::Instances(stmt) => match &stmt.type_ref {
				TypeRef::Named { name, .. } => {
					names.insert(name);
				},
				TypeRef::Anonymous(def) => collect_references(&def.items, names),
			},
			_ => {},
		}
	}
}

fn sw_access(node: &ElaboratedNode) -> Option<&str> {
	node.property("sw").and_then(|v| v.as_enum().or(v.as_str()))
}

/// Read-only and write-only fields may share bits
fn is_access_split(a: Option<&str>, b: Option<&str>) -> bool {
	matches!((a, b), (Some("r"), Some("w")) | (Some("w"), Some("r")))
}

struct TopSelection<'a> {
	def: &'a ComponentDef,
	inst_name: String,
	stmt: Option<&'a InstanceStmt>,
	pos: SourcePos,
}

/// Bit position requested by a field instance
enum FieldShape {
	Bits { msb: u64, lsb: u64 },
	Width(u64),
	Implicit,
}

/// Builds the elaborated model in a single depth-first walk
///
/// Every node is built with its subtree at a provisional address of 0.
/// Once the node is placed by the allocator of its container, the whole
/// subtree (which is contiguous in the arena) is shifted to its final
/// address. Array elements are copies of the first element's subtree.
pub(crate) struct InstanceExpander<'a> {
	registry: &'a TypeRegistry<'a>,
	options: &'a ElabOptions,
	report: &'a mut ElabReport,
	resolver: PropertyResolver<'a>,

	/// Messages already emitted (a type expanded in many places reports its problems once)
	reported: HashSet<ElabMessage>,

	/// Types currently being expanded
	type_stack: Vec<&'a ComponentDef>,

	/// Number of copies the node being built will end up with (product of enclosing array sizes)
	replication: u64,
}

impl<'a> InstanceExpander<'a> {
	pub fn new(registry: &'a TypeRegistry<'a>, options: &'a ElabOptions, report: &'a mut ElabReport) -> Self {
		Self {
			registry,
			options,
			report,
			resolver: PropertyResolver::new(registry, options),
			reported: HashSet::new(),
			type_stack: vec![],
			replication: 1,
		}
	}

	pub fn expand(&mut self, root: &'a Root) -> Result<ElaboratedModel, ElabError> {
		let top = self.select_top(root)?;
		debug!("Root addrmap is `{}`", top.inst_name);

		let scope = self.registry.root_scope();
		self.check_dynamic_paths(&root.items, scope);

		let type_name = top.def.name.as_deref().unwrap_or("");
		let mut model = ElaboratedModel::new(ElaboratedNode::new(
			NodeKind::Addrmap,
			&top.inst_name,
			type_name,
			top.pos,
		));

		let root_dynamics: Vec<_> = dynamic_assignments(&root.items).collect();
		let (overrides, pending) =
			self.instance_overrides(top.stmt, None, &top.inst_name, top.pos, &root_dynamics, &[]);
		let root_id = model.root_id();
		self.build_node(&mut model, root_id, top.def, &overrides, &pending);
		Ok(model)
	}

	fn error(&mut self, kind: ElabMessageKind, pos: SourcePos) {
		let msg = ElabMessage::new(kind, pos);
		if self.reported.insert(msg.clone()) {
			self.report.add_message(msg);
		}
	}

	fn scope_of(&self, def: &ComponentDef) -> ScopeId {
		self.registry
			.body_scope(def)
			.unwrap_or_else(|| self.registry.root_scope())
	}

	fn resolve_type(&mut self, type_ref: &'a TypeRef, scope: ScopeId) -> Option<&'a ComponentDef> {
		match type_ref {
			TypeRef::Named { name, pos } => match self.registry.resolve(name, scope) {
				Ok(def) => Some(def),
				Err(err) => {
					self.error(err.to_message_kind(), *pos);
					None
				},
			},
			TypeRef::Anonymous(def) => Some(&**def),
		}
	}

	fn select_top(&mut self, root: &'a Root) -> Result<TopSelection<'a>, ElabError> {
		let scope = self.registry.root_scope();

		let mut instantiated = None;
		for item in &root.items {
			let BodyItem::Instances(stmt) = item
			else {
				continue;
			};
			let Some(def) = self.resolve_type(&stmt.type_ref, scope)
			else {
				continue;
			};

			for spec in &stmt.instances {
				if def.kind == NodeKind::Addrmap {
					instantiated = Some(TopSelection {
						def,
						inst_name: spec.name.clone(),
						stmt: Some(stmt),
						pos: spec.pos,
					});
				}
				else {
					self.error(
						ElabMessageKind::InvalidNesting {
							child: def.kind,
							parent: NodeKind::Addrmap,
						},
						spec.pos,
					);
				}
			}
		}

		if let Some(top) = &self.options.top {
			let def = self
				.registry
				.resolve(top, scope)
				.map_err(|_| ElabError::TopNotFound(top.clone()))?;
			if def.kind != NodeKind::Addrmap {
				return Err(ElabError::TopNotAddrmap(top.clone()));
			}
			return Ok(TopSelection {
				def,
				inst_name: top.clone(),
				stmt: None,
				pos: def.pos,
			});
		}

		if let Some(top) = instantiated {
			return Ok(top);
		}

		let mut referenced = HashSet::new();
		for item in &root.items {
			if let BodyItem::Definition(def) = item {
				collect_references(&def.items, &mut referenced);
			}
		}

		root.items
			.iter()
			.rev()
			.filter_map(|item| match item {
				BodyItem::Definition(def) if def.kind == NodeKind::Addrmap => {
					def.name.as_deref().map(|name| (name, def))
				},
				_ => None,
			})
			.find(|(name, _)| !referenced.contains(name))
			.map(|(name, def)| TopSelection {
				def,
				inst_name: name.into(),
				stmt: None,
				pos: def.pos,
			})
			.ok_or(ElabError::NoRootAddrmap)
	}

	/// Instantiation-site assignments for an instance and the dynamic
	/// assignments which target its descendants
	///
	/// Assignments from enclosing bodies come last, so they take precedence.
	fn instance_overrides(
		&self,
		stmt: Option<&InstanceStmt>,
		reset: Option<i64>,
		name: &str,
		pos: SourcePos,
		local: &[PendingAssignment<'a>],
		inherited: &[PendingAssignment<'a>],
	) -> (Vec<PropertyAssignment>, Vec<PendingAssignment<'a>>) {
		let mut overrides = vec![];
		if let Some(external) = stmt.and_then(|s| s.external) {
			overrides.push(PropertyAssignment::new("external", external.into(), pos));
		}
		if let Some(reset) = reset {
			overrides.push(PropertyAssignment::new("reset", PropertyValue::Integer(reset), pos));
		}

		let mut pending = vec![];
		for assignment in local.iter().chain(inherited.iter()) {
			match assignment.path.split_first() {
				Some((first, rest)) if first == name => {
					if rest.is_empty() {
						overrides.push(assignment.property.clone());
					}
					else {
						pending.push(PendingAssignment {
							path: rest,
							property: assignment.property,
						});
					}
				},
				_ => {},
			}
		}

		(overrides, pending)
	}

	/// Reports dynamic assignments whose path does not name an instance
	fn check_dynamic_paths(&mut self, items: &'a [BodyItem], scope: ScopeId) {
		for item in items {
			if let BodyItem::Dynamic(dynamic) = item {
				self.check_path(items, scope, &dynamic.path, dynamic.property.pos);
			}
		}
	}

	fn check_path(&mut self, items: &'a [BodyItem], scope: ScopeId, path: &[String], pos: SourcePos) {
		let Some((first, rest)) = path.split_first()
		else {
			return;
		};

		let Some(stmt) = find_instance(items, first)
		else {
			self.error(ElabMessageKind::UnknownInstance { name: first.clone() }, pos);
			return;
		};

		if rest.is_empty() {
			return;
		}

		let def = match &stmt.type_ref {
			TypeRef::Named { name, .. } => match self.registry.resolve(name, scope) {
				Ok(def) => def,
				// Already reported where the instance is expanded
				Err(_) => return,
			},
			TypeRef::Anonymous(def) => &**def,
		};
		let inner_scope = self.scope_of(def);
		self.check_path(&def.items, inner_scope, rest, pos);
	}

	/// Fills in a freshly pushed node from its type definition
	fn build_node(
		&mut self,
		model: &mut ElaboratedModel,
		id: NodeId,
		def: &'a ComponentDef,
		overrides: &[PropertyAssignment],
		pending: &[PendingAssignment<'a>],
	) {
		let props = self.resolver.resolve(def, overrides);
		let scope = self.scope_of(def);
		let local: Vec<_> = dynamic_assignments(&def.items).collect();

		self.type_stack.push(def);
		self.check_dynamic_paths(&def.items, scope);

		let size = match def.kind {
			NodeKind::Addrmap | NodeKind::Regfile => {
				self.expand_container(model, id, def, scope, &props, &local, pending)
			},
			NodeKind::Reg => self.expand_register(model, id, def, scope, &props, &local, pending),
			NodeKind::Mem => {
				self.reject_children(def, scope);
				self.memory_size(model.node_ref(id), &props)
			},
			NodeKind::Field => {
				self.reject_children(def, scope);
				0
			},
		};

		self.type_stack.pop();

		let node = model.node_mut(id);
		node.properties = props;
		node.size = size;
	}

	/// Expands children of an addrmap or a regfile, returns the container size
	#[allow(clippy::too_many_arguments)]
	fn expand_container(
		&mut self,
		model: &mut ElaboratedModel,
		id: NodeId,
		def: &'a ComponentDef,
		scope: ScopeId,
		props: &PropertyMap,
		local: &[PendingAssignment<'a>],
		pending: &[PendingAssignment<'a>],
	) -> u64 {
		let mode = match def.kind {
			NodeKind::Addrmap => AddressingMode::from_property(props.get("addressing")),
			_ => AddressingMode::default(),
		};
		let mut alloc = AddressAllocator::new(mode);

		for item in &def.items {
			let BodyItem::Instances(stmt) = item
			else {
				continue;
			};
			let Some(child_def) = self.resolve_type(&stmt.type_ref, scope)
			else {
				continue;
			};

			for spec in &stmt.instances {
				self.instantiate(model, id, def.kind, stmt, child_def, spec, &mut alloc, local, pending);
			}
		}

		alloc.extent()
	}

	/// Array dimensions of a non-field instance (`None` if the instance must be dropped)
	fn array_dimensions(&mut self, spec: &InstanceSpec) -> Option<Vec<u64>> {
		let mut dimensions = vec![];
		for suffix in &spec.suffixes {
			match suffix {
				ArraySuffix::Count(count) if *count > 0 => dimensions.push(*count),
				_ => {
					self.error(
						ElabMessageKind::InvalidArrayDimension {
							name: spec.name.clone(),
						},
						spec.pos,
					);
					return None;
				},
			}
		}

		let total = dimensions
			.iter()
			.try_fold(self.replication, |acc, dim| acc.checked_mul(*dim));
		if total.map_or(true, |total| total > self.options.max_array_elements) {
			self.error(
				ElabMessageKind::InvalidArrayDimension {
					name: spec.name.clone(),
				},
				spec.pos,
			);
			return None;
		}

		Some(dimensions)
	}

	#[allow(clippy::too_many_arguments)]
	fn instantiate(
		&mut self,
		model: &mut ElaboratedModel,
		parent: NodeId,
		parent_kind: NodeKind,
		stmt: &'a InstanceStmt,
		def: &'a ComponentDef,
		spec: &'a InstanceSpec,
		alloc: &mut AddressAllocator,
		local: &[PendingAssignment<'a>],
		pending: &[PendingAssignment<'a>],
	) {
		if !parent_kind.can_contain(def.kind) {
			self.error(
				ElabMessageKind::InvalidNesting {
					child: def.kind,
					parent: parent_kind,
				},
				spec.pos,
			);
			return;
		}

		if self.type_stack.iter().any(|d| ptr::eq(*d, def)) {
			let name = def.name.clone().unwrap_or_else(|| spec.name.clone());
			self.error(ElabMessageKind::RecursiveInstantiation { name }, spec.pos);
			return;
		}

		let Some(dimensions) = self.array_dimensions(spec)
		else {
			return;
		};

		trace!("Instantiating `{}` ({})", spec.name, def.kind);
		let (overrides, sub_pending) = self.instance_overrides(Some(stmt), None, &spec.name, spec.pos, local, pending);
		let type_name = def.name.as_deref().unwrap_or("");
		let id = model.push(Some(parent), ElaboratedNode::new(def.kind, &spec.name, type_name, spec.pos));
		let outer = self.replication;
		self.replication = dimensions.iter().fold(outer, |acc, dim| acc.saturating_mul(*dim));
		self.build_node(model, id, def, &overrides, &sub_pending);
		self.replication = outer;
		let subtree = id.index()..model.len();

		let node = model.node_ref(id);
		let alignment = spec.alignment.or_else(|| {
			node.property("alignment")
				.and_then(PropertyValue::as_integer)
				.and_then(|a| u64::try_from(a).ok())
		});
		let placement = alloc.place(PlacementRequest {
			name: spec.name.clone(),
			dimensions: dimensions.clone(),
			size: node.size(),
			address: spec.address,
			stride: spec.stride,
			alignment,
			alias: stmt.alias_of.is_some(),
			shared: node.property("shared").and_then(PropertyValue::as_bool).unwrap_or(false),
		});

		if let Some(conflict) = placement.conflict.clone() {
			self.error(
				ElabMessageKind::AddressOverlap {
					name: conflict.name,
					other: conflict.other,
					address: conflict.address,
				},
				spec.pos,
			);
		}

		model.shift_range(subtree.clone(), placement.base);
		if dimensions.is_empty() {
			return;
		}

		debug!(
			"Replicating `{}` {:?} with stride {:#x}",
			spec.name, dimensions, placement.stride
		);
		let indices = dimensions.iter().map(|dim| 0..*dim).multi_cartesian_product();
		for (element, index) in (0u64..).zip(indices) {
			let element_id = if element == 0 {
				id
			}
			else {
				let copy = model.copy_subtree(subtree.clone());
				let copied = copy.index()..model.len();
				model.shift_range(copied, element.saturating_mul(placement.stride));
				copy
			};

			let node = model.node_mut(element_id);
			node.array_dimensions = dimensions.clone();
			node.array_index = index;
		}
	}

	/// Expands fields of a register, returns the register size
	#[allow(clippy::too_many_arguments)]
	fn expand_register(
		&mut self,
		model: &mut ElaboratedModel,
		id: NodeId,
		def: &'a ComponentDef,
		scope: ScopeId,
		props: &PropertyMap,
		local: &[PendingAssignment<'a>],
		pending: &[PendingAssignment<'a>],
	) -> u64 {
		let regwidth = props
			.get("regwidth")
			.and_then(PropertyValue::as_integer)
			.unwrap_or(self.options.default_regwidth);
		if regwidth <= 0 || regwidth % 8 != 0 {
			let pos = model.node_ref(id).pos();
			self.error(ElabMessageKind::InvalidRegWidth { width: regwidth }, pos);
		}

		let width = if regwidth > 0 {
			regwidth as u64
		}
		else {
			self.options.default_regwidth.max(8) as u64
		};

		let mut cursor = 0;
		let mut valid_fields: Vec<NodeId> = vec![];
		for item in &def.items {
			let BodyItem::Instances(stmt) = item
			else {
				continue;
			};
			let Some(field_def) = self.resolve_type(&stmt.type_ref, scope)
			else {
				continue;
			};

			for spec in &stmt.instances {
				if field_def.kind != NodeKind::Field {
					self.error(
						ElabMessageKind::InvalidNesting {
							child: field_def.kind,
							parent: NodeKind::Reg,
						},
						spec.pos,
					);
					continue;
				}

				let Some(field) = self.instantiate_field(model, id, stmt, field_def, spec, &mut cursor, local, pending)
				else {
					continue;
				};

				if self.check_field(model, field, width, &valid_fields) {
					valid_fields.push(field);
				}
			}
		}

		width.div_ceil(8)
	}

	#[allow(clippy::too_many_arguments)]
	fn instantiate_field(
		&mut self,
		model: &mut ElaboratedModel,
		reg: NodeId,
		stmt: &'a InstanceStmt,
		def: &'a ComponentDef,
		spec: &'a InstanceSpec,
		cursor: &mut u64,
		local: &[PendingAssignment<'a>],
		pending: &[PendingAssignment<'a>],
	) -> Option<NodeId> {
		let invalid_dimension = ElabMessageKind::InvalidArrayDimension {
			name: spec.name.clone(),
		};

		let shape = match spec.suffixes.as_slice() {
			[] => FieldShape::Implicit,
			[ArraySuffix::Range(msb, lsb)] => FieldShape::Bits { msb: *msb, lsb: *lsb },
			[ArraySuffix::Count(width)] if *width > 0 => FieldShape::Width(*width),
			_ => {
				self.error(invalid_dimension, spec.pos);
				return None;
			},
		};

		let (overrides, _) = self.instance_overrides(Some(stmt), spec.reset, &spec.name, spec.pos, local, pending);
		let mut props = self.resolver.resolve(def, &overrides);
		self.reject_children(def, self.scope_of(def));

		let range = match shape {
			FieldShape::Bits { msb, lsb } => BitRange::new(msb, lsb),
			FieldShape::Width(width) => {
				let lsb = spec.address.unwrap_or(*cursor);
				BitRange::new(lsb.saturating_add(width - 1), lsb)
			},
			FieldShape::Implicit => {
				let width = props
					.get("fieldwidth")
					.and_then(PropertyValue::as_integer)
					.unwrap_or(1);
				if width <= 0 {
					self.error(invalid_dimension, spec.pos);
					return None;
				}
				let lsb = spec.address.unwrap_or(*cursor);
				BitRange::new(lsb.saturating_add(width as u64 - 1), lsb)
			},
		};
		*cursor = range.msb.max(range.lsb).saturating_add(1);

		props.insert("lsb".into(), PropertyValue::Integer(range.lsb as i64));
		props.insert("msb".into(), PropertyValue::Integer(range.msb as i64));
		props.insert("fieldwidth".into(), PropertyValue::Integer(range.width() as i64));

		let type_name = def.name.as_deref().unwrap_or("");
		let mut node = ElaboratedNode::new(NodeKind::Field, &spec.name, type_name, spec.pos);
		node.bit_range = Some(range);
		node.properties = props;
		trace!("Field `{}` at {}", spec.name, range);
		Some(model.push(Some(reg), node))
	}

	/// Validates a field against the register width and the fields placed
	/// before it. Returns whether the bit range itself is valid.
	fn check_field(&mut self, model: &ElaboratedModel, field: NodeId, regwidth: u64, valid: &[NodeId]) -> bool {
		let node = model.node_ref(field);
		let Some(range) = node.bit_range()
		else {
			return false;
		};

		if range.is_inverted() || range.msb >= regwidth {
			self.error(
				ElabMessageKind::InvalidBitRange {
					field: node.inst_name().into(),
					msb: range.msb,
					lsb: range.lsb,
					regwidth,
				},
				node.pos(),
			);
			return false;
		}

		let access = sw_access(node);
		let overlapping = valid.iter().map(|id| model.node_ref(*id)).find(|other| {
			other.bit_range().map_or(false, |r| r.overlaps(&range)) && !is_access_split(access, sw_access(other))
		});

		if let Some(other) = overlapping {
			self.error(
				ElabMessageKind::FieldOverlap {
					field: node.inst_name().into(),
					other: other.inst_name().into(),
				},
				node.pos(),
			);
		}
		true
	}

	fn memory_size(&mut self, node: &ElaboratedNode, props: &PropertyMap) -> u64 {
		let entries = props
			.get("mementries")
			.and_then(PropertyValue::as_integer)
			.filter(|entries| *entries > 0);
		let Some(entries) = entries
		else {
			self.error(
				ElabMessageKind::MissingMemEntries {
					name: node.inst_name().into(),
				},
				node.pos(),
			);
			return 0;
		};

		let memwidth = props
			.get("memwidth")
			.and_then(PropertyValue::as_integer)
			.filter(|width| *width > 0)
			.unwrap_or(self.options.default_memwidth)
			.max(1);
		(entries as u64).saturating_mul((memwidth as u64).div_ceil(8))
	}

	/// Reports every instance in the body of a leaf component
	fn reject_children(&mut self, def: &'a ComponentDef, scope: ScopeId) {
		for item in &def.items {
			let BodyItem::Instances(stmt) = item
			else {
				continue;
			};
			let Some(child_def) = self.resolve_type(&stmt.type_ref, scope)
			else {
				continue;
			};
			for spec in &stmt.instances {
				self.error(
					ElabMessageKind::InvalidNesting {
						child: child_def.kind,
						parent: def.kind,
					},
					spec.pos,
				);
			}
		}
	}
}
