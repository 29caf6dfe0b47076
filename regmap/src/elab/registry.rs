use std::collections::HashMap;

use log::{debug, trace};
use thiserror::Error;

use crate::property::is_builtin_property;
use crate::syntax::{BodyItem, ComponentDef, PropertyAssignment, Root, TypeRef};

use super::report::{ElabMessageKind, ElabReport};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Component type `{0}` is already defined in this scope")]
	DuplicateDefinition(String),

	#[error("Unknown component type `{0}`")]
	UnknownType(String),
}

impl RegistryError {
	pub fn to_message_kind(&self) -> ElabMessageKind {
		match self {
			RegistryError::DuplicateDefinition(name) => ElabMessageKind::DuplicateDefinition { name: name.clone() },
			RegistryError::UnknownType(name) => ElabMessageKind::UnknownType { name: name.clone() },
		}
	}
}

/// References a lexical scope in the registry
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct ScopeId {
	id: usize,
}

struct Scope<'a> {
	parent: Option<ScopeId>,
	types: HashMap<String, &'a ComponentDef>,
	defaults: Vec<&'a PropertyAssignment>,
}

impl<'a> Scope<'a> {
	fn new(parent: Option<ScopeId>) -> Self {
		Self {
			parent,
			types: HashMap::new(),
			defaults: vec![],
		}
	}
}

/// Named component definitions, organized in lexical scopes
///
/// The registry borrows the syntax tree and lives for a single elaboration.
/// Every component body (named or anonymous) gets its own scope, so the
/// registry also knows where `default` assignments apply.
pub struct TypeRegistry<'a> {
	scopes: Vec<Scope<'a>>,

	/// Scope created for each component body (keyed by address of the definition)
	body_scopes: HashMap<*const ComponentDef, ScopeId>,
}

impl<'a> TypeRegistry<'a> {
	pub fn new() -> Self {
		Self {
			scopes: vec![Scope::new(None)],
			body_scopes: HashMap::new(),
		}
	}

	/// Registers all definitions found in the syntax tree
	///
	/// Duplicate definitions and unknown property names are reported,
	/// the first definition of a name is the one that stays registered.
	pub fn build(root: &'a Root, report: &mut ElabReport) -> Self {
		let mut registry = Self::new();
		let scope = registry.root_scope();
		registry.register_body(scope, &root.items, report);
		debug!("Registered {} scopes", registry.scopes.len());
		registry
	}

	pub fn root_scope(&self) -> ScopeId {
		ScopeId { id: 0 }
	}

	pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
		self.scopes.get(scope.id).and_then(|s| s.parent)
	}

	/// Creates a new empty scope nested in `parent`
	pub fn add_scope(&mut self, parent: ScopeId) -> ScopeId {
		let id = ScopeId { id: self.scopes.len() };
		self.scopes.push(Scope::new(Some(parent)));
		id
	}

	/// Registers a named definition in the given scope
	pub fn define(&mut self, scope: ScopeId, name: &str, def: &'a ComponentDef) -> Result<(), RegistryError> {
		let types = &mut self.scopes[scope.id].types;
		if types.contains_key(name) {
			return Err(RegistryError::DuplicateDefinition(name.into()));
		}
		trace!("Defining `{}` in scope {}", name, scope.id);
		types.insert(name.into(), def);
		Ok(())
	}

	/// Looks up a type by name, starting at `scope` and moving outwards
	pub fn resolve(&self, name: &str, scope: ScopeId) -> Result<&'a ComponentDef, RegistryError> {
		let mut current = Some(scope);
		while let Some(id) = current {
			let scope = &self.scopes[id.id];
			if let Some(def) = scope.types.get(name) {
				return Ok(*def);
			}
			current = scope.parent;
		}
		Err(RegistryError::UnknownType(name.into()))
	}

	/// Scope of the body of a registered definition
	pub fn body_scope(&self, def: &ComponentDef) -> Option<ScopeId> {
		self.body_scopes.get(&(def as *const ComponentDef)).copied()
	}

	/// `default` assignments visible to a component defined in `scope`,
	/// outermost first
	pub fn defaults(&self, scope: ScopeId) -> Vec<&'a PropertyAssignment> {
		let mut chain = vec![];
		let mut current = Some(scope);
		while let Some(id) = current {
			chain.push(id);
			current = self.parent(id);
		}

		chain
			.iter()
			.rev()
			.flat_map(|id| self.scopes[id.id].defaults.iter().copied())
			.collect()
	}

	/// `default` assignments applying to the given definition, outermost first
	pub fn defaults_for(&self, def: &ComponentDef) -> Vec<&'a PropertyAssignment> {
		match self.body_scope(def).and_then(|s| self.parent(s)) {
			Some(scope) => self.defaults(scope),
			None => vec![],
		}
	}

	fn register_def(&mut self, scope: ScopeId, def: &'a ComponentDef, report: &mut ElabReport) {
		if let Some(name) = &def.name {
			if let Err(err) = self.define(scope, name, def) {
				report.add(err.to_message_kind(), def.pos);
			}
		}

		let body = self.add_scope(scope);
		self.body_scopes.insert(def as *const ComponentDef, body);
		self.register_body(body, &def.items, report);
	}

	fn register_body(&mut self, scope: ScopeId, items: &'a [BodyItem], report: &mut ElabReport) {
		for item in items {
			match item {
				BodyItem::Definition(def) => self.register_def(scope, def, report),
				BodyItem::Instances(stmt) => {
					if let TypeRef::Anonymous(def) = &stmt.type_ref {
						self.register_def(scope, def, report);
					}
				},
				BodyItem::Property(prop) => check_property_name(prop, report),
				BodyItem::Default(prop) => {
					check_property_name(prop, report);
					self.scopes[scope.id].defaults.push(prop);
				},
				BodyItem::Dynamic(dynamic) => check_property_name(&dynamic.property, report),
			}
		}
	}
}

impl<'a> Default for TypeRegistry<'a> {
	fn default() -> Self {
		Self::new()
	}
}

fn check_property_name(prop: &PropertyAssignment, report: &mut ElabReport) {
	if !is_builtin_property(&prop.name) {
		report.add(
			ElabMessageKind::UnknownProperty {
				name: prop.name.clone(),
			},
			prop.pos,
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::NodeKind;
	use crate::property::PropertyValue;
	use crate::syntax::{InstanceSpec, InstanceStmt, SourcePos};

	fn pos(line: u32) -> SourcePos {
		SourcePos::new(line, 1)
	}

	#[test]
	fn test_duplicate_definition_keeps_first() {
		let root = Root {
			items: vec![
				BodyItem::Definition(ComponentDef::new(NodeKind::Reg, Some("r"), pos(1))),
				BodyItem::Definition(ComponentDef::new(NodeKind::Field, Some("r"), pos(5))),
			],
		};

		let mut report = ElabReport::default();
		let registry = TypeRegistry::build(&root, &mut report);
		assert_eq!(report.len(), 1);
		assert_eq!(
			report.messages()[0].kind(),
			&ElabMessageKind::DuplicateDefinition { name: "r".into() }
		);
		assert_eq!(report.messages()[0].line(), 5);
		let def = registry.resolve("r", registry.root_scope()).unwrap();
		assert_eq!(def.kind, NodeKind::Reg);
	}

	#[test]
	fn test_same_name_in_different_scopes() {
		let inner = ComponentDef::new(NodeKind::Reg, Some("r"), pos(2));
		let block = ComponentDef::new(NodeKind::Regfile, Some("blk"), pos(1)).with_item(BodyItem::Definition(inner));
		let root = Root {
			items: vec![
				BodyItem::Definition(block),
				BodyItem::Definition(ComponentDef::new(NodeKind::Reg, Some("r"), pos(4))),
			],
		};

		let mut report = ElabReport::default();
		let registry = TypeRegistry::build(&root, &mut report);
		assert!(report.is_empty());

		let BodyItem::Definition(block) = &root.items[0] else {
			unreachable!()
		};
		let scope = registry.body_scope(block).unwrap();
		assert_eq!(registry.resolve("r", scope).unwrap().pos.line, 2);
		assert_eq!(registry.resolve("r", registry.root_scope()).unwrap().pos.line, 4);
		assert_eq!(registry.resolve("blk", scope).unwrap().pos.line, 1);
		assert_eq!(
			registry.resolve("nope", scope),
			Err(RegistryError::UnknownType("nope".into()))
		);
	}

	#[test]
	fn test_unknown_property_reported_once_per_site() {
		let reg = ComponentDef::new(NodeKind::Reg, Some("r"), pos(1))
			.with_item(BodyItem::Property(PropertyAssignment::new("vendor_magic", 1.into(), pos(2))))
			.with_item(BodyItem::Property(PropertyAssignment::new("regwidth", 16.into(), pos(3))));
		let root = Root {
			items: vec![
				BodyItem::Definition(reg),
				BodyItem::Instances(InstanceStmt::named(
					"r",
					pos(5),
					vec![InstanceSpec::new("a", pos(5)), InstanceSpec::new("b", pos(5))],
				)),
			],
		};

		let mut report = ElabReport::default();
		TypeRegistry::build(&root, &mut report);
		assert_eq!(report.len(), 1);
		assert_eq!(report.messages()[0].line(), 2);
	}

	#[test]
	fn test_defaults_chain() {
		let field = ComponentDef::new(NodeKind::Field, Some("f"), pos(4));
		let reg = ComponentDef::new(NodeKind::Reg, Some("r"), pos(3))
			.with_item(BodyItem::Default(PropertyAssignment::new("sw", PropertyValue::Enum("r".into()), pos(3))))
			.with_item(BodyItem::Definition(field));
		let root = Root {
			items: vec![
				BodyItem::Default(PropertyAssignment::new("sw", PropertyValue::Enum("rw".into()), pos(1))),
				BodyItem::Definition(reg),
			],
		};

		let mut report = ElabReport::default();
		let registry = TypeRegistry::build(&root, &mut report);
		let BodyItem::Definition(reg) = &root.items[1] else {
			unreachable!()
		};
		let BodyItem::Definition(field) = &reg.items[1] else {
			unreachable!()
		};

		let reg_defaults = registry.defaults_for(reg);
		assert_eq!(reg_defaults.len(), 1);
		assert_eq!(reg_defaults[0].pos.line, 1);

		let field_defaults = registry.defaults_for(field);
		let lines: Vec<u32> = field_defaults.iter().map(|d| d.pos.line).collect();
		assert_eq!(lines, vec![1, 3]);
	}
}
