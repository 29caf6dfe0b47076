use std::collections::BTreeMap;

use log::trace;

use crate::model::NodeKind;
use crate::property::{property_applies_to, PropertyValue};
use crate::syntax::{ComponentDef, PropertyAssignment};

use super::registry::TypeRegistry;
use super::ElabOptions;

pub(crate) type PropertyMap = BTreeMap<String, PropertyValue>;

/// Computes effective property sets of instantiated components
///
/// Precedence (low to high): kind defaults, lexical `default`s,
/// assignments in the type body, instantiation-site assignments.
pub(crate) struct PropertyResolver<'a> {
	registry: &'a TypeRegistry<'a>,
	options: &'a ElabOptions,
}

impl<'a> PropertyResolver<'a> {
	pub fn new(registry: &'a TypeRegistry<'a>, options: &'a ElabOptions) -> Self {
		Self { registry, options }
	}

	pub fn kind_defaults(&self, kind: NodeKind) -> PropertyMap {
		let mut props = PropertyMap::new();
		match kind {
			NodeKind::Reg => {
				props.insert("regwidth".into(), self.options.default_regwidth.into());
			},
			NodeKind::Mem => {
				props.insert("memwidth".into(), self.options.default_memwidth.into());
			},
			NodeKind::Addrmap | NodeKind::Regfile | NodeKind::Field => {},
		}
		props
	}

	pub fn resolve(&self, def: &ComponentDef, overrides: &[PropertyAssignment]) -> PropertyMap {
		let mut props = self.kind_defaults(def.kind);

		for default in self.registry.defaults_for(def) {
			if property_applies_to(&default.name, def.kind) {
				props.insert(default.name.clone(), default.value.clone());
			}
		}

		for prop in def.properties().chain(overrides.iter()) {
			trace!("{} = {}", prop.name, prop.value);
			props.insert(prop.name.clone(), prop.value.clone());
		}

		props
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::elab::ElabReport;
	use crate::syntax::{BodyItem, Root, SourcePos};

	fn assign(name: &str, value: PropertyValue) -> PropertyAssignment {
		PropertyAssignment::new(name, value, SourcePos::default())
	}

	fn sample_root() -> Root {
		let reg = ComponentDef::new(NodeKind::Reg, Some("r"), SourcePos::default())
			.with_item(BodyItem::Property(assign("regwidth", 16.into())))
			.with_item(BodyItem::Property(assign("desc", "from type".into())));
		Root {
			items: vec![
				BodyItem::Default(assign("regwidth", 64.into())),
				BodyItem::Default(assign("desc", "from default".into())),
				BodyItem::Default(assign("sw", PropertyValue::Enum("rw".into()))),
				BodyItem::Default(assign("accesswidth", 8.into())),
				BodyItem::Definition(reg),
			],
		}
	}

	#[test]
	fn test_precedence() {
		let root = sample_root();
		let mut report = ElabReport::default();
		let registry = TypeRegistry::build(&root, &mut report);
		let options = ElabOptions::default();
		let resolver = PropertyResolver::new(&registry, &options);

		let BodyItem::Definition(reg) = &root.items[4] else {
			unreachable!()
		};
		let props = resolver.resolve(reg, &[assign("desc", "from instance".into())]);

		assert_eq!(props["regwidth"], PropertyValue::Integer(16));
		assert_eq!(props["desc"], PropertyValue::from("from instance"));
		assert_eq!(props["accesswidth"], PropertyValue::Integer(8));

		// `sw` does not apply to registers
		assert!(!props.contains_key("sw"));
	}

	#[test]
	fn test_kind_defaults() {
		let registry = TypeRegistry::new();
		let options = ElabOptions {
			default_memwidth: 64,
			..Default::default()
		};
		let resolver = PropertyResolver::new(&registry, &options);

		assert_eq!(resolver.kind_defaults(NodeKind::Reg)["regwidth"], PropertyValue::Integer(32));
		assert_eq!(resolver.kind_defaults(NodeKind::Mem)["memwidth"], PropertyValue::Integer(64));
		assert!(resolver.kind_defaults(NodeKind::Field).is_empty());
	}
}
