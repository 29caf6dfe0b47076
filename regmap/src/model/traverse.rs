use super::{ElaboratedModel, ElaboratedNode, NodeId};

/// Read-only visitor over an elaborated model
///
/// Renderers implement this trait and keep all of their state to themselves.
pub trait ModelVisitor {
	/// Called when a node is entered (`depth` is 0 for the root)
	fn pre_visit(&mut self, node: &ElaboratedNode, depth: usize);

	/// Called after all children of a node have been visited
	fn post_visit(&mut self, _node: &ElaboratedNode, _depth: usize) {}
}

impl ElaboratedModel {
	/// Walks the whole model depth-first, in document order
	pub fn traverse(&self, visitor: &mut dyn ModelVisitor) {
		self.traverse_from(self.root_id(), visitor);
	}

	/// Walks the subtree rooted at `id`
	pub fn traverse_from(&self, id: NodeId, visitor: &mut dyn ModelVisitor) {
		self.visit(id, 0, visitor);
	}

	fn visit(&self, id: NodeId, depth: usize, visitor: &mut dyn ModelVisitor) {
		let Some(node) = self.node(id) else {
			return;
		};

		visitor.pre_visit(node, depth);
		for child in node.children() {
			self.visit(*child, depth + 1, visitor);
		}
		visitor.post_visit(node, depth);
	}
}

#[cfg(test)]
mod tests {
	use crate::model::{ElaboratedModel, ElaboratedNode, ModelVisitor, NodeKind};
	use crate::syntax::SourcePos;

	#[derive(Default)]
	struct EventRecorder {
		events: Vec<String>,
	}

	impl ModelVisitor for EventRecorder {
		fn pre_visit(&mut self, node: &ElaboratedNode, depth: usize) {
			self.events.push(format!("enter {} {}", node.inst_name(), depth));
		}

		fn post_visit(&mut self, node: &ElaboratedNode, depth: usize) {
			self.events.push(format!("leave {} {}", node.inst_name(), depth));
		}
	}

	#[test]
	fn test_visit_order() {
		let pos = SourcePos::default();
		let mut model = ElaboratedModel::new(ElaboratedNode::new(NodeKind::Addrmap, "top", "top", pos));
		let root = model.root_id();
		let a = model.push(Some(root), ElaboratedNode::new(NodeKind::Reg, "a", "", pos));
		model.push(Some(a), ElaboratedNode::new(NodeKind::Field, "f", "", pos));
		model.push(Some(root), ElaboratedNode::new(NodeKind::Reg, "b", "", pos));

		let mut recorder = EventRecorder::default();
		model.traverse(&mut recorder);
		assert_eq!(
			recorder.events,
			vec![
				"enter top 0",
				"enter a 1",
				"enter f 2",
				"leave f 2",
				"leave a 1",
				"enter b 1",
				"leave b 1",
				"leave top 0",
			]
		);
	}
}
