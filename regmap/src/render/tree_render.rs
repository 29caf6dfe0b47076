use std::fmt::{self, Write};

use crate::model::{ElaboratedModel, ElaboratedNode, ModelVisitor};

use super::{Render, RenderError};

/// Human-readable, indented listing of the model
#[derive(Clone, Debug)]
pub struct TreeRender {
	indent: String,
	show_properties: bool,
}

impl Default for TreeRender {
	fn default() -> Self {
		Self {
			indent: "  ".into(),
			show_properties: true,
		}
	}
}

impl TreeRender {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_properties(mut self, show: bool) -> Self {
		self.show_properties = show;
		self
	}
}

struct TreeWriter<'w> {
	output: &'w mut dyn fmt::Write,
	indent: &'w str,
	show_properties: bool,
	result: fmt::Result,
}

impl<'w> TreeWriter<'w> {
	fn write_node(&mut self, node: &ElaboratedNode, depth: usize) -> fmt::Result {
		let prefix = self.indent.repeat(depth);
		let mut line = format!("{}{}: {}", prefix, node.kind(), node.display_name());

		match node.bit_range() {
			Some(range) => write!(line, " {}", range)?,
			None => write!(line, " @ {:#x} (size: {} bytes)", node.absolute_address(), node.size())?,
		}

		if node.is_array_element() {
			let dims: Vec<String> = node.array_dimensions().iter().map(|d| d.to_string()).collect();
			write!(line, " [array: {}]", dims.join("x"))?;
		}
		writeln!(self.output, "{}", line)?;

		if self.show_properties {
			for (name, value) in node.properties() {
				writeln!(self.output, "{}{}{}: {}", prefix, self.indent, name, value)?;
			}
		}
		Ok(())
	}
}

impl<'w> ModelVisitor for TreeWriter<'w> {
	fn pre_visit(&mut self, node: &ElaboratedNode, depth: usize) {
		if self.result.is_ok() {
			self.result = self.write_node(node, depth);
		}
	}
}

impl Render for TreeRender {
	fn render(&mut self, w: &mut dyn fmt::Write, model: &ElaboratedModel) -> Result<(), RenderError> {
		let mut writer = TreeWriter {
			output: w,
			indent: &self.indent,
			show_properties: self.show_properties,
			result: Ok(()),
		};
		model.traverse(&mut writer);
		writer.result?;
		Ok(())
	}
}
