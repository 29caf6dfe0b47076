mod address_map;
mod json_render;
mod tree_render;

pub use address_map::{address_map, AddressMapEntry, AddressMapRender};
pub use json_render::{JsonRender, SerializedModel, SerializedNode, MODEL_FORMAT, MODEL_VERSION};
pub use tree_render::TreeRender;

use std::fmt;

use thiserror::Error;

use crate::model::ElaboratedModel;

#[derive(Debug, Error)]
pub enum RenderError {
	#[error(transparent)]
	FormatError(#[from] fmt::Error),

	#[error(transparent)]
	JsonError(#[from] serde_json::Error),
}

/// Trait implemented by everything that turns a finished model into text
pub trait Render {
	fn render(&mut self, w: &mut dyn fmt::Write, model: &ElaboratedModel) -> Result<(), RenderError>;

	/// Renders into a new string
	fn render_to_string(&mut self, model: &ElaboratedModel) -> Result<String, RenderError> {
		let mut output = String::new();
		self.render(&mut output, model)?;
		Ok(output)
	}
}
