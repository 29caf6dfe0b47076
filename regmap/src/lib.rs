pub mod elab;
pub mod model;
pub mod property;
pub mod render;
pub mod syntax;

pub use elab::{
	ElabError, ElabMessage, ElabMessageKind, ElabOptions, ElabReport, ElabResult, Elaborator, RegisterElaborator,
};
pub use model::{BitRange, ElaboratedModel, ElaboratedNode, ModelVisitor, NodeId, NodeKind};
pub use property::PropertyValue;
pub use render::{AddressMapEntry, AddressMapRender, JsonRender, Render, RenderError, TreeRender};
pub use syntax::SourcePos;
