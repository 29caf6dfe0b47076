mod address_alloc;
mod expander;
mod property_resolver;
mod registry;
mod report;

pub use address_alloc::{AddressAllocator, AddressingMode, Conflict, Placement, PlacementRequest};
pub use registry::{RegistryError, ScopeId, TypeRegistry};
pub use report::{ElabMessage, ElabMessageKind, ElabReport};

use log::info;
use thiserror::Error;

use crate::model::ElaboratedModel;
use crate::syntax::Root;

use self::expander::InstanceExpander;

/// Contract violations which prevent elaboration from producing any model.
///
/// Problems with the register description itself are never reported this
/// way - they end up in the `ElabReport` instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ElabError {
	#[error("No addrmap suitable for the root of the register map")]
	NoRootAddrmap,

	#[error("Requested top-level component `{0}` is not defined")]
	TopNotFound(String),

	#[error("Requested top-level component `{0}` is not an addrmap")]
	TopNotAddrmap(String),
}

/// Elaboration settings
#[derive(Clone, Debug)]
pub struct ElabOptions {
	/// Name of the addrmap to use as the root (overrides automatic selection)
	pub top: Option<String>,

	/// `regwidth` of registers which do not specify one
	pub default_regwidth: i64,

	/// `memwidth` of memories which do not specify one
	pub default_memwidth: i64,

	/// Upper bound on the number of copies of any instance, counting the
	/// elements of all enclosing arrays
	pub max_array_elements: u64,
}

impl Default for ElabOptions {
	fn default() -> Self {
		Self {
			top: None,
			default_regwidth: 32,
			default_memwidth: 32,
			max_array_elements: 1 << 20,
		}
	}
}

impl ElabOptions {
	pub fn with_top(mut self, top: &str) -> Self {
		self.top = Some(top.into());
		self
	}
}

/// Result of a completed elaboration - the model and everything that
/// was wrong with the input
#[derive(Clone, Debug)]
pub struct ElabResult {
	model: ElaboratedModel,
	report: ElabReport,
}

impl ElabResult {
	pub fn model(&self) -> &ElaboratedModel {
		&self.model
	}

	pub fn report(&self) -> &ElabReport {
		&self.report
	}

	pub fn diagnostics(&self) -> &[ElabMessage] {
		self.report.messages()
	}

	pub fn has_errors(&self) -> bool {
		!self.report.is_empty()
	}
}

/// Trait which must be implemented by all elaborators
pub trait Elaborator {
	fn elaborate(&mut self, root: &Root) -> Result<ElabResult, ElabError>;
}

/// Elaborates register descriptions into an address-mapped model
#[derive(Clone, Debug, Default)]
pub struct RegisterElaborator {
	options: ElabOptions,
}

impl RegisterElaborator {
	pub fn new(options: ElabOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &ElabOptions {
		&self.options
	}
}

impl Elaborator for RegisterElaborator {
	fn elaborate(&mut self, root: &Root) -> Result<ElabResult, ElabError> {
		let mut report = ElabReport::default();

		info!("Registering component types");
		let registry = TypeRegistry::build(root, &mut report);

		info!("Expanding instances");
		let model = {
			let mut expander = InstanceExpander::new(&registry, &self.options, &mut report);
			expander.expand(root)?
		};

		info!(
			"Elaboration finished: {} nodes, {} diagnostics",
			model.len(),
			report.messages().len()
		);
		Ok(ElabResult { model, report })
	}
}

/// Elaborates a syntax tree with default options
pub fn elaborate(root: &Root) -> Result<ElabResult, ElabError> {
	RegisterElaborator::default().elaborate(root)
}
