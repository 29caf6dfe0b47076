use log::debug;

use crate::property::PropertyValue;

/// Implicit alignment policy of a container (`addressing` property)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressingMode {
	/// Instances aligned to their size rounded up to a power of two
	#[default]
	RegAlign,

	/// Arrays aligned to their total span rounded up to a power of two
	FullAlign,

	/// No implicit alignment
	Compact,
}

impl AddressingMode {
	pub fn from_property(value: Option<&PropertyValue>) -> Self {
		match value.and_then(|v| v.as_enum().or(v.as_str())) {
			Some("fullalign") => AddressingMode::FullAlign,
			Some("compact") => AddressingMode::Compact,
			_ => AddressingMode::RegAlign,
		}
	}
}

/// Everything the allocator needs to know about an instance
#[derive(Clone, Debug, Default)]
pub struct PlacementRequest {
	/// Instance name (used in conflict reports)
	pub name: String,

	/// Array dimensions (empty for single instances)
	pub dimensions: Vec<u64>,

	/// Size of a single element
	pub size: u64,

	/// Explicit `@` address
	pub address: Option<u64>,

	/// Explicit `+=` stride
	pub stride: Option<u64>,

	/// Alignment from `%=` or the `alignment` property
	pub alignment: Option<u64>,

	/// Instance is an alias of another register
	pub alias: bool,

	/// Instance carries `shared = true`
	pub shared: bool,
}

impl PlacementRequest {
	pub fn count(&self) -> u64 {
		self.dimensions.iter().product()
	}
}

/// First overlap found while placing an instance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
	/// Element of the new instance which overlaps
	pub name: String,

	/// Earlier sibling element it overlaps with
	pub other: String,

	/// Address of the overlapping element
	pub address: u64,
}

/// Final location of an instance (all of its elements)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
	pub base: u64,
	pub stride: u64,
	pub count: u64,
	pub size: u64,
	pub conflict: Option<Conflict>,
}

impl Placement {
	/// Address of the element with the given row-major linear index
	pub fn element_address(&self, index: u64) -> u64 {
		self.base.saturating_add(index.saturating_mul(self.stride))
	}
}

#[derive(Clone, Debug)]
struct PlacedInstance {
	name: String,
	dimensions: Vec<u64>,
	base: u64,
	stride: u64,
	count: u64,
	size: u64,
	shared: bool,
}

impl PlacedInstance {
	fn end(&self) -> u64 {
		self.base.saturating_add(span(self.stride, self.count, self.size))
	}

	fn element_name(&self, index: u64) -> String {
		element_name(&self.name, &self.dimensions, index)
	}
}

/// Places sibling instances in the address space of a single container
///
/// All addresses are relative to the container base.
#[derive(Clone, Debug, Default)]
pub struct AddressAllocator {
	mode: AddressingMode,
	cursor: u64,
	placed: Vec<PlacedInstance>,
}

impl AddressAllocator {
	pub fn new(mode: AddressingMode) -> Self {
		Self {
			mode,
			cursor: 0,
			placed: vec![],
		}
	}

	/// Address following the previously placed instance
	pub fn cursor(&self) -> u64 {
		self.cursor
	}

	/// Extent of the occupied address range (0 if nothing was placed)
	pub fn extent(&self) -> u64 {
		self.placed.iter().map(|p| p.end()).max().unwrap_or(0)
	}

	/// Places an instance and advances the cursor past it
	pub fn place(&mut self, request: PlacementRequest) -> Placement {
		let count = request.count().max(1);
		let stride = request.stride.unwrap_or(request.size);
		let base = match request.address {
			Some(address) => address,
			None => align_up(self.cursor, self.implicit_alignment(&request, stride, count)),
		};

		let placed = PlacedInstance {
			name: request.name,
			dimensions: request.dimensions,
			base,
			stride,
			count,
			size: request.size,
			shared: request.shared,
		};

		let conflict = if request.alias {
			None
		}
		else {
			self.find_conflict(&placed)
		};

		debug!(
			"Placed `{}` at {:#x} (stride {:#x}, count {}, size {:#x})",
			placed.name, base, stride, count, placed.size
		);

		self.cursor = base.saturating_add(stride.saturating_mul(count).max(span(stride, count, placed.size)));
		self.placed.push(placed);

		Placement {
			base,
			stride,
			count,
			size: request.size,
			conflict,
		}
	}

	fn implicit_alignment(&self, request: &PlacementRequest, stride: u64, count: u64) -> u64 {
		if let Some(alignment) = request.alignment {
			return alignment.max(1);
		}

		match self.mode {
			AddressingMode::RegAlign => next_power_of_two(request.size),
			AddressingMode::FullAlign => next_power_of_two(span(stride, count, request.size)),
			AddressingMode::Compact => 1,
		}
	}

	/// Finds the lowest element of `new` overlapping an earlier element
	fn find_conflict(&self, new: &PlacedInstance) -> Option<Conflict> {
		if new.size == 0 {
			return None;
		}

		let mut best: Option<(u64, String)> = None;
		for old in &self.placed {
			if old.size == 0 || (old.shared && new.shared) {
				continue;
			}
			if let Some((index, other)) = first_overlap(new, old) {
				if best.as_ref().map_or(true, |(best_index, _)| index < *best_index) {
					best = Some((index, other));
				}
			}
		}

		// Elements of a single array overlapping each other
		if new.count > 1 && new.stride < new.size && !new.shared {
			if best.as_ref().map_or(true, |(best_index, _)| 1 < *best_index) {
				best = Some((1, new.element_name(0)));
			}
		}

		best.map(|(index, other)| Conflict {
			name: new.element_name(index),
			other,
			address: new.base.saturating_add(index.saturating_mul(new.stride)),
		})
	}
}

fn span(stride: u64, count: u64, size: u64) -> u64 {
	if count == 0 {
		return 0;
	}
	(count - 1).saturating_mul(stride).saturating_add(size)
}

fn align_up(value: u64, alignment: u64) -> u64 {
	if alignment <= 1 {
		return value;
	}
	value.div_ceil(alignment).saturating_mul(alignment)
}

fn next_power_of_two(value: u64) -> u64 {
	value.max(1).checked_next_power_of_two().unwrap_or(1 << 63)
}

/// Name of an array element (`regs[1][0]`) from its row-major linear index
pub(crate) fn element_name(name: &str, dimensions: &[u64], index: u64) -> String {
	if dimensions.is_empty() {
		return name.into();
	}

	let mut indices = vec![0; dimensions.len()];
	let mut rest = index;
	for (slot, dim) in indices.iter_mut().zip(dimensions.iter()).rev() {
		let dim = (*dim).max(1);
		*slot = rest % dim;
		rest /= dim;
	}

	let mut result = name.to_string();
	for i in indices {
		result.push_str(&format!("[{}]", i));
	}
	result
}

/// Smallest element index of an array intersecting `[lo, hi)`
fn first_hit(base: u64, stride: u64, count: u64, size: u64, lo: u64, hi: u64) -> Option<u64> {
	if size == 0 || lo >= hi || count == 0 {
		return None;
	}

	let first_end = base.saturating_add(size);
	let index = if first_end > lo {
		0
	}
	else if stride == 0 {
		return None;
	}
	else {
		(lo - first_end) / stride + 1
	};

	let start = base.saturating_add(index.saturating_mul(stride));
	(index < count && start < hi).then_some(index)
}

/// Lowest element of `new` overlapping any element of `old`
fn first_overlap(new: &PlacedInstance, old: &PlacedInstance) -> Option<(u64, String)> {
	if new.base >= old.end() || old.base >= new.end() {
		return None;
	}

	if old.count == 1 {
		let index = first_hit(new.base, new.stride, new.count, new.size, old.base, old.end())?;
		return Some((index, old.element_name(0)));
	}

	// Only elements of `old` within the span of `new` may overlap
	let mut best: Option<(u64, String)> = None;
	let mut j = first_hit(old.base, old.stride, old.count, old.size, new.base, new.end())?;
	while j < old.count {
		let start = old.base.saturating_add(j.saturating_mul(old.stride));
		if start >= new.end() {
			break;
		}

		let end = start.saturating_add(old.size);
		if let Some(index) = first_hit(new.base, new.stride, new.count, new.size, start, end) {
			if best.as_ref().map_or(true, |(b, _)| index < *b) {
				best = Some((index, old.element_name(j)));
			}
			if index == 0 {
				break;
			}
		}

		if old.stride == 0 {
			break;
		}
		j += 1;
	}
	best
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn request(name: &str, size: u64) -> PlacementRequest {
		PlacementRequest {
			name: name.into(),
			size,
			..Default::default()
		}
	}

	#[test]
	fn test_auto_addresses() {
		let mut alloc = AddressAllocator::default();
		let addresses: Vec<u64> = (0..4).map(|i| alloc.place(request(&format!("r{}", i), 4)).base).collect();
		assert_eq!(addresses, vec![0, 4, 8, 12]);
		assert_eq!(alloc.extent(), 16);
	}

	#[test]
	fn test_regalign_pads_to_power_of_two() {
		let mut alloc = AddressAllocator::default();
		assert_eq!(alloc.place(request("a", 4)).base, 0);
		assert_eq!(alloc.place(request("b", 8)).base, 8);
		assert_eq!(alloc.place(request("c", 12)).base, 16);
		assert_eq!(alloc.cursor(), 28);
	}

	#[test]
	fn test_compact_mode() {
		let mut alloc = AddressAllocator::new(AddressingMode::Compact);
		alloc.place(request("a", 4));
		assert_eq!(alloc.place(request("b", 8)).base, 4);
	}

	#[test]
	fn test_fullalign_mode() {
		let mut alloc = AddressAllocator::new(AddressingMode::FullAlign);
		alloc.place(request("a", 4));
		let placement = alloc.place(PlacementRequest {
			dimensions: vec![3],
			..request("arr", 4)
		});
		assert_eq!(placement.base, 16);
	}

	#[test]
	fn test_explicit_alignment() {
		let mut alloc = AddressAllocator::default();
		alloc.place(request("a", 4));
		let placement = alloc.place(PlacementRequest {
			alignment: Some(0x100),
			..request("b", 4)
		});
		assert_eq!(placement.base, 0x100);
	}

	#[test]
	fn test_explicit_address_overlap() {
		let mut alloc = AddressAllocator::default();
		alloc.place(request("a", 8));
		let placement = alloc.place(PlacementRequest {
			address: Some(4),
			..request("b", 4)
		});
		assert_eq!(
			placement.conflict,
			Some(Conflict {
				name: "b".into(),
				other: "a".into(),
				address: 4,
			})
		);
	}

	#[test]
	fn test_alias_and_shared_authorize_overlap() {
		let mut alloc = AddressAllocator::default();
		alloc.place(PlacementRequest {
			shared: true,
			..request("a", 4)
		});
		let shared = alloc.place(PlacementRequest {
			address: Some(0),
			shared: true,
			..request("b", 4)
		});
		assert_eq!(shared.conflict, None);

		let alias = alloc.place(PlacementRequest {
			address: Some(0),
			alias: true,
			..request("c", 4)
		});
		assert_eq!(alias.conflict, None);

		let plain = alloc.place(PlacementRequest {
			address: Some(0),
			..request("d", 4)
		});
		assert_eq!(plain.conflict.unwrap().other, "a");
	}

	#[test]
	fn test_strided_array() {
		let mut alloc = AddressAllocator::default();
		let placement = alloc.place(PlacementRequest {
			dimensions: vec![4],
			address: Some(0x1000),
			stride: Some(0x100),
			..request("regs", 4)
		});
		assert_eq!(placement.conflict, None);
		let addresses: Vec<u64> = (0..4).map(|i| placement.element_address(i)).collect();
		assert_eq!(addresses, vec![0x1000, 0x1100, 0x1200, 0x1300]);
		assert_eq!(alloc.cursor(), 0x1400);
	}

	#[test]
	fn test_stride_smaller_than_size() {
		let mut alloc = AddressAllocator::default();
		let placement = alloc.place(PlacementRequest {
			dimensions: vec![4],
			stride: Some(2),
			..request("regs", 4)
		});
		let conflict = placement.conflict.unwrap();
		assert_eq!(conflict.name, "regs[1]");
		assert_eq!(conflict.other, "regs[0]");
		assert_eq!(conflict.address, 2);
	}

	#[test]
	fn test_interleaved_arrays_do_not_overlap() {
		let mut alloc = AddressAllocator::default();
		alloc.place(PlacementRequest {
			dimensions: vec![4],
			stride: Some(8),
			..request("a", 4)
		});
		let b = alloc.place(PlacementRequest {
			dimensions: vec![4],
			address: Some(4),
			stride: Some(8),
			..request("b", 4)
		});
		assert_eq!(b.conflict, None);

		let c = alloc.place(PlacementRequest {
			address: Some(0x10),
			..request("c", 4)
		});
		assert_eq!(c.conflict.unwrap().other, "a[2]");
	}

	#[test]
	fn test_zero_size_never_overlaps() {
		let mut alloc = AddressAllocator::default();
		alloc.place(request("a", 4));
		let empty = alloc.place(PlacementRequest {
			address: Some(0),
			..request("b", 0)
		});
		assert_eq!(empty.conflict, None);
	}

	#[rstest]
	#[case(&[], 0, "x")]
	#[case(&[4], 3, "x[3]")]
	#[case(&[2, 3], 4, "x[1][1]")]
	#[case(&[2, 3], 5, "x[1][2]")]
	fn test_element_names(#[case] dims: &[u64], #[case] index: u64, #[case] expected: &str) {
		assert_eq!(element_name("x", dims, index), expected);
	}
}
