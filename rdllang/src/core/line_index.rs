use regmap::SourcePos;

use crate::SourceSpan;

/// Maps byte offsets to 1-based line/column pairs and back
#[derive(Clone, Debug)]
pub struct LineIndex {
	/// Byte offset of the first character of every line
	line_starts: Vec<usize>,
	len: usize,
}

impl LineIndex {
	pub fn new(source: &str) -> Self {
		let line_starts = std::iter::once(0)
			.chain(source.match_indices('\n').map(|(offset, _)| offset + 1))
			.collect();
		Self {
			line_starts,
			len: source.len(),
		}
	}

	pub fn line_count(&self) -> usize {
		self.line_starts.len()
	}

	/// Position of the byte at `offset`. Columns count bytes.
	pub fn position(&self, offset: usize) -> SourcePos {
		let offset = offset.min(self.len);
		let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
		SourcePos::new((line + 1) as u32, (offset - self.line_starts[line] + 1) as u32)
	}

	/// Byte offset of a 1-based position (clamped to the source)
	pub fn offset(&self, pos: SourcePos) -> usize {
		let line = (pos.line.max(1) as usize - 1).min(self.line_starts.len() - 1);
		let line_end = self
			.line_starts
			.get(line + 1)
			.map(|next| next - 1)
			.unwrap_or(self.len);
		(self.line_starts[line] + pos.column.max(1) as usize - 1).min(line_end)
	}

	/// Span covering the token starting at `pos`, or an empty span at the end of the line
	pub fn span_at(&self, pos: SourcePos, source: &str) -> SourceSpan {
		let offset = self.offset(pos);
		let len = source
			.get(offset..)
			.map(|rest| {
				rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
					.unwrap_or(rest.len())
			})
			.unwrap_or(0);
		SourceSpan::new(offset, len.max(1).min(self.len.saturating_sub(offset)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const SOURCE: &str = "addrmap top {\n  reg r;\n};\n";

	#[rstest]
	#[case(0, 1, 1)]
	#[case(8, 1, 9)]
	#[case(14, 2, 1)]
	#[case(16, 2, 3)]
	#[case(23, 3, 1)]
	fn test_position(#[case] offset: usize, #[case] line: u32, #[case] column: u32) {
		let index = LineIndex::new(SOURCE);
		assert_eq!(index.position(offset), SourcePos::new(line, column));
		assert_eq!(index.offset(SourcePos::new(line, column)), offset);
	}

	#[test]
	fn test_span_at() {
		let index = LineIndex::new(SOURCE);
		assert_eq!(index.line_count(), 4);
		assert_eq!(index.span_at(SourcePos::new(1, 9), SOURCE), SourceSpan::new(8, 3));
		assert_eq!(index.span_at(SourcePos::new(2, 7), SOURCE), SourceSpan::new(20, 1));
	}
}
