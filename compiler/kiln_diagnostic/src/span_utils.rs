//! Span utility functions for diagnostic rendering.
//!
//! Line and column numbers are computed against the unit's *current*
//! source buffer, which includes any text injected during construction.

use kiln_ir::Span;

/// Compute the 1-based line number where a span starts.
pub fn line_number(source: &str, span: Span) -> u32 {
    line_from_offset(source, span.start)
}

/// Compute 1-based line number from a byte offset.
pub fn line_from_offset(source: &str, offset: u32) -> u32 {
    offset_to_line_col(source, offset).0
}

/// Compute 1-based (line, column) from a byte offset.
///
/// The column counts characters, not bytes, from the start of the line.
pub fn offset_to_line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let mut line = 1u32;
    let mut line_start = 0usize;

    for (i, byte) in source.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }

    let col_text = source.get(line_start..offset).unwrap_or("");
    let col = u32::try_from(col_text.chars().count()).unwrap_or(u32::MAX - 1) + 1;

    (line, col)
}

/// The full text of the line containing `offset`, without its newline.
pub fn line_text(source: &str, offset: u32) -> &str {
    let offset = (offset as usize).min(source.len());
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
    &source[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_offset_multiple_lines() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_from_offset(source, 0), 1);
        assert_eq!(line_from_offset(source, 5), 1);
        assert_eq!(line_from_offset(source, 6), 2);
        assert_eq!(line_from_offset(source, 12), 3);
    }

    #[test]
    fn test_line_number_from_span() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_number(source, Span::new(6, 11)), 2);
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "abc\ndefgh\nij";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 2), (1, 3));
        assert_eq!(offset_to_line_col(source, 7), (2, 4));
        assert_eq!(offset_to_line_col(source, 10), (3, 1));
    }

    #[test]
    fn test_offset_past_end_clamps() {
        assert_eq!(offset_to_line_col("ab", 40), (1, 3));
    }

    #[test]
    fn test_offset_to_line_col_unicode() {
        let source = "αβγ\nδε";
        assert_eq!(offset_to_line_col(source, 2), (1, 2));
        assert_eq!(offset_to_line_col(source, 7), (2, 1));
    }

    #[test]
    fn test_line_text() {
        let source = "let a = 1;\nbegin { lex_stuff(\"x\"); } print(a);\n";
        assert_eq!(line_text(source, 3), "let a = 1;");
        assert_eq!(line_text(source, 15), "begin { lex_stuff(\"x\"); } print(a);");
    }
}
