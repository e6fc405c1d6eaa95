//! Indent levels and indent guides.
//!
//! A line's indent level is its leading whitespace with tabs expanded to
//! the next tab stop. Blank lines take their guide from the nearest content
//! lines above and below: the smaller indent wins, except that off-side
//! languages align a blank line with the region below instead of nesting
//! into it.

use crate::buffer::TextBuffer;

/// Leading-whitespace width of `line` with tabs expanded; `-1` when the
/// line is empty or whitespace-only.
pub(crate) fn compute_indent_level(line: &str, tab_size: usize) -> isize {
    let mut indent = 0usize;
    for ch in line.chars() {
        match ch {
            ' ' => indent += 1,
            '\t' => indent = indent - indent % tab_size + tab_size,
            _ => return indent as isize,
        }
    }
    -1
}

fn guide_for_whitespace_line(
    off_side: bool,
    above_indent: isize,
    below_indent: isize,
    tab_size: usize,
) -> usize {
    if above_indent == -1 || below_indent == -1 {
        // Top or bottom of the file.
        return 0;
    }
    let tab_size = tab_size as isize;
    let guide = if above_indent < below_indent {
        // Inside the region above.
        1 + above_indent / tab_size
    } else if above_indent == below_indent {
        // Between two regions of the same depth.
        (below_indent + tab_size - 1) / tab_size
    } else if off_side {
        // Same level as the region below.
        (below_indent + tab_size - 1) / tab_size
    } else {
        // Inside the region below.
        1 + below_indent / tab_size
    };
    guide.max(0) as usize
}

/// Indent guide depth for each line of `start_line..=end_line`.
pub(crate) fn get_lines_indent_guides(
    buffer: &TextBuffer,
    tab_size: usize,
    off_side: bool,
    start_line: usize,
    end_line: usize,
) -> Vec<usize> {
    let line_count = buffer.line_count();
    let mut result = vec![0usize; end_line - start_line + 1];

    // -2: not yet computed, -1: known absent.
    let mut above_line: isize = -2;
    let mut above_indent: isize = -1;
    let mut below_line: isize = -2;
    let mut below_indent: isize = -1;

    for line in start_line..=end_line {
        let index = line - start_line;
        let indent = compute_indent_level(buffer.line_content(line), tab_size);
        if indent >= 0 {
            above_line = line as isize;
            above_indent = indent;
            result[index] = ((indent as usize) + tab_size - 1) / tab_size;
            continue;
        }

        if above_line == -2 {
            above_line = -1;
            above_indent = -1;
            for above in (1..line).rev() {
                let ind = compute_indent_level(buffer.line_content(above), tab_size);
                if ind >= 0 {
                    above_line = above as isize;
                    above_indent = ind;
                    break;
                }
            }
        }

        if below_line != -1 && (below_line == -2 || below_line < line as isize) {
            below_line = -1;
            below_indent = -1;
            for below in line + 1..=line_count {
                let ind = compute_indent_level(buffer.line_content(below), tab_size);
                if ind >= 0 {
                    below_line = below as isize;
                    below_indent = ind;
                    break;
                }
            }
        }

        result[index] = guide_for_whitespace_line(off_side, above_indent, below_indent, tab_size);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_ending::DefaultLineEnding;

    fn buffer(text: &str) -> TextBuffer {
        TextBuffer::from_string(text, DefaultLineEnding::Lf)
    }

    #[test]
    fn test_compute_indent_level() {
        assert_eq!(compute_indent_level("    x", 4), 4);
        assert_eq!(compute_indent_level("\tx", 4), 4);
        assert_eq!(compute_indent_level("  \tx", 4), 4);
        assert_eq!(compute_indent_level("x", 4), 0);
        assert_eq!(compute_indent_level("   ", 4), -1);
        assert_eq!(compute_indent_level("", 4), -1);
    }

    #[test]
    fn test_content_line_guides() {
        let b = buffer("top\n    one\n        two");
        assert_eq!(get_lines_indent_guides(&b, 4, false, 1, 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_blank_line_sandwiched_between_equal_regions() {
        let b = buffer("    a\n\n    b");
        assert_eq!(get_lines_indent_guides(&b, 4, false, 1, 3), vec![1, 1, 1]);
    }

    #[test]
    fn test_blank_line_inside_deeper_region_above() {
        // Blank line between indent 8 above and indent 4 below: without
        // off-side the guide nests into the region below.
        let b = buffer("        a\n\n    b");
        assert_eq!(get_lines_indent_guides(&b, 4, false, 2, 2), vec![2]);
        // With off-side it aligns with the region below.
        assert_eq!(get_lines_indent_guides(&b, 4, true, 2, 2), vec![1]);
    }

    #[test]
    fn test_blank_lines_at_file_edges_have_no_guide() {
        let b = buffer("\n    a\n");
        let guides = get_lines_indent_guides(&b, 4, false, 1, 3);
        assert_eq!(guides[0], 0);
        assert_eq!(guides[2], 0);
    }
}
