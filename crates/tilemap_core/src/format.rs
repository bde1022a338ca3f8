//! Map file text: JSON5 reading and the aligned quadrant writer

use crate::quadrant::{decode, encode, QuadrantSet};
use crate::{CoordinatePlane, FormatError};

/// Width numeric cells are right-aligned to
pub const CELL_WIDTH: usize = 4;

const QUADRANT_INDENT: &str = "    ";
const ROW_INDENT: &str = "        ";

/// Parse relaxed JSON (comments, trailing commas, unquoted keys) into a value
pub fn parse_json5(text: &str) -> Result<serde_json::Value, FormatError> {
    Ok(json5::from_str::<serde_json::Value>(text)?)
}

/// Parse map text into quadrant arrays
pub fn parse_map(text: &str) -> Result<QuadrantSet, FormatError> {
    QuadrantSet::from_value(&parse_json5(text)?)
}

/// Parse map text straight into a plane
pub fn load_plane(text: &str) -> Result<CoordinatePlane, FormatError> {
    parse_map(text).map(|set| decode(&set))
}

/// Encode a plane and render it as map text
pub fn save_plane(plane: &CoordinatePlane) -> String {
    format_map(&encode(plane))
}

/// Render quadrant arrays one row per line:
///
/// ```text
/// [
///     [
///         [   5,null,   2]
///     ],
///     ...
/// ]
/// ```
pub fn format_map(set: &QuadrantSet) -> String {
    let mut out = String::from("[\n");
    let last = set.quadrants.len() - 1;

    for (i, rows) in set.quadrants.iter().enumerate() {
        out.push_str(QUADRANT_INDENT);
        out.push_str("[\n");

        let lines: Vec<String> = rows
            .iter()
            .map(|row| format!("{}{}", ROW_INDENT, format_row(row)))
            .collect();
        out.push_str(&lines.join(",\n"));
        out.push('\n');

        out.push_str(QUADRANT_INDENT);
        out.push_str(if i == last { "]\n" } else { "],\n" });
    }

    out.push(']');
    out
}

/// Render one row as `[   5,null,  12]`
pub fn format_row(row: &[Option<u32>]) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|cell| match cell {
            Some(tile) => format!("{:>width$}", tile, width = CELL_WIDTH),
            None => "null".to_string(),
        })
        .collect();
    format!("[{}]", cells.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_alignment() {
        assert_eq!(format_row(&[Some(5), None, Some(2)]), "[   5,null,   2]");
        assert_eq!(format_row(&[Some(12345)]), "[12345]");
        assert_eq!(format_row(&[None]), "[null]");
        assert_eq!(format_row(&[]), "[]");
    }

    #[test]
    fn test_format_map_layout() {
        let plane: CoordinatePlane = [((0, 0), 5), ((2, 0), 2), ((0, 1), 17)]
            .into_iter()
            .collect();
        let text = save_plane(&plane);
        let expected = "[\n    [\n        [   5,null,   2],\n        [  17]\n    ],\n    [\n        [null]\n    ],\n    [\n        [null]\n    ],\n    [\n        [null]\n    ]\n]";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_saved_text_parses_back() {
        let plane: CoordinatePlane = [((-3, 4), 1), ((0, -1), 0), ((9, 9), 250)]
            .into_iter()
            .collect();
        let text = save_plane(&plane);
        assert_eq!(load_plane(&text).unwrap(), plane);
    }

    #[test]
    fn test_relaxed_syntax() {
        let text = "// hand edited\n[\n  [[1, null, 2,],],\n  /* west */ [[null]],\n  [[null]],\n  [[null]],\n]";
        let plane = load_plane(text).unwrap();
        assert_eq!(plane.get(0, 0), Some(1));
        assert_eq!(plane.get(2, 0), Some(2));
        assert_eq!(plane.len(), 2);
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            load_plane("[[[1, 2]"),
            Err(FormatError::Syntax(_))
        ));
    }

    #[test]
    fn test_non_array_rejected_before_decode() {
        assert!(matches!(
            load_plane("{ tiles: [] }"),
            Err(FormatError::MalformedQuadrants(_))
        ));
        assert!(matches!(
            load_plane("42"),
            Err(FormatError::MalformedQuadrants(_))
        ));
    }
}
