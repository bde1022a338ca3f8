//! Resource descriptor: the file listing the palette images of a map

use serde_json::Value;

use crate::error::value_kind;
use crate::format::parse_json5;
use crate::FormatError;

/// Position of the palette list inside the descriptor array
pub const PALETTE_ENTRY: usize = 2;

/// Parsed resource descriptor.
///
/// The descriptor is an array whose third element lists relative image paths.
/// Tile value `i` in a map is drawn with `palette[i]`. Other elements are kept
/// as-is but not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub entries: Vec<Value>,
    pub palette: Vec<String>,
}

impl ResourceDescriptor {
    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        Self::from_value(parse_json5(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, FormatError> {
        let Value::Array(entries) = value else {
            return Err(FormatError::MalformedResource(format!(
                "expected an array, found {}",
                value_kind(&value)
            )));
        };

        let palette = match entries.get(PALETTE_ENTRY) {
            Some(Value::Array(paths)) => paths
                .iter()
                .enumerate()
                .map(|(i, path)| match path {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(FormatError::MalformedResource(format!(
                        "palette entry {} is {}, expected a path string",
                        i,
                        value_kind(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(FormatError::MalformedResource(format!(
                    "element {} is {}, expected a list of image paths",
                    PALETTE_ENTRY,
                    value_kind(other)
                )))
            }
            None => {
                return Err(FormatError::MalformedResource(format!(
                    "expected at least {} elements, found {}",
                    PALETTE_ENTRY + 1,
                    entries.len()
                )))
            }
        };

        Ok(Self { entries, palette })
    }

    /// Image path for a tile value
    pub fn image_path(&self, tile: u32) -> Option<&str> {
        self.palette.get(tile as usize).map(String::as_str)
    }

    /// Number of palette entries
    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_palette() {
        let text = r#"[
            "forest",          // name
            { tileSize: 16 },
            ["tiles/grass.png", "tiles/water.png", "tiles/rock.png",],
        ]"#;
        let resource = ResourceDescriptor::parse(text).unwrap();
        assert_eq!(resource.len(), 3);
        assert_eq!(resource.image_path(1), Some("tiles/water.png"));
        assert_eq!(resource.image_path(3), None);
        assert_eq!(resource.entries.len(), 3);
    }

    #[test]
    fn test_missing_palette() {
        let err = ResourceDescriptor::parse("[1, 2]").unwrap_err();
        assert!(matches!(err, FormatError::MalformedResource(_)));

        let err = ResourceDescriptor::parse("[1, 2, \"a.png\"]").unwrap_err();
        assert!(matches!(err, FormatError::MalformedResource(_)));

        let err = ResourceDescriptor::parse("[1, 2, [3]]").unwrap_err();
        assert!(matches!(err, FormatError::MalformedResource(_)));
    }

    #[test]
    fn test_syntax_error() {
        let err = ResourceDescriptor::parse("[1, 2,").unwrap_err();
        assert!(matches!(err, FormatError::Syntax(_)));
    }
}
