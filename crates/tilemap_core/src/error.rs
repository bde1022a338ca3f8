//! Errors raised while reading map, resource and manifest text

/// Failure to turn text into one of the structured file types
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The text is not valid JSON5
    Syntax(String),
    /// The map is not shaped like an array of quadrant arrays
    MalformedQuadrants(String),
    /// The resource descriptor has no palette list at index 2
    MalformedResource(String),
    /// The manifest is not a list of map entries
    MalformedManifest(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Syntax(e) => write!(f, "JSON5 syntax error: {}", e),
            FormatError::MalformedQuadrants(e) => write!(f, "Malformed tile map: {}", e),
            FormatError::MalformedResource(e) => write!(f, "Malformed resource file: {}", e),
            FormatError::MalformedManifest(e) => write!(f, "Malformed tilemap manifest: {}", e),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<json5::Error> for FormatError {
    fn from(e: json5::Error) -> Self {
        FormatError::Syntax(e.to_string())
    }
}

/// Name of a JSON value's kind for error messages
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
