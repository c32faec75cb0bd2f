//! Custom scalar names registered with every composed schema.

/// Opaque 24-hex-char document id.
pub const MONGO_ID: &str = "MongoID";

/// Date/timestamp serialized as an ISO-8601 string.
pub const DATE: &str = "Date";

/// Binary data serialized as a base64 string.
pub const BUFFER: &str = "Buffer";

/// High-precision decimal serialized as a string, so no floating-point
/// precision is lost in transit.
pub const DECIMAL: &str = "Decimal";

/// Arbitrary JSON: objects, arrays, primitives or null.
pub const JSON: &str = "JSON";

/// All custom scalars with their descriptions, in registration order.
#[must_use]
pub fn custom_scalars() -> [(&'static str, &'static str); 5] {
    [
        (MONGO_ID, "An opaque 24-hex-character document id"),
        (DATE, "A date/timestamp as an ISO-8601 string"),
        (BUFFER, "Base64-encoded binary data"),
        (DECIMAL, "An arbitrary precision decimal, serialized as a string"),
        (JSON, "An arbitrary JSON value"),
    ]
}

/// Whether a type name is one of the built-in or custom scalars.
#[must_use]
pub fn is_scalar(name: &str) -> bool {
    matches!(
        name,
        "String" | "Int" | "Float" | "Boolean" | "ID"
    ) || custom_scalars().iter().any(|(n, _)| *n == name)
}
