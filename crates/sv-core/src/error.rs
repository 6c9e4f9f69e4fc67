use crate::ids::UnitId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when building or loading core data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A dice expression such as "2D6" or "D3+1" could not be parsed.
    #[error("invalid dice expression: \"{0}\"")]
    InvalidDice(String),

    /// A field held a value that cannot be coerced to its typed form.
    #[error("invalid value for {field}: {value}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value, as text.
        value: String,
    },

    /// A required field was absent from a record.
    #[error("missing field '{field}' in {record}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
        /// Identifier of the record being loaded.
        record: String,
    },

    /// Two units on one board share the same identifier.
    #[error("duplicate unit id: {0}")]
    DuplicateUnit(UnitId),

    /// The input was not valid JSON for the expected shape.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
