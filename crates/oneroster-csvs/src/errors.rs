use std::fmt;

use thiserror::Error;

pub type CsvResult<T> = Result<T, CsvError>;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Missing required header in {file}: {header}")]
    MissingHeader { file: String, header: String },

    /// Raised by the encoder when a row value does not satisfy its schema.
    /// Row values are expected to be validated before encoding, so this is a
    /// bug in the caller.
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("{file}: {} invalid row(s)", .rows.len())]
    InvalidRows {
        file: String,
        rows: Vec<(u64, RowErrors)>,
    },
}

/// Field-scoped decode failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    InvalidEnumValue,
    InvalidDateFormat,
    InvalidDateTimeFormat,
    InvalidYear,
    InvalidGradeToken,
    InvalidBooleanFlag,
    RequiredFieldMissing,
    CrossFieldViolation,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldErrorKind::InvalidEnumValue => "invalid enum value",
            FieldErrorKind::InvalidDateFormat => "date must be YYYY-MM-DD",
            FieldErrorKind::InvalidDateTimeFormat => {
                "dateTime must be ISO 8601, e.g. 2017-04-30T00:00:00.000Z"
            }
            FieldErrorKind::InvalidYear => "year must be 4 digits",
            FieldErrorKind::InvalidGradeToken => "invalid grade token",
            FieldErrorKind::InvalidBooleanFlag => "invalid boolean flag",
            FieldErrorKind::RequiredFieldMissing => "required field missing",
            FieldErrorKind::CrossFieldViolation => "cross-field rule violated",
        };
        f.write_str(name)
    }
}

/// A single failure attached to one column of one row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {kind} ('{value}')")]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    /// The offending cell content (empty for missing values).
    pub value: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::RequiredFieldMissing, "")
    }
}

/// Every failure found while decoding one row. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowErrors(pub Vec<FieldError>);

impl RowErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count_of(&self, kind: FieldErrorKind) -> usize {
        self.0.iter().filter(|e| e.kind == kind).count()
    }

    pub fn for_field(&self, field: &str) -> Vec<&FieldError> {
        self.0.iter().filter(|e| e.field == field).collect()
    }
}

impl fmt::Display for RowErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RowErrors {}

impl IntoIterator for RowErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
