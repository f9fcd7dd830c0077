/*!
# OneRoster CSV Schema Definitions

This crate provides the **authoritative CSV schemas and cell codecs** for the
OneRoster 1.1 CSV binding.

## Purpose

This crate serves as the **single source of truth** for the CSV data contract
between:

- **`generate-fixtures`** (producer) → Builds typed rows and writes CSV files
- **`validate`** (consumer) → Reads CSV files and reports every invalid row
- **Downstream test harnesses** → Decode fixture files back into typed rows

## Schema Files

One file per entity, header row equal to the declared columns in order:

- `orgs.csv`, `users.csv`, `courses.csv`, `classes.csv`, `enrollments.csv`
- `academicSessions.csv`, `demographics.csv`
- `manifest.csv`: `propertyName,value` pairs

## Cell Conventions

- Multi-value cells (`orgSourcedIds`, `termSourcedIds`, `grades`, ...) are
  comma-joined and always wrapped in double quotes when non-empty
- `grades` accepts grade codes and `A-B` ranges of grade codes
- Every declared column is written, even when the value is absent

## Usage

```rust
use oneroster_csvs::{decode_row, encode_row, Entity, RowValue, ORG_SCHEMA};

fn example() -> oneroster_csvs::CsvResult<()> {
    let school = RowValue::new(Entity::Org)
        .with("sourcedId", "abc-1")
        .with("name", "Lincoln High School")
        .with("type", "school")
        .with("metadata.city", "Springfield");

    let cells = encode_row(&ORG_SCHEMA, &school)?;
    assert_eq!(cells.get("identifier"), Some(""));

    let decoded = decode_row(&ORG_SCHEMA, &cells).expect("valid row");
    assert_eq!(decoded, school);
    Ok(())
}
```
*/

pub mod codecs;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod row;
pub mod schemas;
pub mod validation;

// Re-export main types for convenience
pub use codecs::{format_date, format_date_time, parse_grade_token, GradeToken};
pub use config::DecodeOptions;
pub use decoder::{decode_row, decode_row_with};
pub use encoder::{encode_row, encode_rows};
pub use errors::{CsvError, CsvResult, FieldError, FieldErrorKind, RowErrors};
pub use row::{CellMapping, FieldValue, RowValue};
pub use schemas::{
    CrossFieldRule, Entity, EntitySchema, FieldDef, FieldKind, ListFormat,
    ACADEMIC_SESSION_SCHEMA, CLASS_SCHEMA, COURSE_SCHEMA, DEMOGRAPHICS_SCHEMA, ENROLLMENT_SCHEMA,
    MANIFEST_SCHEMA, ONEROSTER_VERSION, ORG_SCHEMA, USER_SCHEMA,
};
pub use validation::{
    read_entity_csv, read_entity_csv_from, write_entity_csv, write_entity_csv_to,
};
