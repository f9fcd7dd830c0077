/*!
# CSV Validation & I/O

Reads and writes whole entity files. Header checks and line framing live here;
everything about individual cells is delegated to the row encoder and decoder.
*/

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use crate::{
    config::DecodeOptions,
    decoder::decode_row_with,
    errors::{CsvError, CsvResult},
    row::{CellMapping, RowValue},
    schemas::{Entity, EntitySchema},
};

// ================================================================================================
// CSV Reading with Validation
// ================================================================================================

/// Read and validate an entity file.
///
/// Every row is decoded; if any row fails, the error lists every failing row
/// with its line number.
pub fn read_entity_csv<P: AsRef<Path>>(
    path: P,
    entity: Entity,
    options: &DecodeOptions,
) -> CsvResult<Vec<RowValue>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_entity_csv_from(file, entity, &path.display().to_string(), options)
}

pub fn read_entity_csv_from<R: Read>(
    reader: R,
    entity: Entity,
    file_label: &str,
    options: &DecodeOptions,
) -> CsvResult<Vec<RowValue>> {
    let schema = entity.schema();
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    validate_headers(&headers, schema, file_label)?;

    let mut rows = Vec::new();
    let mut invalid = Vec::new();
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        // Short records are padded on decode; extra cells would otherwise be
        // dropped, usually an unquoted multi-value cell.
        if record.len() > headers.len() {
            return Err(CsvError::SchemaValidation(format!(
                "{}:{}: {} cells for {} columns",
                file_label,
                line,
                record.len(),
                headers.len()
            )));
        }
        let cells = CellMapping::from_record(&headers, &record);
        match decode_row_with(schema, &cells, options) {
            Ok(row) => rows.push(row),
            Err(errors) => {
                debug!(file = file_label, line, %errors, "rejected row");
                invalid.push((line, errors));
            }
        }
    }

    if !invalid.is_empty() {
        return Err(CsvError::InvalidRows {
            file: file_label.to_string(),
            rows: invalid,
        });
    }

    debug!(file = file_label, rows = rows.len(), "read entity file");
    Ok(rows)
}

// ================================================================================================
// CSV Writing
// ================================================================================================

/// Write encoded rows with the entity's header line.
pub fn write_entity_csv<P: AsRef<Path>>(
    path: P,
    entity: Entity,
    rows: &[CellMapping],
) -> CsvResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_entity_csv_to(file, entity, rows)?;
    debug!(file = %path.display(), rows = rows.len(), "wrote entity file");
    Ok(())
}

pub fn write_entity_csv_to<W: Write>(
    writer: W,
    entity: Entity,
    rows: &[CellMapping],
) -> CsvResult<()> {
    let schema = entity.schema();
    let headers = output_headers(schema, rows);

    // Cells are framed by hand: list cells arrive already quoted by the
    // encoder and must not be quoted a second time.
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(&headers)?;
    for row in rows {
        let record: Vec<Cow<'_, str>> = headers
            .iter()
            .map(|header| {
                let list_cell = schema.field(header).is_some_and(|f| f.kind.is_list());
                frame_cell(row.get(header).unwrap_or_default(), list_cell)
            })
            .collect();
        wtr.write_record(record.iter().map(|cell| cell.as_bytes()))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Declared headers, then any extra columns of an open schema in key order.
fn output_headers(schema: &EntitySchema, rows: &[CellMapping]) -> Vec<String> {
    let extras: BTreeSet<&str> = rows
        .iter()
        .flat_map(CellMapping::headers)
        .filter(|h| schema.accepts_extra_field(h))
        .collect();

    schema
        .fields
        .iter()
        .map(|f| f.name.to_string())
        .chain(extras.into_iter().map(str::to_string))
        .collect()
}

/// RFC 4180 framing for one cell.
fn frame_cell(cell: &str, list_cell: bool) -> Cow<'_, str> {
    let already_quoted = cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"');
    if list_cell && already_quoted {
        let inner = &cell[1..cell.len() - 1];
        return Cow::Owned(format!("\"{}\"", inner.replace('"', "\"\"")));
    }
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

// ================================================================================================
// Header Validation
// ================================================================================================

/// Every required column must be present; optional columns may be left out
/// and read as empty cells. Unknown columns are ignored.
fn validate_headers(actual: &StringRecord, schema: &EntitySchema, file_type: &str) -> CsvResult<()> {
    let mut seen = BTreeSet::new();
    for header in actual.iter() {
        if !seen.insert(header) {
            return Err(CsvError::SchemaValidation(format!(
                "{}: duplicate header '{}'",
                file_type, header
            )));
        }
    }

    for field in schema.required_fields() {
        if !seen.contains(field.name) {
            return Err(CsvError::MissingHeader {
                file: file_type.to_string(),
                header: field.name.to_string(),
            });
        }
    }

    Ok(())
}

// ================================================================================================
// Tests
// ================================================================================================
