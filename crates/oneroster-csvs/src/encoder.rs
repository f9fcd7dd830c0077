/*!
# Row Encoder

Turns a [`RowValue`] into the [`CellMapping`] written to disk. The output
always carries every declared column of the schema, in header order, so sparse
values never produce short rows.
*/

use crate::codecs::{self, encode_list, DEFAULT_DELIMITER};
use crate::errors::{CsvError, CsvResult};
use crate::row::{CellMapping, FieldValue, RowValue};
use crate::schemas::{EntitySchema, FieldDef, FieldKind};

/// Encode one row.
///
/// Missing fields, required or not, encode as empty cells. Present values must
/// already satisfy their field kind; anything else is reported as
/// [`CsvError::InvalidFieldValue`].
pub fn encode_row(schema: &EntitySchema, value: &RowValue) -> CsvResult<CellMapping> {
    if value.entity() != schema.entity {
        return Err(CsvError::SchemaValidation(format!(
            "cannot encode a {} row with the {} schema",
            value.entity(),
            schema.entity
        )));
    }

    let mut cells: CellMapping = schema.fields.iter().map(|f| (f.name, "")).collect();
    let mut extras = Vec::new();

    for (name, field_value) in value.iter() {
        match schema.field(name) {
            Some(def) => cells.insert(name, encode_field(def, field_value)?),
            None if schema.accepts_extra_field(name) => {
                let text = field_value
                    .as_text()
                    .ok_or_else(|| invalid(name, "extra columns hold a single string"))?;
                extras.push((name, text));
            }
            None => {
                return Err(invalid(
                    name,
                    &format!("not a column of {}", schema.entity.file_name()),
                ))
            }
        }
    }

    // RowValue iterates in key order, so extras come out sorted.
    for (name, text) in extras {
        cells.insert(name, text);
    }

    Ok(cells)
}

/// Encode a batch of rows against one schema, stopping at the first defect.
pub fn encode_rows<'a, I>(schema: &EntitySchema, values: I) -> CsvResult<Vec<CellMapping>>
where
    I: IntoIterator<Item = &'a RowValue>,
{
    values
        .into_iter()
        .map(|value| encode_row(schema, value))
        .collect()
}

fn encode_field(def: &FieldDef, value: &FieldValue) -> CsvResult<String> {
    match (def.kind, value) {
        (_, FieldValue::Text(_)) if value.is_empty() && !def.kind.is_list() => Ok(String::new()),
        (FieldKind::Text | FieldKind::GuidRef, FieldValue::Text(text)) => Ok(text.clone()),
        (FieldKind::Enumerated(allowed), FieldValue::Text(text)) => {
            check(def, text, allowed.contains(&text.as_str()), "not in vocabulary")
        }
        (FieldKind::Date, FieldValue::Text(text)) => {
            check(def, text, codecs::is_date(text), "expected YYYY-MM-DD")
        }
        (FieldKind::DateTime, FieldValue::Text(text)) => check(
            def,
            text,
            codecs::is_date_time(text),
            "expected an ISO 8601 date or UTC date-time",
        ),
        (FieldKind::Year, FieldValue::Text(text)) => {
            check(def, text, codecs::is_year(text), "expected a 4-digit year")
        }
        (FieldKind::BooleanFlag | FieldKind::StrictBoolean, FieldValue::Text(text)) => {
            let allowed = def.kind.boolean_vocabulary().unwrap_or_default();
            check(def, text, allowed.contains(&text.as_str()), "not a boolean flag")
        }
        (FieldKind::GuidRefList(format) | FieldKind::StringList(format), FieldValue::List(items)) => {
            check_list_items(def, items, format.delimiter)?;
            Ok(encode_list(items, format.delimiter, format.quote_on_encode))
        }
        (FieldKind::Grades, FieldValue::List(tokens)) => {
            if let Some(bad) = tokens.iter().find(|t| codecs::parse_grade_token(t).is_none()) {
                return Err(invalid(def.name, &format!("invalid grade token '{bad}'")));
            }
            check_list_items(def, tokens, DEFAULT_DELIMITER)?;
            Ok(encode_list(tokens, DEFAULT_DELIMITER, true))
        }
        (kind, FieldValue::List(_)) if !kind.is_list() => {
            Err(invalid(def.name, "expected a single value, got a list"))
        }
        _ => Err(invalid(def.name, "expected a list, got a single value")),
    }
}

/// List items must survive a decode: no blanks, no embedded delimiters, no
/// padding that the decoder would trim away. A leading or trailing quote is
/// also refused, since a file read strips it as the cell's own quoting.
fn check_list_items(def: &FieldDef, items: &[String], delimiter: char) -> CsvResult<()> {
    for item in items {
        if item.trim().is_empty()
            || item.contains(delimiter)
            || item.trim() != item
            || item.starts_with('"')
            || item.ends_with('"')
        {
            return Err(invalid(
                def.name,
                &format!("list item '{item}' cannot be encoded losslessly"),
            ));
        }
    }
    Ok(())
}

fn check(def: &FieldDef, text: &str, ok: bool, reason: &str) -> CsvResult<String> {
    if ok {
        Ok(text.to_string())
    } else {
        Err(invalid(def.name, &format!("{reason} ('{text}')")))
    }
}

fn invalid(field: &str, reason: &str) -> CsvError {
    CsvError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
