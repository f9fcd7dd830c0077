/*!
# Row Decoder

Turns one [`CellMapping`] read from a CSV line into a validated [`RowValue`].

Every declared column is decoded independently and every failure is kept, so a
caller gets all the problems of a row from a single call. Required-field checks
run once all columns are decoded, and cross-field rules only run on rows whose
columns are all individually valid. A row either decodes completely or yields
its [`RowErrors`]; partial values are never returned.
*/

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::codecs;
use crate::config::DecodeOptions;
use crate::errors::{FieldError, FieldErrorKind, RowErrors};
use crate::row::{CellMapping, FieldValue, RowValue};
use crate::schemas::{
    CrossFieldRule, EntitySchema, FieldDef, FieldKind, FILE_MODES, MANIFEST_CORE_PROPERTIES,
};

pub fn decode_row(schema: &EntitySchema, cells: &CellMapping) -> Result<RowValue, RowErrors> {
    decode_row_with(schema, cells, &DecodeOptions::default())
}

pub fn decode_row_with(
    schema: &EntitySchema,
    cells: &CellMapping,
    options: &DecodeOptions,
) -> Result<RowValue, RowErrors> {
    let mut values = BTreeMap::new();
    let mut errors = Vec::new();

    for def in schema.fields {
        let cell = cells.get(def.name);
        match decode_field(def, cell) {
            Ok(Some(value)) => {
                values.insert(def.name.to_string(), value);
            }
            Ok(None) => {}
            Err(kind) => errors.push(FieldError::new(def.name, kind, cell.unwrap_or_default())),
        }
    }

    for def in schema.required_fields() {
        let failed = errors.iter().any(|e| e.field == def.name);
        if !failed && !values.contains_key(def.name) {
            errors.push(FieldError::missing(def.name));
        }
    }

    if !errors.is_empty() {
        return Err(RowErrors(errors));
    }

    if schema.allow_extra_fields {
        for (header, cell) in cells.iter() {
            if schema.accepts_extra_field(header) {
                if let Some(text) = codecs::decode_text(Some(cell)) {
                    values.insert(header.to_string(), FieldValue::Text(text));
                }
            }
        }
    }

    for rule in schema.rules {
        if let Err(error) = check_rule(*rule, &values, options) {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        Ok(RowValue::from_parts(schema.entity, values))
    } else {
        Err(RowErrors(errors))
    }
}

fn decode_field(def: &FieldDef, cell: Option<&str>) -> Result<Option<FieldValue>, FieldErrorKind> {
    let text = |value: Option<String>| value.map(FieldValue::Text);

    Ok(match def.kind {
        FieldKind::Text | FieldKind::GuidRef => text(codecs::decode_text(cell)),
        FieldKind::Enumerated(allowed) => text(codecs::decode_enum(cell, allowed)?),
        FieldKind::Date => text(codecs::decode_date(cell)?),
        FieldKind::DateTime => text(codecs::decode_date_time(cell)?),
        FieldKind::Year => text(codecs::decode_year(cell)?),
        FieldKind::BooleanFlag | FieldKind::StrictBoolean => {
            let allowed = def.kind.boolean_vocabulary().unwrap_or_default();
            text(codecs::decode_boolean_flag(cell, allowed)?)
        }
        FieldKind::GuidRefList(format) | FieldKind::StringList(format) => {
            // An empty required list is reported as missing, so both variants
            // collapse to absence here.
            codecs::decode_list_optional(cell, format.delimiter).map(FieldValue::List)
        }
        FieldKind::Grades => codecs::decode_grades(cell)?.map(FieldValue::List),
    })
}

fn check_rule(
    rule: CrossFieldRule,
    values: &BTreeMap<String, FieldValue>,
    options: &DecodeOptions,
) -> Result<(), FieldError> {
    let text = |field: &str| values.get(field).and_then(FieldValue::as_text);

    match rule {
        CrossFieldRule::SessionDateOrder if options.enforce_session_date_order => {
            let (Some(start), Some(end)) = (text("startDate"), text("endDate")) else {
                return Ok(());
            };
            let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
            match (parse(start), parse(end)) {
                (Some(start), Some(end)) if start > end => Err(FieldError::new(
                    "endDate",
                    FieldErrorKind::CrossFieldViolation,
                    end.to_string(),
                )),
                _ => Ok(()),
            }
        }
        CrossFieldRule::TeacherOnlyPrimary if options.teacher_only_primary => {
            match (text("primary"), text("role")) {
                (Some("true"), Some(role)) if role != "teacher" => Err(FieldError::new(
                    "primary",
                    FieldErrorKind::CrossFieldViolation,
                    "true",
                )),
                _ => Ok(()),
            }
        }
        CrossFieldRule::ManifestFileMode => {
            let (Some(property), Some(value)) = (text("propertyName"), text("value")) else {
                return Ok(());
            };
            if MANIFEST_CORE_PROPERTIES.contains(&property.trim())
                || FILE_MODES.contains(&value.trim())
            {
                Ok(())
            } else {
                Err(FieldError::new(
                    "value",
                    FieldErrorKind::InvalidEnumValue,
                    value,
                ))
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{
        ACADEMIC_SESSION_SCHEMA, DEMOGRAPHICS_SCHEMA, ENROLLMENT_SCHEMA, MANIFEST_SCHEMA,
        ORG_SCHEMA, USER_SCHEMA,
    };

    fn cells(pairs: &[(&str, &str)]) -> CellMapping {
        pairs.iter().copied().collect()
    }

    fn user_cells() -> Vec<(&'static str, &'static str)> {
        vec![
            ("sourcedId", "u-1"),
            ("enabledUser", "true"),
            ("orgSourcedIds", "\"org-1,org-2\""),
            ("role", "student"),
            ("username", "jdoe"),
            ("givenName", "Jane"),
            ("familyName", "Doe"),
            ("grades", "09"),
        ]
    }

    #[test]
    fn test_decode_valid_user() {
        let row = decode_row(&USER_SCHEMA, &cells(&user_cells())).unwrap();

        assert_eq!(row.text("role"), Some("student"));
        assert_eq!(
            row.list("orgSourcedIds"),
            Some(&["org-1".to_string(), "org-2".to_string()][..])
        );
        assert_eq!(row.list("grades"), Some(&["09".to_string()][..]));
        assert!(!row.contains("middleName"));
        assert!(!row.contains("agentSourcedIds"));
    }

    #[test]
    fn test_missing_required_fields_are_aggregated() {
        let pairs: Vec<_> = user_cells()
            .into_iter()
            .filter(|(k, _)| *k != "sourcedId" && *k != "role")
            .collect();
        let errors = decode_row(&USER_SCHEMA, &cells(&pairs)).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.count_of(FieldErrorKind::RequiredFieldMissing), 2);
        assert_eq!(errors.for_field("sourcedId").len(), 1);
        assert_eq!(errors.for_field("role").len(), 1);
    }

    #[test]
    fn test_every_field_error_is_reported() {
        let mut pairs = user_cells();
        pairs.push(("dateLastModified", "last tuesday"));
        pairs.push(("status", "deleted"));
        pairs.push(("enabledUser", "yes"));
        pairs.push(("grades", "09,,10"));
        pairs.push(("orgSourcedIds", "\"\""));
        let errors = decode_row(&USER_SCHEMA, &cells(&pairs)).unwrap_err();

        let kinds: Vec<_> = errors.errors().iter().map(|e| (e.field.as_str(), e.kind)).collect();
        assert!(kinds.contains(&("dateLastModified", FieldErrorKind::InvalidDateTimeFormat)));
        assert!(kinds.contains(&("status", FieldErrorKind::InvalidEnumValue)));
        assert!(kinds.contains(&("enabledUser", FieldErrorKind::InvalidBooleanFlag)));
        assert!(kinds.contains(&("grades", FieldErrorKind::InvalidGradeToken)));
        assert!(kinds.contains(&("orgSourcedIds", FieldErrorKind::RequiredFieldMissing)));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_invalid_field_is_not_also_reported_missing() {
        let mut pairs = user_cells();
        pairs.push(("role", "janitor"));
        let errors = decode_row(&USER_SCHEMA, &cells(&pairs)).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].kind, FieldErrorKind::InvalidEnumValue);
        assert_eq!(errors.errors()[0].value, "janitor");
    }

    #[test]
    fn test_org_keeps_metadata_extras_only() {
        let org = cells(&[
            ("sourcedId", "org-1"),
            ("name", "Lincoln High School"),
            ("type", "school"),
            ("metadata.county", "Sangamon"),
            ("metadata.empty", ""),
            ("nickname", "Lincoln"),
        ]);
        let row = decode_row(&ORG_SCHEMA, &org).unwrap();

        assert_eq!(row.text("metadata.county"), Some("Sangamon"));
        assert!(!row.contains("metadata.empty"));
        assert!(!row.contains("nickname"));
    }

    #[test]
    fn test_demographics_flags() {
        let row = decode_row(
            &DEMOGRAPHICS_SCHEMA,
            &cells(&[("sourcedId", "u-1"), ("asian", "yes"), ("white", "no")]),
        )
        .unwrap();
        assert_eq!(row.text("asian"), Some("yes"));

        let errors = decode_row(
            &DEMOGRAPHICS_SCHEMA,
            &cells(&[("sourcedId", "u-1"), ("asian", "True"), ("white", "1")]),
        )
        .unwrap_err();
        assert_eq!(errors.count_of(FieldErrorKind::InvalidBooleanFlag), 2);
    }

    fn session(start: &str, end: &str) -> CellMapping {
        cells(&[
            ("sourcedId", "term-1"),
            ("title", "Fall"),
            ("type", "semester"),
            ("startDate", start),
            ("endDate", end),
            ("schoolYear", "2026"),
        ])
    }

    #[test]
    fn test_session_date_order_is_opt_in() {
        let reversed = session("2026-01-15", "2025-08-20");
        assert!(decode_row(&ACADEMIC_SESSION_SCHEMA, &reversed).is_ok());

        let errors = decode_row_with(&ACADEMIC_SESSION_SCHEMA, &reversed, &DecodeOptions::strict())
            .unwrap_err();
        assert_eq!(errors.errors()[0].field, "endDate");
        assert_eq!(errors.errors()[0].kind, FieldErrorKind::CrossFieldViolation);

        let ordered = session("2025-08-20", "2026-01-15");
        assert!(
            decode_row_with(&ACADEMIC_SESSION_SCHEMA, &ordered, &DecodeOptions::strict()).is_ok()
        );
    }

    #[test]
    fn test_cross_field_rules_wait_for_valid_fields() {
        let bad = session("2026-01-15", "2025-13-01");
        let errors =
            decode_row_with(&ACADEMIC_SESSION_SCHEMA, &bad, &DecodeOptions::strict()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].kind, FieldErrorKind::InvalidDateFormat);
    }

    #[test]
    fn test_primary_only_for_teachers_when_strict() {
        let enrollment = cells(&[
            ("sourcedId", "e-1"),
            ("classSourcedId", "c-1"),
            ("schoolSourcedId", "s-1"),
            ("userSourcedId", "u-1"),
            ("role", "student"),
            ("primary", "true"),
        ]);
        assert!(decode_row(&ENROLLMENT_SCHEMA, &enrollment).is_ok());

        let errors =
            decode_row_with(&ENROLLMENT_SCHEMA, &enrollment, &DecodeOptions::strict()).unwrap_err();
        assert_eq!(errors.for_field("primary").len(), 1);
    }

    #[test]
    fn test_manifest_file_modes() {
        let core = cells(&[("propertyName", "sourceSystemName"), ("value", "Mock SIS")]);
        assert!(decode_row(&MANIFEST_SCHEMA, &core).is_ok());

        let file = cells(&[("propertyName", "file.users"), ("value", "bulk")]);
        assert!(decode_row(&MANIFEST_SCHEMA, &file).is_ok());

        let padded = cells(&[("propertyName", "users"), ("value", " bulk ")]);
        assert!(decode_row(&MANIFEST_SCHEMA, &padded).is_ok());

        let bad = cells(&[("propertyName", "users"), ("value", "full")]);
        let errors = decode_row(&MANIFEST_SCHEMA, &bad).unwrap_err();
        assert_eq!(errors.errors()[0].field, "value");
        assert_eq!(errors.errors()[0].kind, FieldErrorKind::InvalidEnumValue);

        let empty = cells(&[("propertyName", ""), ("value", "")]);
        assert_eq!(
            decode_row(&MANIFEST_SCHEMA, &empty)
                .unwrap_err()
                .count_of(FieldErrorKind::RequiredFieldMissing),
            2
        );
    }
}
