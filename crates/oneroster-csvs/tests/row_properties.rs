use oneroster_csvs::{
    codecs::{decode_list, encode_list},
    decode_row, encode_row, CellMapping, Entity, FieldErrorKind, RowValue, ORG_SCHEMA,
    USER_SCHEMA,
};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn full_rows() -> Vec<RowValue> {
    vec![
        RowValue::new(Entity::Org)
            .with("sourcedId", "org-1")
            .with("status", "active")
            .with("dateLastModified", "2025-08-01T12:30:00.000Z")
            .with("name", "Springfield School District")
            .with("type", "district")
            .with("identifier", "SSD-001")
            .with("metadata.city", "Springfield")
            .with("metadata.county", "Sangamon"),
        RowValue::new(Entity::User)
            .with("sourcedId", "u-1")
            .with("enabledUser", "true")
            .with_list("orgSourcedIds", ["org-2"])
            .with("role", "teacher")
            .with("username", "ateacher")
            .with_list("userIds", ["{LDAP:1234}", "{LTI:abc}"])
            .with("givenName", "Ada")
            .with("familyName", "Teacher")
            .with("email", "ada@example.org")
            .with_list("grades", ["K-5", "PK"]),
        RowValue::new(Entity::Course)
            .with("sourcedId", "course-1")
            .with("title", "Algebra I")
            .with("schoolYearSourcedId", "sy-2026")
            .with_list("grades", ["09", "10"])
            .with("orgSourcedId", "org-2")
            .with_list("subjects", ["Mathematics"]),
        RowValue::new(Entity::Class)
            .with("sourcedId", "class-1")
            .with("dateLastModified", "2025-08-01")
            .with("title", "Algebra I - Period 2")
            .with("courseSourcedId", "course-1")
            .with("classType", "scheduled")
            .with("schoolSourcedId", "org-2")
            .with_list("termSourcedIds", ["term-1", "term-2"])
            .with_list("periods", ["2"]),
        RowValue::new(Entity::Enrollment)
            .with("sourcedId", "enr-1")
            .with("classSourcedId", "class-1")
            .with("schoolSourcedId", "org-2")
            .with("userSourcedId", "u-1")
            .with("role", "teacher")
            .with("primary", "true")
            .with("beginDate", "2025-08-20"),
        RowValue::new(Entity::AcademicSession)
            .with("sourcedId", "term-1")
            .with("title", "Fall 2025")
            .with("type", "semester")
            .with("startDate", "2025-08-20")
            .with("endDate", "2025-12-19")
            .with("parentSourcedId", "sy-2026")
            .with("schoolYear", "2026"),
        RowValue::new(Entity::Demographics)
            .with("sourcedId", "u-9")
            .with("birthDate", "2011-04-02")
            .with("sex", "female")
            .with("asian", "yes")
            .with("white", "no")
            .with("hispanicOrLatinoEthnicity", "false"),
        RowValue::new(Entity::Manifest)
            .with("propertyName", "file.users")
            .with("value", "bulk"),
    ]
}

#[test]
fn test_every_entity_round_trips() {
    for row in full_rows() {
        let schema = row.entity().schema();
        let cells = encode_row(schema, &row).unwrap();
        let decoded = decode_row(schema, &cells).unwrap();
        assert_eq!(decoded, row, "round trip failed for {}", row.entity());
    }
}

#[test]
fn test_every_entity_encodes_every_column() {
    for entity in Entity::ALL {
        let schema = entity.schema();
        let cells = encode_row(schema, &RowValue::new(entity)).unwrap();
        assert_eq!(cells.headers().collect::<Vec<_>>(), schema.headers());
    }
}

#[test]
fn test_org_end_to_end() {
    let org = RowValue::new(Entity::Org)
        .with("sourcedId", "abc-1")
        .with("name", "Lincoln High School")
        .with("type", "school")
        .with("status", "active")
        .with("metadata.city", "Springfield");
    let cells = encode_row(&ORG_SCHEMA, &org).unwrap();

    assert_eq!(cells.get("type"), Some("school"));
    assert_eq!(cells.get("status"), Some("active"));
    assert_eq!(cells.get("metadata.city"), Some("Springfield"));
    for header in ORG_SCHEMA.headers() {
        let expected_blank = !org.contains(header);
        assert_eq!(cells.get(header).map(str::is_empty), Some(expected_blank));
    }
}

#[test]
fn test_user_missing_sourced_id_and_role() {
    let cells: CellMapping = [
        ("enabledUser", "true"),
        ("orgSourcedIds", "org-1"),
        ("username", "jdoe"),
        ("givenName", "Jane"),
        ("familyName", "Doe"),
    ]
    .into_iter()
    .collect();

    let errors = decode_row(&USER_SCHEMA, &cells).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .errors()
        .iter()
        .all(|e| e.kind == FieldErrorKind::RequiredFieldMissing));
    let mut fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["role", "sourcedId"]);
}

#[test]
fn test_grade_cells() {
    let user = |grades: &str| -> CellMapping {
        [
            ("sourcedId", "u-1"),
            ("enabledUser", "true"),
            ("orgSourcedIds", "org-1"),
            ("role", "student"),
            ("username", "jdoe"),
            ("givenName", "Jane"),
            ("familyName", "Doe"),
            ("grades", grades),
        ]
        .into_iter()
        .collect()
    };

    for ok in ["09", "K-5", "09,11-12", "\"KG,01\""] {
        assert!(decode_row(&USER_SCHEMA, &user(ok)).is_ok(), "{ok} should decode");
    }
    let ranges = decode_row(&USER_SCHEMA, &user("09,11-12")).unwrap();
    assert_eq!(ranges.list("grades").map(<[String]>::len), Some(2));

    for bad in ["13-", "09,", "09,,10", "-05", "K-5-6"] {
        let errors = decode_row(&USER_SCHEMA, &user(bad)).unwrap_err();
        assert_eq!(
            errors.count_of(FieldErrorKind::InvalidGradeToken),
            1,
            "{bad} should fail"
        );
    }
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn list_codec_round_trip(items in prop::collection::vec("[A-Za-z0-9_:{}-]{1,12}", 0..6)) {
        let cell = encode_list(&items, ',', true);
        if items.len() >= 2 {
            prop_assert!(cell.starts_with('"') && cell.ends_with('"'));
            prop_assert_eq!(&cell[1..cell.len() - 1], items.join(","));
        }
        if items.is_empty() {
            prop_assert_eq!(cell.as_str(), "");
        }
        prop_assert_eq!(decode_list(Some(cell.as_str()), ','), items);
    }

    #[test]
    fn sparse_user_rows_round_trip(
        sourced_id in "[a-z0-9-]{1,16}",
        given in "[A-Z][a-z]{1,10}",
        orgs in prop::collection::vec("[a-z0-9-]{1,8}", 1..4),
        middle in proptest::option::of("[A-Z][a-z]{1,8}"),
        role in prop::sample::select(oneroster_csvs::schemas::USER_ROLES),
    ) {
        let row = RowValue::new(Entity::User)
            .with("sourcedId", sourced_id)
            .with("enabledUser", "false")
            .with_list("orgSourcedIds", orgs)
            .with("role", role)
            .with("username", "user")
            .with("givenName", given)
            .with("familyName", "Family")
            .with_opt("middleName", middle);

        let cells = encode_row(&USER_SCHEMA, &row).unwrap();
        prop_assert_eq!(cells.len(), USER_SCHEMA.fields.len());
        prop_assert_eq!(decode_row(&USER_SCHEMA, &cells).unwrap(), row);
    }
}
