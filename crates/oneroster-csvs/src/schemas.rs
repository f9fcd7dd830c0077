/*!
# Entity Schemas

This module defines the authoritative column layout of every OneRoster 1.1 CSV
file. The schemas are plain static data: an ordered list of [`FieldDef`]s per
entity, plus the cross-field rules the decoder applies once every column of a
row has decoded.

Both the fixture generator (producer) and the validator (consumer) go through
these tables, so a header change here changes both sides at once.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codecs::{BOOLEAN_FLAGS, DEFAULT_DELIMITER, STRICT_BOOLEANS};
use crate::errors::{CsvError, CsvResult, RowErrors};
use crate::row::{CellMapping, RowValue};

/// OneRoster version these schemas follow
pub const ONEROSTER_VERSION: &str = "1.1";

// ================================================================================================
// Vocabularies
// ================================================================================================

pub const STATUS_VALUES: &[&str] = &["active", "inactive", "tobedeleted"];

pub const ORG_TYPES: &[&str] = &[
    "district",
    "school",
    "department",
    "local",
    "state",
    "national",
];

pub const USER_ROLES: &[&str] = &[
    "aide",
    "counselor",
    "districtAdministrator",
    "guardian",
    "parent",
    "principal",
    "proctor",
    "relative",
    "siteAdministrator",
    "student",
    "systemAdministrator",
    "teacher",
];

/// Deliberately not shared with [`USER_ROLES`]: enrollments only know a
/// generic `administrator`.
pub const ENROLLMENT_ROLES: &[&str] = &[
    "student",
    "teacher",
    "parent",
    "guardian",
    "relative",
    "aide",
    "administrator",
];

pub const CLASS_TYPES: &[&str] = &["scheduled", "homeroom"];

pub const SESSION_TYPES: &[&str] = &["term", "gradingPeriod", "schoolYear", "semester"];

pub const GENDERS: &[&str] = &["female", "male"];

pub const FILE_MODES: &[&str] = &["bulk", "delta", "absent"];

pub const MANIFEST_CORE_PROPERTIES: &[&str] = &[
    "fileFormat",
    "manifestVersion",
    "onerosterVersion",
    "sourceSystemName",
    "sourceSystemCode",
];

// ================================================================================================
// Field definitions
// ================================================================================================

/// How a multi-value cell is split and joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFormat {
    pub delimiter: char,
    pub quote_on_encode: bool,
}

impl ListFormat {
    pub const DEFAULT: ListFormat = ListFormat {
        delimiter: DEFAULT_DELIMITER,
        quote_on_encode: true,
    };
}

impl Default for ListFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Enumerated(&'static [&'static str]),
    Date,
    DateTime,
    Year,
    /// Only checked for non-emptiness; sourcedIds are not required to be UUIDs.
    GuidRef,
    GuidRefList(ListFormat),
    StringList(ListFormat),
    Grades,
    /// `true`, `false`, `yes` or `no`.
    BooleanFlag,
    /// `true` or `false` only.
    StrictBoolean,
}

impl FieldKind {
    /// Kinds whose typed value is a list rather than a single string.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FieldKind::GuidRefList(_) | FieldKind::StringList(_) | FieldKind::Grades
        )
    }

    pub fn boolean_vocabulary(&self) -> Option<&'static [&'static str]> {
        match self {
            FieldKind::BooleanFlag => Some(BOOLEAN_FLAGS),
            FieldKind::StrictBoolean => Some(STRICT_BOOLEANS),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Column header, also the key in cell mappings and row values.
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        required: true,
        kind,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        required: false,
        kind,
    }
}

const GUID_LIST: FieldKind = FieldKind::GuidRefList(ListFormat::DEFAULT);
const STRING_LIST: FieldKind = FieldKind::StringList(ListFormat::DEFAULT);
const STATUS: FieldKind = FieldKind::Enumerated(STATUS_VALUES);

/// Row-level rules checked after every field decoded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossFieldRule {
    /// `startDate <= endDate`. Only enforced when
    /// [`DecodeOptions::enforce_session_date_order`](crate::DecodeOptions) is set.
    SessionDateOrder,
    /// `primary` may only be `true` for teachers. Only enforced when
    /// [`DecodeOptions::teacher_only_primary`](crate::DecodeOptions) is set.
    TeacherOnlyPrimary,
    /// Non-core manifest properties name a file and take a file mode.
    ManifestFileMode,
}

// ================================================================================================
// Entities
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    Org,
    User,
    Course,
    Class,
    Enrollment,
    AcademicSession,
    Demographics,
    Manifest,
}

impl Entity {
    pub const ALL: [Entity; 8] = [
        Entity::Manifest,
        Entity::AcademicSession,
        Entity::Org,
        Entity::Course,
        Entity::Class,
        Entity::User,
        Entity::Enrollment,
        Entity::Demographics,
    ];

    /// File base name, as used for manifest property names.
    pub fn base_name(&self) -> &'static str {
        match self {
            Entity::Org => "orgs",
            Entity::User => "users",
            Entity::Course => "courses",
            Entity::Class => "classes",
            Entity::Enrollment => "enrollments",
            Entity::AcademicSession => "academicSessions",
            Entity::Demographics => "demographics",
            Entity::Manifest => "manifest",
        }
    }

    /// Singular record name, e.g. `AcademicSession` for `academicSessions.csv`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Entity::Org => "Org",
            Entity::User => "User",
            Entity::Course => "Course",
            Entity::Class => "Class",
            Entity::Enrollment => "Enrollment",
            Entity::AcademicSession => "AcademicSession",
            Entity::Demographics => "Demographics",
            Entity::Manifest => "Manifest",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.base_name())
    }

    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            Entity::Org => &ORG_SCHEMA,
            Entity::User => &USER_SCHEMA,
            Entity::Course => &COURSE_SCHEMA,
            Entity::Class => &CLASS_SCHEMA,
            Entity::Enrollment => &ENROLLMENT_SCHEMA,
            Entity::AcademicSession => &ACADEMIC_SESSION_SCHEMA,
            Entity::Demographics => &DEMOGRAPHICS_SCHEMA,
            Entity::Manifest => &MANIFEST_SCHEMA,
        }
    }

    /// Resolve a CSV file name such as `users.csv` back to its entity.
    pub fn from_file_name(file_name: &str) -> Option<Entity> {
        let base = file_name.strip_suffix(".csv")?;
        Entity::ALL.into_iter().find(|e| e.base_name() == base)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

impl FromStr for Entity {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_end_matches(".csv");
        Entity::ALL
            .into_iter()
            .find(|e| {
                e.base_name().eq_ignore_ascii_case(wanted)
                    || e.type_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CsvError::SchemaValidation(format!("Unknown entity: {s}")))
    }
}

/// Column layout and rules for one entity file.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity: Entity,
    /// Declared columns, in header order.
    pub fields: &'static [FieldDef],
    /// Open schemas accept extra columns starting with `extra_field_prefix`.
    pub allow_extra_fields: bool,
    pub extra_field_prefix: &'static str,
    pub rules: &'static [CrossFieldRule],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Whether an undeclared column may be carried as a free-form string.
    pub fn accepts_extra_field(&self, name: &str) -> bool {
        self.allow_extra_fields
            && self.field(name).is_none()
            && name.len() > self.extra_field_prefix.len()
            && name.starts_with(self.extra_field_prefix)
    }

    pub fn encode(&self, value: &RowValue) -> CsvResult<CellMapping> {
        crate::encoder::encode_row(self, value)
    }

    pub fn decode(&self, cells: &CellMapping) -> Result<RowValue, RowErrors> {
        crate::decoder::decode_row(self, cells)
    }
}

// ================================================================================================
// orgs.csv
// ================================================================================================

pub static ORG_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Org,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::DateTime),
        required("name", FieldKind::Text),
        required("type", FieldKind::Enumerated(ORG_TYPES)),
        optional("identifier", FieldKind::Text),
        optional("parentSourcedId", FieldKind::GuidRef),
        optional("metadata.address1", FieldKind::Text),
        optional("metadata.address2", FieldKind::Text),
        optional("metadata.city", FieldKind::Text),
        optional("metadata.postCode", FieldKind::Text),
        optional("metadata.state", FieldKind::Text),
    ],
    allow_extra_fields: true,
    extra_field_prefix: "metadata.",
    rules: &[],
};

// ================================================================================================
// users.csv
// ================================================================================================

pub static USER_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::User,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::DateTime),
        required("enabledUser", FieldKind::StrictBoolean),
        required("orgSourcedIds", GUID_LIST),
        required("role", FieldKind::Enumerated(USER_ROLES)),
        required("username", FieldKind::Text),
        // {Type:Id} pairs, e.g. "{LDAP:12345},{LTI:abc}"
        optional("userIds", STRING_LIST),
        required("givenName", FieldKind::Text),
        required("familyName", FieldKind::Text),
        optional("middleName", FieldKind::Text),
        optional("identifier", FieldKind::Text),
        optional("email", FieldKind::Text),
        optional("sms", FieldKind::Text),
        optional("phone", FieldKind::Text),
        optional("agentSourcedIds", GUID_LIST),
        optional("grades", FieldKind::Grades),
        optional("password", FieldKind::Text),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[],
};

// ================================================================================================
// courses.csv
// ================================================================================================

pub static COURSE_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Course,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::DateTime),
        optional("schoolYearSourcedId", FieldKind::GuidRef),
        required("title", FieldKind::Text),
        optional("courseCode", FieldKind::Text),
        optional("grades", FieldKind::Grades),
        required("orgSourcedId", FieldKind::GuidRef),
        optional("subjects", STRING_LIST),
        optional("subjectCodes", STRING_LIST),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[],
};

// ================================================================================================
// classes.csv
// ================================================================================================

pub static CLASS_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Class,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::Date),
        required("title", FieldKind::Text),
        optional("grades", FieldKind::Grades),
        optional("courseSourcedId", FieldKind::GuidRef),
        optional("classCode", FieldKind::Text),
        required("classType", FieldKind::Enumerated(CLASS_TYPES)),
        optional("location", FieldKind::Text),
        required("schoolSourcedId", FieldKind::GuidRef),
        required("termSourcedIds", GUID_LIST),
        optional("subjects", STRING_LIST),
        optional("subjectCodes", STRING_LIST),
        optional("periods", STRING_LIST),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[],
};

// ================================================================================================
// enrollments.csv
// ================================================================================================

pub static ENROLLMENT_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Enrollment,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::Date),
        required("classSourcedId", FieldKind::GuidRef),
        required("schoolSourcedId", FieldKind::GuidRef),
        required("userSourcedId", FieldKind::GuidRef),
        required("role", FieldKind::Enumerated(ENROLLMENT_ROLES)),
        optional("primary", FieldKind::StrictBoolean),
        // beginDate is inclusive, endDate exclusive
        optional("beginDate", FieldKind::Date),
        optional("endDate", FieldKind::Date),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[CrossFieldRule::TeacherOnlyPrimary],
};

// ================================================================================================
// academicSessions.csv
// ================================================================================================

pub static ACADEMIC_SESSION_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::AcademicSession,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::Date),
        required("title", FieldKind::Text),
        required("type", FieldKind::Enumerated(SESSION_TYPES)),
        required("startDate", FieldKind::Date),
        required("endDate", FieldKind::Date),
        optional("parentSourcedId", FieldKind::GuidRef),
        // year the session ends in
        required("schoolYear", FieldKind::Year),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[CrossFieldRule::SessionDateOrder],
};

// ================================================================================================
// demographics.csv
// ================================================================================================

pub static DEMOGRAPHICS_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Demographics,
    fields: &[
        required("sourcedId", FieldKind::GuidRef),
        optional("status", STATUS),
        optional("dateLastModified", FieldKind::DateTime),
        optional("birthDate", FieldKind::Date),
        optional("sex", FieldKind::Enumerated(GENDERS)),
        optional("americanIndianOrAlaskaNative", FieldKind::BooleanFlag),
        optional("asian", FieldKind::BooleanFlag),
        optional("blackOrAfricanAmerican", FieldKind::BooleanFlag),
        optional("nativeHawaiianOrOtherPacificIslander", FieldKind::BooleanFlag),
        optional("white", FieldKind::BooleanFlag),
        optional("demographicRaceTwoOrMoreRaces", FieldKind::BooleanFlag),
        optional("hispanicOrLatinoEthnicity", FieldKind::BooleanFlag),
        optional("countryOfBirthCode", FieldKind::Text),
        optional("stateOfBirthAbbreviation", FieldKind::Text),
        optional("cityOfBirth", FieldKind::Text),
        optional("publicSchoolResidenceStatus", FieldKind::Text),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[],
};

// ================================================================================================
// manifest.csv
// ================================================================================================

/// Rows are heterogeneous `propertyName,value` pairs; see
/// [`CrossFieldRule::ManifestFileMode`].
pub static MANIFEST_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Manifest,
    fields: &[
        required("propertyName", FieldKind::Text),
        required("value", FieldKind::Text),
    ],
    allow_extra_fields: false,
    extra_field_prefix: "",
    rules: &[CrossFieldRule::ManifestFileMode],
};
