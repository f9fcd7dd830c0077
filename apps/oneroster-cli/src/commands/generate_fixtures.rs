use crate::config::FixtureConfig;
use crate::error::{CliError, CliResult};
use chrono::NaiveDate;
use oneroster_csvs::{
    encode_rows, format_date, schemas::GENDERS, write_entity_csv, Entity, RowValue,
    ONEROSTER_VERSION,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Generate a deterministic OneRoster fixture set
pub fn execute(config: Option<PathBuf>, seed: Option<u64>, output_dir: PathBuf) -> CliResult<()> {
    let mut config = match config {
        Some(path) => FixtureConfig::load(&path)?,
        None => FixtureConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;

    info!(
        seed = config.seed,
        schools = config.school_count,
        families_per_school = config.families_per_school,
        "generating fixtures"
    );

    let roster = RosterBuilder::new(&config).build()?;

    std::fs::create_dir_all(&output_dir)?;
    for entity in Entity::ALL {
        let rows = roster.rows(entity);
        let encoded = encode_rows(entity.schema(), rows)?;
        let path = output_dir.join(entity.file_name());
        write_entity_csv(&path, entity, &encoded)?;
        info!(file = %path.display(), rows = rows.len(), "wrote");
    }

    println!("\n🎉 Fixture generation completed!");
    println!("📊 Summary:");
    for entity in Entity::ALL {
        println!("  - {:<20} {}", entity.file_name(), roster.rows(entity).len());
    }
    println!("  - Output directory: {}", output_dir.display());

    Ok(())
}

const FIRST_NAMES: &[&str] = &[
    "Ava", "Liam", "Maya", "Noah", "Zoe", "Ethan", "Isla", "Mateo", "Chloe", "Owen", "Priya",
    "Caleb", "Nora", "Diego", "Hana", "Miles",
];

const LAST_NAMES: &[&str] = &[
    "Thompson", "Garcia", "Okafor", "Nguyen", "Patel", "Johnson", "Kowalski", "Rivera", "Chen",
    "Martin", "Haddad", "Brooks", "Sato", "Lindqvist", "Moreno", "Walsh",
];

const CITIES: &[&str] = &[
    "Springfield", "Greenville", "Fairview", "Riverton", "Oak Park", "Lakewood", "Franklin",
    "Madison",
];

const STREETS: &[&str] = &[
    "Maple Ave", "Oak St", "Washington Blvd", "Lincoln Rd", "Cedar Ln", "Park Pl", "Elm St",
    "Hillcrest Dr",
];

const DISTRICT_SUFFIXES: &[&str] = &[
    "School District",
    "Public Schools",
    "Unified School District",
    "Community School District",
    "City School District",
];

const SCHOOL_SUFFIXES: &[&str] = &[
    "High School",
    "Charter High School",
    "Preparatory School",
    "Academy of Arts and Sciences",
];

const RACE_FLAGS: &[&str] = &[
    "americanIndianOrAlaskaNative",
    "asian",
    "blackOrAfricanAmerican",
    "nativeHawaiianOrOtherPacificIslander",
    "white",
];

/// Generated rows, grouped per entity file
#[derive(Debug, Default)]
pub struct Roster {
    rows: BTreeMap<Entity, Vec<RowValue>>,
}

impl Roster {
    fn push(&mut self, row: RowValue) {
        self.rows.entry(row.entity()).or_default().push(row);
    }

    pub fn rows(&self, entity: Entity) -> &[RowValue] {
        self.rows.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }
}

struct Terms {
    school_year: String,
    fall: String,
    spring: String,
    fall_start: NaiveDate,
}

struct Course {
    title: String,
    class_id: String,
}

/// Builds a district, its schools, staff, families and their enrollments
pub struct RosterBuilder<'a> {
    config: &'a FixtureConfig,
    rng: StdRng,
    roster: Roster,
    user_count: usize,
}

impl<'a> RosterBuilder<'a> {
    pub fn new(config: &'a FixtureConfig) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(config.seed),
            roster: Roster::default(),
            user_count: 0,
        }
    }

    pub fn build(mut self) -> CliResult<Roster> {
        let terms = self.academic_sessions()?;
        let district_id = self.district();

        for _ in 0..self.config.school_count {
            let school_id = self.school(&district_id);
            self.staff_user("principal", &school_id);
            let courses = self.courses(&school_id, &terms);
            for _ in 0..self.config.families_per_school {
                self.family(&school_id, &courses, &terms)?;
            }
        }

        self.manifest();
        Ok(self.roster)
    }

    /// Random v4-shaped identifier, reproducible from the seed
    fn sourced_id(&mut self) -> String {
        let mut bytes: [u8; 16] = self.rng.gen();
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        let h = hex::encode(bytes);
        format!(
            "{}-{}-{}-{}-{}",
            &h[0..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..32]
        )
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        options.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn date(&self, year: i32, month: u32, day: u32) -> CliResult<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CliError::FixtureGeneration(format!("invalid date {year}-{month}-{day}"))
        })
    }

    fn academic_sessions(&mut self) -> CliResult<Terms> {
        let end_year = self.config.school_year;
        let year_start = self.date(end_year - 1, 8, 15)?;
        let fall_end = self.date(end_year - 1, 12, 19)?;
        let spring_start = self.date(end_year, 1, 6)?;
        let year_end = self.date(end_year, 6, 12)?;

        let school_year = self.sourced_id();
        let fall = self.sourced_id();
        let spring = self.sourced_id();
        let school_year_label = end_year.to_string();

        self.roster.push(
            RowValue::new(Entity::AcademicSession)
                .with("sourcedId", school_year.as_str())
                .with("status", "active")
                .with("title", format!("{}-{} School Year", end_year - 1, end_year))
                .with("type", "schoolYear")
                .with("startDate", format_date(year_start))
                .with("endDate", format_date(year_end))
                .with("schoolYear", school_year_label.as_str()),
        );
        for (id, title, start, end) in [
            (&fall, "Fall Semester", year_start, fall_end),
            (&spring, "Spring Semester", spring_start, year_end),
        ] {
            self.roster.push(
                RowValue::new(Entity::AcademicSession)
                    .with("sourcedId", id)
                    .with("status", "active")
                    .with("title", title)
                    .with("type", "semester")
                    .with("startDate", format_date(start))
                    .with("endDate", format_date(end))
                    .with("parentSourcedId", school_year.as_str())
                    .with("schoolYear", school_year_label.as_str()),
            );
        }

        Ok(Terms {
            school_year,
            fall,
            spring,
            fall_start: year_start,
        })
    }

    fn address(&mut self, row: RowValue) -> RowValue {
        let number: u32 = self.rng.gen_range(100..=9999);
        let street = self.pick(STREETS);
        let city = self.pick(CITIES);
        let post_code: u32 = self.rng.gen_range(10000..=99999);
        row.with("metadata.address1", format!("{number} {street}"))
            .with("metadata.city", city)
            .with("metadata.postCode", post_code.to_string())
            .with("metadata.state", self.config.state.as_str())
    }

    fn district(&mut self) -> String {
        let id = self.sourced_id();
        let city = self.pick(CITIES);
        let suffix = self.pick(DISTRICT_SUFFIXES);
        let row = RowValue::new(Entity::Org)
            .with("sourcedId", id.as_str())
            .with("status", "active")
            .with("name", format!("{city} {suffix}"))
            .with("type", "district")
            .with("identifier", format!("D{:04}", self.rng.gen_range(1..=9999)));
        let row = self.address(row);
        self.roster.push(row);
        id
    }

    fn school(&mut self, district_id: &str) -> String {
        let id = self.sourced_id();
        let base = self.pick(LAST_NAMES);
        let suffix = self.pick(SCHOOL_SUFFIXES);
        let row = RowValue::new(Entity::Org)
            .with("sourcedId", id.as_str())
            .with("status", "active")
            .with("name", format!("{base} {suffix}"))
            .with("type", "school")
            .with("identifier", format!("S{:04}", self.rng.gen_range(1..=9999)))
            .with("parentSourcedId", district_id);
        let row = self.address(row);
        self.roster.push(row);
        id
    }

    /// Common user columns; usernames stay unique through a running counter
    fn user(&mut self, id: &str, role: &str, school_id: &str, family_name: &str) -> RowValue {
        self.user_count += 1;
        let given = self.pick(FIRST_NAMES);
        let username = format!(
            "{}.{}{}",
            given.to_lowercase(),
            family_name.to_lowercase(),
            self.user_count
        );
        RowValue::new(Entity::User)
            .with("sourcedId", id)
            .with("status", "active")
            .with("enabledUser", "true")
            .with_list("orgSourcedIds", [school_id])
            .with("role", role)
            .with("email", format!("{username}@example.org"))
            .with("username", username)
            .with("givenName", given)
            .with("familyName", family_name)
            .with("identifier", format!("{:06}", self.user_count))
    }

    fn staff_user(&mut self, role: &str, school_id: &str) -> String {
        let id = self.sourced_id();
        let family_name = self.pick(LAST_NAMES);
        let row = self.user(&id, role, school_id, family_name);
        self.roster.push(row);
        id
    }

    fn courses(&mut self, school_id: &str, terms: &Terms) -> Vec<Course> {
        let titles = self.config.courses.clone();
        let grades = self.config.grades.clone();
        let mut courses = Vec::new();

        for (index, title) in titles.iter().enumerate() {
            let period = index + 1;
            let course_id = self.sourced_id();
            let class_id = self.sourced_id();
            let teacher_id = self.staff_user("teacher", school_id);
            let code: String = title
                .split_whitespace()
                .filter_map(|w| w.chars().next())
                .collect::<String>()
                .to_uppercase();

            self.roster.push(
                RowValue::new(Entity::Course)
                    .with("sourcedId", course_id.as_str())
                    .with("status", "active")
                    .with("schoolYearSourcedId", terms.school_year.as_str())
                    .with("title", title)
                    .with("courseCode", format!("{code}{period:02}"))
                    .with_list("grades", grades.iter().cloned())
                    .with("orgSourcedId", school_id),
            );
            self.roster.push(
                RowValue::new(Entity::Class)
                    .with("sourcedId", class_id.as_str())
                    .with("status", "active")
                    .with("title", format!("{title} - Period {period}"))
                    .with_list("grades", grades.iter().cloned())
                    .with("courseSourcedId", course_id.as_str())
                    .with("classCode", format!("{code}{period:02}-1"))
                    .with("classType", "scheduled")
                    .with("location", format!("Room {}", 100 + period))
                    .with("schoolSourcedId", school_id)
                    .with_list("termSourcedIds", [terms.fall.as_str(), terms.spring.as_str()])
                    .with_list("periods", [period.to_string()]),
            );
            self.enrollment(&class_id, school_id, &teacher_id, "teacher", terms);

            courses.push(Course {
                title: title.clone(),
                class_id,
            });
        }

        courses
    }

    fn enrollment(
        &mut self,
        class_id: &str,
        school_id: &str,
        user_id: &str,
        role: &str,
        terms: &Terms,
    ) {
        let id = self.sourced_id();
        let row = RowValue::new(Entity::Enrollment)
            .with("sourcedId", id)
            .with("status", "active")
            .with("classSourcedId", class_id)
            .with("schoolSourcedId", school_id)
            .with("userSourcedId", user_id)
            .with("role", role)
            .with("beginDate", format_date(terms.fall_start));
        let row = if role == "teacher" {
            row.with("primary", "true")
        } else {
            row
        };
        self.roster.push(row);
    }

    fn family(&mut self, school_id: &str, courses: &[Course], terms: &Terms) -> CliResult<()> {
        let family_name = self.pick(LAST_NAMES);
        let (min_guardians, max_guardians) = self.config.guardians_per_family;
        let (min_children, max_children) = self.config.children_per_family;
        let guardian_count = self.rng.gen_range(min_guardians..=max_guardians);
        let child_count = self.rng.gen_range(min_children..=max_children);

        let guardian_ids: Vec<String> = (0..guardian_count).map(|_| self.sourced_id()).collect();
        let child_ids: Vec<String> = (0..child_count).map(|_| self.sourced_id()).collect();

        for guardian_id in &guardian_ids {
            let role = self.pick(&["parent", "guardian"]);
            let row = self
                .user(guardian_id, role, school_id, family_name)
                .with_list("agentSourcedIds", child_ids.iter().cloned())
                .with("phone", self.phone());
            self.roster.push(row);
        }

        for child_id in &child_ids {
            let grade = self
                .config
                .grades
                .choose(&mut self.rng)
                .cloned()
                .ok_or_else(|| CliError::FixtureGeneration("no grades configured".to_string()))?;
            let row = self
                .user(child_id, "student", school_id, family_name)
                .with_list("agentSourcedIds", guardian_ids.iter().cloned())
                .with_list("grades", [grade.as_str()]);
            self.roster.push(row);
            self.demographics(child_id, &grade)?;

            for course in courses {
                tracing::trace!(student = %child_id, course = %course.title, "enrolling");
                self.enrollment(&course.class_id, school_id, child_id, "student", terms);
            }
        }

        Ok(())
    }

    fn phone(&mut self) -> String {
        format!(
            "555-{:03}-{:04}",
            self.rng.gen_range(100..=999),
            self.rng.gen_range(0..=9999)
        )
    }

    fn demographics(&mut self, student_id: &str, grade: &str) -> CliResult<()> {
        // KG and the other non-numeric codes count as grade 0
        let grade_number: i32 = grade.parse().unwrap_or(0);
        let birth_year = self.config.school_year - 6 - grade_number;
        let month = self.rng.gen_range(1..=12);
        let day = self.rng.gen_range(1..=28);
        let birth_date = self.date(birth_year, month, day)?;

        let sex = self.pick(GENDERS);
        let race = self.pick(RACE_FLAGS);
        let hispanic = self.pick(&["yes", "no"]);

        let mut row = RowValue::new(Entity::Demographics)
            .with("sourcedId", student_id)
            .with("status", "active")
            .with("birthDate", format_date(birth_date))
            .with("sex", sex)
            .with("hispanicOrLatinoEthnicity", hispanic)
            .with("countryOfBirthCode", "US")
            .with("stateOfBirthAbbreviation", self.config.state.as_str());
        for flag in RACE_FLAGS {
            row = row.with(flag, if *flag == race { "true" } else { "false" });
        }
        self.roster.push(row);
        Ok(())
    }

    fn manifest(&mut self) {
        let core = [
            ("manifestVersion", "1.0".to_string()),
            ("onerosterVersion", ONEROSTER_VERSION.to_string()),
            ("fileFormat", "csv".to_string()),
            ("sourceSystemName", self.config.source_system_name.clone()),
            ("sourceSystemCode", self.config.source_system_code.clone()),
        ];
        for (property, value) in core {
            self.roster.push(
                RowValue::new(Entity::Manifest)
                    .with("propertyName", property)
                    .with("value", value),
            );
        }
        for entity in Entity::ALL {
            if entity == Entity::Manifest {
                continue;
            }
            self.roster.push(
                RowValue::new(Entity::Manifest)
                    .with("propertyName", entity.base_name())
                    .with("value", "bulk"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneroster_csvs::{read_entity_csv, DecodeOptions};
    use std::collections::HashSet;

    fn small_config() -> FixtureConfig {
        FixtureConfig {
            school_count: 1,
            families_per_school: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = small_config();
        let first = RosterBuilder::new(&config).build().unwrap();
        let second = RosterBuilder::new(&config).build().unwrap();
        for entity in Entity::ALL {
            assert_eq!(first.rows(entity), second.rows(entity));
        }

        let other = FixtureConfig {
            seed: 7,
            ..small_config()
        };
        let third = RosterBuilder::new(&other).build().unwrap();
        assert_ne!(first.rows(Entity::Org), third.rows(Entity::Org));
    }

    #[test]
    fn test_generated_rows_are_unique_and_valid() {
        let config = small_config();
        let roster = RosterBuilder::new(&config).build().unwrap();

        assert_eq!(roster.rows(Entity::Org).len(), 2);
        assert_eq!(roster.rows(Entity::AcademicSession).len(), 3);
        assert_eq!(roster.rows(Entity::Course).len(), config.courses.len());
        assert_eq!(roster.rows(Entity::Manifest).len(), 12);

        let users = roster.rows(Entity::User);
        let ids: HashSet<_> = users.iter().filter_map(|u| u.text("sourcedId")).collect();
        assert_eq!(ids.len(), users.len());

        for entity in Entity::ALL {
            let schema = entity.schema();
            for row in roster.rows(entity) {
                let cells = schema.encode(row).unwrap();
                assert_eq!(&schema.decode(&cells).unwrap(), row);
            }
        }
    }

    #[test]
    fn test_students_link_to_guardians() {
        let roster = RosterBuilder::new(&small_config()).build().unwrap();
        let users = roster.rows(Entity::User);
        let guardians: HashSet<&str> = users
            .iter()
            .filter(|u| matches!(u.text("role"), Some("parent" | "guardian")))
            .filter_map(|u| u.text("sourcedId"))
            .collect();

        let students: Vec<_> = users
            .iter()
            .filter(|u| u.text("role") == Some("student"))
            .collect();
        assert!(!students.is_empty());
        for student in students {
            let agents = student.list("agentSourcedIds").unwrap();
            assert!(agents.iter().all(|a| guardians.contains(a.as_str())));
            assert_eq!(student.list("grades").map(<[String]>::len), Some(1));
        }
    }

    #[test]
    fn test_execute_writes_readable_files() {
        let dir = tempfile::tempdir().unwrap();
        execute(None, Some(3), dir.path().to_path_buf()).unwrap();

        for entity in Entity::ALL {
            let path = dir.path().join(entity.file_name());
            assert!(path.exists(), "missing {}", entity.file_name());
            read_entity_csv(&path, entity, &DecodeOptions::strict()).unwrap();
        }
    }
}
