use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Fixture generation settings, read from a YAML file.
///
/// Every field has a default, so a partial (or missing) file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Seed for deterministic generation
    pub seed: u64,

    /// Number of schools under the single generated district
    pub school_count: usize,

    /// Number of families (guardians plus their children) per school
    pub families_per_school: usize,

    /// Inclusive (min, max) number of students per family
    pub children_per_family: (usize, usize),

    /// Inclusive (min, max) number of parents or guardians per family
    pub guardians_per_family: (usize, usize),

    /// Calendar year the school year ends in, e.g. 2026 for 2025-26
    pub school_year: i32,

    /// Grade codes students are drawn from
    pub grades: Vec<String>,

    /// Course titles offered at every school; one class is scheduled per course
    pub courses: Vec<String>,

    /// Two-letter state code for generated addresses
    pub state: String,

    /// `sourceSystemName` written to the manifest
    pub source_system_name: String,

    /// `sourceSystemCode` written to the manifest
    pub source_system_code: String,
}

fn default_children() -> (usize, usize) {
    (1, 3)
}

fn default_guardians() -> (usize, usize) {
    (1, 2)
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            school_count: 2,
            families_per_school: 10,
            children_per_family: default_children(),
            guardians_per_family: default_guardians(),
            school_year: 2026,
            grades: ["09", "10", "11", "12"].map(String::from).to_vec(),
            courses: ["Algebra I", "English 9", "Biology", "World History"]
                .map(String::from)
                .to_vec(),
            state: "IL".to_string(),
            source_system_name: "oneroster-mocker".to_string(),
            source_system_code: "MOCK".to_string(),
        }
    }
}

impl FixtureConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FixtureConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.school_count == 0 {
            return Err(CliError::InvalidConfig(
                "school_count must be at least 1".to_string(),
            ));
        }
        for (name, (min, max)) in [
            ("children_per_family", self.children_per_family),
            ("guardians_per_family", self.guardians_per_family),
        ] {
            if min == 0 || min > max {
                return Err(CliError::InvalidConfig(format!(
                    "{name} must be a range with 1 <= min <= max, got ({min}, {max})"
                )));
            }
        }
        if let Some(bad) = self
            .grades
            .iter()
            .find(|g| oneroster_csvs::parse_grade_token(g).is_none() || g.contains('-'))
        {
            return Err(CliError::InvalidConfig(format!("Unknown grade code: {bad}")));
        }
        if self.grades.is_empty() {
            return Err(CliError::InvalidConfig("grades must not be empty".to_string()));
        }
        if !(1000..=9999).contains(&self.school_year) {
            return Err(CliError::InvalidConfig(format!(
                "school_year must be a 4-digit year, got {}",
                self.school_year
            )));
        }
        Ok(())
    }
}
