use crate::error::{CliError, CliResult};
use oneroster_csvs::{read_entity_csv, CsvError, DecodeOptions, Entity};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of checking one entity file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// Set when the file could not be read at all (bad headers, I/O)
    pub fatal: Option<String>,
}

impl FileReport {
    fn is_ok(&self) -> bool {
        self.invalid_rows == 0 && self.fatal.is_none()
    }
}

/// Validate entity files, or every known entity file in a directory
pub fn execute(paths: Vec<PathBuf>, strict: bool) -> CliResult<()> {
    let options = if strict {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    };

    let targets = collect_targets(&paths)?;
    info!(files = targets.len(), strict, "validating");

    let mut failed_files = 0;
    let mut invalid_rows = 0;
    for (path, entity) in &targets {
        let report = validate_file(path, *entity, &options);
        if report.is_ok() {
            println!("✅ {}: {} row(s)", path.display(), report.valid_rows);
        } else {
            failed_files += 1;
            invalid_rows += report.invalid_rows;
        }
    }

    println!(
        "\n📊 {} file(s) checked, {} failed, {} invalid row(s)",
        targets.len(),
        failed_files,
        invalid_rows
    );

    if failed_files > 0 {
        return Err(CliError::ValidationFailed {
            files: failed_files,
            invalid_rows,
        });
    }
    Ok(())
}

/// Directories expand to the entity files they contain; plain paths must be
/// named after an entity.
fn collect_targets(paths: &[PathBuf]) -> CliResult<Vec<(PathBuf, Entity)>> {
    let mut targets = Vec::new();
    for path in paths {
        if path.is_dir() {
            let before = targets.len();
            for entity in Entity::ALL {
                let file = path.join(entity.file_name());
                if file.is_file() {
                    targets.push((file, entity));
                }
            }
            if targets.len() == before {
                warn!(dir = %path.display(), "no entity files found");
            }
        } else {
            let entity = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(Entity::from_file_name)
                .ok_or_else(|| CliError::UnrecognizedFile(path.display().to_string()))?;
            targets.push((path.clone(), entity));
        }
    }
    Ok(targets)
}

pub fn validate_file(path: &Path, entity: Entity, options: &DecodeOptions) -> FileReport {
    debug!(file = %path.display(), %entity, "checking");
    match read_entity_csv(path, entity, options) {
        Ok(rows) => FileReport {
            valid_rows: rows.len(),
            ..Default::default()
        },
        Err(CsvError::InvalidRows { file, rows }) => {
            for (line, errors) in &rows {
                for error in errors.errors() {
                    println!("❌ {file}:{line}: {error}");
                }
            }
            FileReport {
                invalid_rows: rows.len(),
                ..Default::default()
            }
        }
        Err(e) => {
            println!("❌ {}: {}", path.display(), e);
            FileReport {
                fatal: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_reports_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enrollments.csv");
        fs::write(
            &path,
            "sourcedId,classSourcedId,schoolSourcedId,userSourcedId,role,primary\n\
             e-1,c-1,s-1,u-1,teacher,true\n\
             e-2,c-1,s-1,u-2,student,true\n\
             e-3,c-1,s-1,u-3,janitor,\n",
        )
        .unwrap();

        let lenient = validate_file(&path, Entity::Enrollment, &DecodeOptions::default());
        assert_eq!(lenient.invalid_rows, 1);

        let strict = validate_file(&path, Entity::Enrollment, &DecodeOptions::strict());
        assert_eq!(strict.invalid_rows, 2);
        assert!(strict.fatal.is_none());
    }

    #[test]
    fn test_missing_header_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orgs.csv");
        fs::write(&path, "sourcedId,name\norg-1,Lincoln\n").unwrap();

        let report = validate_file(&path, Entity::Org, &DecodeOptions::default());
        assert!(report.fatal.is_some());
        assert!(!report.is_ok());
    }

    #[test]
    fn test_collect_targets_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("orgs.csv"), "sourcedId,name,type\n").unwrap();
        fs::write(dir.path().join("users.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let targets = collect_targets(&[dir.path().to_path_buf()]).unwrap();
        let entities: Vec<Entity> = targets.iter().map(|(_, e)| *e).collect();
        assert_eq!(entities, vec![Entity::Org, Entity::User]);

        let unknown = collect_targets(&[dir.path().join("notes.txt")]);
        assert!(matches!(unknown, Err(CliError::UnrecognizedFile(_))));
    }

    #[test]
    fn test_execute_fails_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("manifest.csv"),
            "propertyName,value\nmanifestVersion,1.0\nusers,sometimes\n",
        )
        .unwrap();

        let result = execute(vec![dir.path().to_path_buf()], false);
        assert!(matches!(
            result,
            Err(CliError::ValidationFailed { files: 1, invalid_rows: 1 })
        ));
    }
}
