use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] oneroster_csvs::CsvError),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Fixture generation failed: {0}")]
    FixtureGeneration(String),

    #[error("Unrecognized entity file: {0}")]
    UnrecognizedFile(String),

    #[error("Validation failed: {invalid_rows} invalid row(s) across {files} file(s)")]
    ValidationFailed { files: usize, invalid_rows: usize },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
