pub mod generate_fixtures;
pub mod show_headers;
pub mod validate_csvs;
