use clap::{ArgAction, Parser, Subcommand};
use oneroster_csvs::Entity;
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod logging;

use error::CliResult;

#[derive(Parser)]
#[command(name = "oneroster")]
#[command(about = "OneRoster CSV tools - generate and validate roster fixture files")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deterministic set of OneRoster CSV files
    GenerateFixtures {
        /// Fixture configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for deterministic generation, overrides the config file
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output directory for generated files
        #[arg(short, long, default_value = "fixtures")]
        output_dir: PathBuf,
    },

    /// Validate OneRoster CSV files or directories
    Validate {
        /// Entity files, or directories holding them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Also enforce session date order and teacher-only primary enrollments
        #[arg(long)]
        strict: bool,
    },

    /// Print the header line for an entity file
    Headers {
        /// Entity name or file name, e.g. `users` or `academicSessions.csv`
        entity: Entity,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    match cli.command {
        Commands::GenerateFixtures {
            config,
            seed,
            output_dir,
        } => commands::generate_fixtures::execute(config, seed, output_dir),

        Commands::Validate { paths, strict } => commands::validate_csvs::execute(paths, strict),

        Commands::Headers { entity } => commands::show_headers::execute(entity),
    }
}
