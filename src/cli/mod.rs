pub mod age_groups;
pub mod classify;
pub mod config;
pub mod read;
pub mod seasons;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sbci",
    version,
    about = "Club admin tools: vendor CSV exports, age groups and seasons."
)]
pub struct Cli {
    /// More diagnostics (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read vendor CSV exports with a built-in schema and summarize them.
    Read {
        /// CSV files to read; repeated records across files are dropped
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Schema key (see `sbci schemas`)
        #[arg(long)]
        schema: String,
        /// Keep rows in file order instead of last-row-first
        #[arg(long = "file-order")]
        file_order: bool,
    },
    /// List the built-in CSV schemas.
    Schemas,
    /// Tabulate each player's age group for every upcoming season.
    AgeGroups {
        /// CSV of players with Name and Dob columns
        players: PathBuf,
        /// Output format: csv or html
        #[arg(long, default_value = "csv")]
        format: String,
        /// Include the date of birth column
        #[arg(long)]
        dobs: bool,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show every season with its age-group birthdate ranges.
    Seasons,
    /// Classify a date of birth (YYYY-MM-DD or DD/MM/YYYY).
    Classify {
        dob: String,
        /// Only this season (e.g. S27, W26, 2026-winter)
        #[arg(long)]
        season: Option<String>,
        /// Use the age_groups table from settings instead
        #[arg(long)]
        brackets: bool,
    },
    /// Show the effective settings.
    Config {
        /// Write a default settings file if none exists
        #[arg(long)]
        init: bool,
    },
}
