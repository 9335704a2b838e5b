mod cli;
mod coerce;
mod csvinfo;
mod error;
mod fmt;
mod logging;
mod report;
mod schemas;
mod season;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Read {
            files,
            schema,
            file_order,
        } => cli::read::run(&files, &schema, file_order, cli.verbose),
        Commands::Schemas => cli::read::list(),
        Commands::AgeGroups {
            players,
            format,
            dobs,
            output,
        } => cli::age_groups::run(&players, &format, dobs, output.as_deref(), cli.verbose),
        Commands::Seasons => cli::seasons::run(),
        Commands::Classify {
            dob,
            season,
            brackets,
        } => cli::classify::run(&dob, season.as_deref(), brackets),
        Commands::Config { init } => cli::config::run(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
