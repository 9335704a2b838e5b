use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::csvinfo::{read_csv, ReadOptions, RecordOrder};
use crate::error::Result;
use crate::report::{build_age_group_report, players_from_records, write_age_groups, OutputFormat};
use crate::schemas::SchemaKind;

pub fn run(
    players: &Path,
    format: &str,
    dobs: bool,
    output: Option<&Path>,
    verbose: u8,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let schema = SchemaKind::Players.schema()?;
    let opts = ReadOptions {
        verbose,
        order: RecordOrder::FileOrder,
        phone_fixups: None,
    };
    let records = read_csv(players, &schema, &opts)?;
    let report = build_age_group_report(&players_from_records(&records))?;

    match output {
        Some(path) => {
            let out = BufWriter::new(File::create(path)?);
            write_age_groups(&report, out, format, dobs)?;
            println!("Wrote {} players to {}", report.rows.len(), path.display());
        }
        None => write_age_groups(&report, std::io::stdout().lock(), format, dobs)?,
    }
    Ok(())
}
