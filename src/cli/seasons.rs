use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::season::{season_sequence, SeasonType};

pub fn run() -> Result<()> {
    for season in season_sequence() {
        let mut table = Table::new();
        table.set_header(vec!["Age Group", "Born From", "Born To"]);
        for ag in season.age_groups() {
            let (from, to) = ag.date_range(season.year());
            table.add_row(vec![
                Cell::new(ag.label()),
                Cell::new(from.format("%d/%m/%Y")),
                Cell::new(to.format("%d/%m/%Y")),
            ]);
        }
        let title = match season.season_type() {
            SeasonType::Summer => season.label().yellow().bold(),
            SeasonType::Winter => season.label().blue().bold(),
        };
        println!("{title} ({season})\n{table}\n");
    }
    Ok(())
}
