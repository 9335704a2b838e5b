use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::coerce::date_from_str;
use crate::error::{Result, SbciError};
use crate::season::{is_under_18, season_sequence, Season};
use crate::settings::load_settings;

const DOB_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

pub fn run(dob: &str, season: Option<&str>, brackets: bool) -> Result<()> {
    let dob = date_from_str(dob, DOB_FORMATS, false)?
        .ok_or_else(|| SbciError::Other("a date of birth is required".to_string()))?;

    if brackets {
        let settings = load_settings();
        let table = settings.brackets()?;
        match table.find(dob)? {
            Some(b) => println!("{dob}: {}", b.name.green().bold()),
            None => println!("{dob}: {}", "no age group".yellow()),
        }
        return Ok(());
    }

    let seasons: Vec<Season> = match season {
        Some(s) => vec![s.parse()?],
        None => season_sequence().collect(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Season", "Label", "Age Group"]);
    for season in &seasons {
        let group = match season.age_group_of(dob)? {
            Some(ag) => Cell::new(ag.label().green()),
            None => Cell::new("none".yellow()),
        };
        table.add_row(vec![Cell::new(season), Cell::new(season.label()), group]);
    }
    println!("Date of birth {dob}\n{table}");

    let today = chrono::Local::now().date_naive();
    if is_under_18(dob, today) {
        println!("{}", "Under 18 at the end of the current season".bold());
    }
    Ok(())
}
