use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::csvinfo::Record;
use crate::error::{Result, SbciError};
use crate::season::{age_group_sequence, season_sequence, AgeGroup, Season};

/// Shown in a season column when no age group covers the birthdate.
pub const NO_AGE_GROUP: &str = "??";

const HTML_COLOURS: &[&str] = &[
    "brown", "cyan", "gray", "green", "lime", "magenta", "orange", "pink", "purple", "red",
    "silver", "yellow",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Html,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Html => f.write_str("html"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            other => Err(SbciError::Other(format!(
                "unknown output format: {other} (expected csv or html)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Report data
// ---------------------------------------------------------------------------

pub struct PlayerRow {
    pub name: String,
    pub dob: NaiveDate,
    /// One entry per season of the report, `None` where nothing matches.
    pub age_groups: Vec<Option<AgeGroup>>,
}

pub struct AgeGroupReport {
    pub seasons: Vec<Season>,
    pub rows: Vec<PlayerRow>,
}

impl AgeGroupReport {
    pub fn header(&self, incl_dobs: bool) -> Vec<String> {
        let mut header = vec!["Name".to_string()];
        if incl_dobs {
            header.push("Dob".to_string());
        }
        header.extend(self.seasons.iter().map(Season::to_string));
        header
    }

    pub fn cells(row: &PlayerRow, incl_dobs: bool) -> Vec<String> {
        let mut cells = vec![row.name.clone()];
        if incl_dobs {
            cells.push(row.dob.format("%Y-%m-%d").to_string());
        }
        cells.extend(row.age_groups.iter().map(|ag| match ag {
            Some(ag) => ag.to_string(),
            None => NO_AGE_GROUP.to_string(),
        }));
        cells
    }
}

/// Players from records read with the `players` schema, in record order.
pub fn players_from_records(records: &[Record]) -> Vec<(String, NaiveDate)> {
    records
        .iter()
        .filter_map(|r| Some((r.text("name")?.to_string(), r.date("dob")?)))
        .collect()
}

/// Classify every player in every season of [`season_sequence`].
pub fn build_age_group_report(players: &[(String, NaiveDate)]) -> Result<AgeGroupReport> {
    let seasons: Vec<Season> = season_sequence().collect();
    let mut rows = Vec::with_capacity(players.len());
    for (name, dob) in players {
        let age_groups = seasons
            .iter()
            .map(|season| season.age_group_of(*dob))
            .collect::<Result<Vec<_>>>()?;
        rows.push(PlayerRow {
            name: name.clone(),
            dob: *dob,
            age_groups,
        });
    }
    Ok(AgeGroupReport { seasons, rows })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn write_age_groups<W: Write>(
    report: &AgeGroupReport,
    out: W,
    format: OutputFormat,
    incl_dobs: bool,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(report, out, incl_dobs),
        OutputFormat::Html => write_html(report, out, incl_dobs),
    }
}

fn write_csv<W: Write>(report: &AgeGroupReport, out: W, incl_dobs: bool) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(report.header(incl_dobs))?;
    for row in &report.rows {
        wtr.write_record(AgeGroupReport::cells(row, incl_dobs))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Background colour per age limit, assigned in age-group sequence order.
fn colour_for(limit: u8) -> &'static str {
    let mut seen: Vec<u8> = Vec::new();
    for ag in age_group_sequence() {
        if !seen.contains(&ag.limit()) {
            seen.push(ag.limit());
        }
    }
    let idx = seen.iter().position(|&l| l == limit).unwrap_or(0);
    HTML_COLOURS[idx % HTML_COLOURS.len()]
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const HTML_HEAD: &str = "<html>
<head>
<style>
 table, th, td {
 border: 1px solid black;
 border-collapse: collapse;
 padding: 5px;
}
th {
 text-align: center;
 font-weight: bold;
}
</style>
</head>
<body>
<table>";

const BOLD_CELL: &str = "<td style=\"font-weight: bold;\">";

fn write_html<W: Write>(report: &AgeGroupReport, mut out: W, incl_dobs: bool) -> Result<()> {
    writeln!(out, "{HTML_HEAD}")?;
    writeln!(out, "<thead><tr>")?;
    for h in report.header(incl_dobs) {
        writeln!(out, "<th>{}</th>", escape_html(&h))?;
    }
    writeln!(out, "</tr></thead><tbody>")?;

    for row in &report.rows {
        writeln!(out, "<tr>")?;
        writeln!(out, "{BOLD_CELL}{}</td>", escape_html(&row.name))?;
        if incl_dobs {
            writeln!(out, "{BOLD_CELL}{}</td>", row.dob.format("%Y-%m-%d"))?;
        }
        for ag in &row.age_groups {
            match ag {
                Some(ag) => writeln!(
                    out,
                    "<td style=\"text-align: center; background-color: {};\">{ag}</td>",
                    colour_for(ag.limit())
                )?,
                None => writeln!(out, "{BOLD_CELL}{NO_AGE_GROUP}</td>")?,
            }
        }
        writeln!(out, "</tr>")?;
    }

    writeln!(out, "</tbody></table></body></html>")?;
    out.flush()?;
    Ok(())
}
