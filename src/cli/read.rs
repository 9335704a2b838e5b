use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::info;

use crate::csvinfo::{read_csv, ReadOptions, Record, RecordOrder, Value};
use crate::error::Result;
use crate::fmt::money;
use crate::schemas::{deduplicate, get_by_key, ALL_SCHEMAS};
use crate::settings::load_settings;

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Amount(a)) => money(*a),
        Some(v) => v.to_string(),
    }
}

pub fn run(files: &[PathBuf], schema_key: &str, file_order: bool, verbose: u8) -> Result<()> {
    let kind = get_by_key(schema_key)?;
    let schema = kind.schema()?;
    let settings = load_settings();
    let opts = ReadOptions {
        verbose,
        order: if file_order {
            RecordOrder::FileOrder
        } else {
            RecordOrder::Reversed
        },
        phone_fixups: Some(&settings.phone_fixups),
    };

    let mut records: Vec<Record> = Vec::new();
    for file in files {
        let mut batch = read_csv(file, &schema, &opts)?;
        info!(file = %file.display(), count = batch.len(), "read");
        records.append(&mut batch);
    }
    let total = records.len();
    let records = deduplicate(records);
    let repeated = total - records.len();

    // Columns absent from every file are left out of the summary.
    let attributes: Vec<&str> = kind
        .summary_attributes()
        .iter()
        .copied()
        .filter(|a| records.iter().any(|r| r.has(a)))
        .collect();
    let mut table = Table::new();
    table.set_header(attributes.clone());
    for record in &records {
        table.add_row(
            attributes
                .iter()
                .map(|a| Cell::new(display(record.get(a))))
                .collect::<Vec<_>>(),
        );
    }

    let mut totals = Vec::new();
    for attr in &attributes {
        let amounts: Vec<f64> = records.iter().filter_map(|r| r.amount(attr)).collect();
        if !amounts.is_empty() && *attr != "balance" {
            totals.push((attr, amounts.iter().sum::<f64>()));
        }
    }

    println!("{}\n{table}", kind.name().bold());
    println!("{} records, {} repeated", records.len(), repeated);
    for (attr, sum) in totals {
        let shown = if sum < 0.0 {
            money(sum).red()
        } else {
            money(sum).green()
        };
        println!("Total {attr}: {shown}");
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Name", "Columns", "Required"]);
    for kind in ALL_SCHEMAS {
        let schema = kind.schema()?;
        let required: Vec<&str> = schema
            .columns()
            .iter()
            .filter(|c| c.presence == crate::csvinfo::Presence::Required)
            .map(|c| c.attribute.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(kind.key()),
            Cell::new(kind.name()),
            Cell::new(schema.columns().len()),
            Cell::new(required.join(", ")),
        ]);
    }
    println!("Schemas\n{table}");
    Ok(())
}
