//! Column-mapping CSV reader.
//!
//! A [`CsvSchema`] declares the logical columns of a vendor export, each with
//! the header spellings it has used over time. [`read_csv`] reconciles a file's
//! header row against the schema, fails fast when a required column is
//! missing, and turns every data row into a [`Record`] keyed by attribute name.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, trace, warn};

use crate::coerce::{self, CoerceError, PhoneFixups};
use crate::error::{Result, SbciError};

// ---------------------------------------------------------------------------
// Values and records
// ---------------------------------------------------------------------------

/// A parsed cell. `Null` marks a permitted-empty cell.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Amount(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

// Amounts are always finite (the currency coercer rejects NaN/inf), so
// equality on them is total.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Text(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Amount(f) => {
                let f = if *f == 0.0 { 0.0 } else { *f };
                f.to_bits().hash(state)
            }
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Amount(a) => f.write_str(&crate::fmt::amount(*a)),
            Value::Bool(b) => f.write_str(if *b { "yes" } else { "no" }),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(a: f64) -> Self {
        Value::Amount(a)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

/// One parsed data row. Only attributes whose header was present in the file
/// are populated; an absent attribute reads back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields.get(attribute)
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.fields.contains_key(attribute)
    }

    pub fn text(&self, attribute: &str) -> Option<&str> {
        match self.get(attribute)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn amount(&self, attribute: &str) -> Option<f64> {
        match self.get(attribute)? {
            Value::Amount(a) => Some(*a),
            _ => None,
        }
    }

    pub fn date(&self, attribute: &str) -> Option<NaiveDate> {
        match self.get(attribute)? {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn set(&mut self, attribute: &str, value: Value) {
        self.fields.insert(attribute.to_string(), value);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .attributes()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "Record({})", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Column descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Ignored,
}

pub type CustomParser = fn(&str) -> std::result::Result<Value, CoerceError>;

#[derive(Debug, Clone)]
pub enum CellParser {
    /// Trimmed text.
    Text,
    Date(&'static [&'static str]),
    Time(&'static [&'static str]),
    DateTime(&'static [&'static str]),
    Currency,
    Phone,
    Email,
    PosInt,
    Postcode,
    Boolean,
    Custom(CustomParser),
}

impl CellParser {
    pub fn parse(
        &self,
        raw: &str,
        allow_none: bool,
        fixups: Option<&PhoneFixups>,
    ) -> std::result::Result<Value, CoerceError> {
        let value: Value = match self {
            Self::Text => {
                let s = raw.trim();
                if s.is_empty() {
                    if !allow_none {
                        return Err(CoerceError::Empty);
                    }
                    Value::Null
                } else {
                    Value::Text(s.to_string())
                }
            }
            Self::Date(formats) => coerce::date_from_str(raw, formats, allow_none)?.into(),
            Self::Time(formats) => coerce::time_from_str(raw, formats, allow_none)?.into(),
            Self::DateTime(formats) => coerce::datetime_from_str(raw, formats, allow_none)?.into(),
            Self::Currency => coerce::currency_from_str(raw, allow_none)?.into(),
            Self::Phone => coerce::phone_from_str(raw, fixups, allow_none)?.into(),
            Self::Email => coerce::email_from_str(raw, allow_none)?.into(),
            Self::PosInt => coerce::posint_from_str(raw, allow_none)?.into(),
            Self::Postcode => coerce::postcode_from_str(raw, allow_none)?.into(),
            Self::Boolean => coerce::boolean_from_str(raw, allow_none)?.into(),
            Self::Custom(f) => {
                if raw.trim().is_empty() {
                    if !allow_none {
                        return Err(CoerceError::Empty);
                    }
                    Value::Null
                } else {
                    f(raw)?
                }
            }
        };
        Ok(value)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub attribute: String,
    pub parser: CellParser,
    pub headers: Vec<String>,
    pub presence: Presence,
    pub allow_none: bool,
}

impl Column {
    pub fn new(attribute: &str, parser: CellParser, headers: &[&str], presence: Presence) -> Self {
        Self {
            attribute: attribute.to_string(),
            parser,
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            presence,
            allow_none: true,
        }
    }

    pub fn required(attribute: &str, parser: CellParser, headers: &[&str]) -> Self {
        Self::new(attribute, parser, headers, Presence::Required)
    }

    pub fn optional(attribute: &str, parser: CellParser, headers: &[&str]) -> Self {
        Self::new(attribute, parser, headers, Presence::Optional)
    }

    pub fn ignored(attribute: &str, headers: &[&str]) -> Self {
        Self::new(attribute, CellParser::Text, headers, Presence::Ignored)
    }

    /// Reject blank cells instead of storing `Value::Null`.
    pub fn not_blank(mut self) -> Self {
        self.allow_none = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Stream hooks
// ---------------------------------------------------------------------------

/// Runs on the input stream before the header row is read.
#[derive(Debug, Clone)]
pub enum Initiate {
    SkipBom,
    /// Discard whole lines until one starts with the given text.
    SkipUntilPrefix(&'static str),
    Custom(fn(&mut dyn BufRead) -> std::io::Result<()>),
}

impl Initiate {
    fn run(&self, stream: &mut dyn BufRead) -> std::io::Result<()> {
        match self {
            Self::SkipBom => skip_bom(stream),
            Self::SkipUntilPrefix(prefix) => skip_until_prefix(stream, prefix),
            Self::Custom(f) => f(stream),
        }
    }
}

const BOM: &[u8] = b"\xef\xbb\xbf";

pub fn skip_bom(stream: &mut dyn BufRead) -> std::io::Result<()> {
    if stream.fill_buf()?.starts_with(BOM) {
        stream.consume(BOM.len());
    }
    Ok(())
}

pub fn skip_until_prefix(stream: &mut dyn BufRead, prefix: &str) -> std::io::Result<()> {
    skip_bom(stream)?;
    let mut skipped = 0usize;
    loop {
        let buf = stream.fill_buf()?;
        if buf.is_empty() || buf.starts_with(prefix.as_bytes()) {
            break;
        }
        let line_len = buf
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buf.len(), |i| i + 1);
        stream.consume(line_len);
        skipped += 1;
    }
    trace!(skipped, prefix, "skipped preamble lines");
    Ok(())
}

/// A data row before conversion, as seen by a [`Terminate`] predicate.
pub struct RawRow<'a> {
    pub headers: &'a [String],
    pub fields: &'a [String],
}

impl<'a> RawRow<'a> {
    pub fn first(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == header.trim())?;
        self.fields.get(idx).map(String::as_str)
    }
}

/// Decides whether a row marks the end of the data (vendor trailers).
#[derive(Debug, Clone)]
pub enum Terminate {
    FirstFieldEquals(&'static str),
    FirstFieldStartsWith(&'static str),
    Custom(fn(&RawRow) -> bool),
}

impl Terminate {
    fn matches(&self, row: &RawRow) -> bool {
        match self {
            Self::FirstFieldEquals(s) => row.first().trim() == s.trim(),
            Self::FirstFieldStartsWith(s) => row.first().trim_start().starts_with(s),
            Self::Custom(f) => f(row),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvSchema {
    columns: Vec<Column>,
    by_header: HashMap<String, usize>,
    initiate: Option<Initiate>,
    terminate: Option<Terminate>,
    field_names: Option<Vec<String>>,
}

impl CsvSchema {
    /// Build a schema, rejecting duplicate attribute names and duplicate
    /// header spellings.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut attributes: HashMap<&str, usize> = HashMap::new();
        let mut by_header: HashMap<String, usize> = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            if attributes.insert(col.attribute.as_str(), i).is_some() {
                return Err(SbciError::DuplicateAttribute(col.attribute.clone()));
            }
            for header in &col.headers {
                if let Some(prev) = by_header.insert(header.clone(), i) {
                    return Err(SbciError::DuplicateHeader {
                        header: header.clone(),
                        first: columns[prev].attribute.clone(),
                        second: col.attribute.clone(),
                    });
                }
            }
        }
        Ok(Self {
            columns,
            by_header,
            initiate: None,
            terminate: None,
            field_names: None,
        })
    }

    pub fn with_initiate(mut self, initiate: Initiate) -> Self {
        self.initiate = Some(initiate);
        self
    }

    pub fn with_terminate(mut self, terminate: Terminate) -> Self {
        self.terminate = Some(terminate);
        self
    }

    /// Use these field names instead of reading a header row from the file.
    pub fn with_field_names(mut self, names: &[&str]) -> Self {
        self.field_names = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Order of the returned records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// Each new row is placed in front: the last row of the file comes first.
    /// Bank statements list newest first, so this yields oldest first.
    #[default]
    Reversed,
    FileOrder,
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions<'a> {
    pub verbose: u8,
    pub order: RecordOrder,
    pub phone_fixups: Option<&'a PhoneFixups>,
}

/// Read a whole CSV file with `schema`. The file handle is released before
/// any row is converted.
pub fn read_csv(path: &Path, schema: &CsvSchema, opts: &ReadOptions) -> Result<Vec<Record>> {
    if opts.verbose > 0 {
        info!(file = %path.display(), "reading CSV file");
    }
    let data = {
        let mut file = std::fs::File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        data
    };
    read_csv_bytes(&path.display().to_string(), &data, schema, opts)
}

/// Same as [`read_csv`] over an in-memory buffer; `name` labels diagnostics.
pub fn read_csv_bytes(
    name: &str,
    data: &[u8],
    schema: &CsvSchema,
    opts: &ReadOptions,
) -> Result<Vec<Record>> {
    let mut stream: &[u8] = data;
    if let Some(initiate) = &schema.initiate {
        initiate.run(&mut stream)?;
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(stream);
    let mut rows = rdr.byte_records();

    let headers: Vec<String> = match &schema.field_names {
        Some(names) => names.iter().map(|n| n.trim().to_string()).collect(),
        None => match rows.next() {
            Some(header) => header?
                .iter()
                .map(|f| coerce::latin1_or_utf8(f).trim().to_string())
                .collect(),
            None => Vec::new(),
        },
    };

    let mapping = reconcile(name, &headers, schema, opts.verbose)?;

    let mut records = VecDeque::new();
    for row in rows {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        let fields: Vec<String> = row.iter().map(coerce::latin1_or_utf8).collect();
        let raw = RawRow {
            headers: &headers,
            fields: &fields,
        };
        if opts.verbose > 2 {
            trace!(line, ?fields, "row");
        }
        if let Some(terminate) = &schema.terminate {
            if terminate.matches(&raw) {
                if opts.verbose > 1 {
                    debug!(line, first = raw.first(), "terminating at trailer row");
                }
                break;
            }
        }

        let mut record = Record::default();
        for (pos, col_idx) in mapping.iter().enumerate() {
            let Some(col) = col_idx.map(|i| &schema.columns[i]) else {
                continue;
            };
            let cell = fields.get(pos).map(String::as_str).unwrap_or("");
            let value = col
                .parser
                .parse(cell, col.allow_none, opts.phone_fixups)
                .map_err(|source| SbciError::Cell {
                    file: name.to_string(),
                    line,
                    header: headers[pos].clone(),
                    attribute: col.attribute.clone(),
                    source,
                })?;
            record.set(&col.attribute, value);
        }
        if opts.verbose > 1 {
            debug!("{record}");
        }

        match opts.order {
            RecordOrder::Reversed => records.push_front(record),
            RecordOrder::FileOrder => records.push_back(record),
        }
    }

    if opts.verbose > 0 {
        info!(file = name, count = records.len(), "records read");
    }
    Ok(records.into())
}

/// Map each header position to its column, then check for missing columns.
fn reconcile(
    name: &str,
    headers: &[String],
    schema: &CsvSchema,
    verbose: u8,
) -> Result<Vec<Option<usize>>> {
    let mut missing_required: Vec<&str> = Vec::new();
    let mut missing_optional: Vec<&str> = Vec::new();
    for col in &schema.columns {
        match col.presence {
            Presence::Required => missing_required.push(&col.attribute),
            Presence::Optional => missing_optional.push(&col.attribute),
            Presence::Ignored => {}
        }
    }

    let mut mapping = Vec::with_capacity(headers.len());
    for header in headers {
        if header.is_empty() {
            mapping.push(None);
            continue;
        }
        let Some(&idx) = schema.by_header.get(header.as_str()) else {
            if verbose > 0 {
                warn!(file = name, header = %header, "unknown column header");
            }
            mapping.push(None);
            continue;
        };
        let attribute = schema.columns[idx].attribute.as_str();
        missing_required.retain(|a| *a != attribute);
        missing_optional.retain(|a| *a != attribute);
        mapping.push(Some(idx));
    }

    if !missing_required.is_empty() {
        return Err(SbciError::MissingColumns {
            file: name.to_string(),
            attributes: missing_required.iter().map(|a| a.to_string()).collect(),
        });
    }
    if !missing_optional.is_empty() && verbose > 0 {
        warn!(
            file = name,
            missing = %missing_optional.join(", "),
            "optional columns not present"
        );
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount_schema() -> CsvSchema {
        CsvSchema::new(vec![
            Column::required("date", CellParser::Date(&["%d/%m/%Y"]), &["Date"]),
            Column::required("amount", CellParser::Currency, &["Amount", "Net Booking"]),
            Column::optional("note", CellParser::Text, &["Note"]),
            Column::ignored("section", &["Section"]),
        ])
        .unwrap()
    }

    fn read(data: &str, schema: &CsvSchema, order: RecordOrder) -> Result<Vec<Record>> {
        let opts = ReadOptions {
            order,
            ..Default::default()
        };
        read_csv_bytes("test.csv", data.as_bytes(), schema, &opts)
    }

    #[test]
    fn test_schema_rejects_duplicate_attribute() {
        let err = CsvSchema::new(vec![
            Column::required("date", CellParser::Text, &["Date"]),
            Column::optional("date", CellParser::Text, &["When"]),
        ])
        .unwrap_err();
        assert!(matches!(err, SbciError::DuplicateAttribute(a) if a == "date"));
    }

    #[test]
    fn test_schema_rejects_duplicate_header() {
        let err = CsvSchema::new(vec![
            Column::required("date", CellParser::Text, &["Date"]),
            Column::optional("when", CellParser::Text, &["When", " Date "]),
        ])
        .unwrap_err();
        match err {
            SbciError::DuplicateHeader { header, first, second } => {
                assert_eq!(header, "Date");
                assert_eq!(first, "date");
                assert_eq!(second, "when");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_columns_named() {
        let schema = amount_schema();
        let err = read("Amount,Note\n1.00,x\n", &schema, RecordOrder::FileOrder).unwrap_err();
        match err {
            SbciError::MissingColumns { attributes, .. } => assert_eq!(attributes, vec!["date"]),
            other => panic!("unexpected error: {other}"),
        }

        let err = read("Note\nx\n", &schema, RecordOrder::FileOrder).unwrap_err();
        assert!(err.to_string().contains("date, amount"));
    }

    #[test]
    fn test_header_aliases_parse_identically() {
        let schema = amount_schema();
        let a = read("Date,Amount\n01/02/2024,\"1,234.50\"\n", &schema, RecordOrder::FileOrder)
            .unwrap();
        let b = read("Date,Net Booking\n01/02/2024,\"1,234.50\"\n", &schema, RecordOrder::FileOrder)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].amount("amount"), Some(1234.50));
    }

    #[test]
    fn test_unknown_headers_are_dropped() {
        let schema = amount_schema();
        let records = read(
            "Date, Amount ,Mystery,\n01/02/2024,5,??,\n",
            &schema,
            RecordOrder::FileOrder,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attributes().count(), 2);
        assert!(!records[0].has("Mystery"));
        assert!(!records[0].has("note"));
        assert_eq!(records[0].get("note"), None);
    }

    #[test]
    fn test_ignored_columns_never_required() {
        let schema = amount_schema();
        let records = read("Date,Amount\n01/02/2024,5\n", &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has("section"));
    }

    #[test]
    fn test_default_order_is_reversed() {
        let schema = amount_schema();
        let data = "Date,Amount\n01/02/2024,1\n02/02/2024,2\n03/02/2024,3\n";
        let reversed = read(data, &schema, RecordOrder::Reversed).unwrap();
        let amounts: Vec<f64> = reversed.iter().filter_map(|r| r.amount("amount")).collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);

        let in_order = read(data, &schema, RecordOrder::FileOrder).unwrap();
        let amounts: Vec<f64> = in_order.iter().filter_map(|r| r.amount("amount")).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
        assert_eq!(RecordOrder::default(), RecordOrder::Reversed);
    }

    #[test]
    fn test_terminate_drops_trailer() {
        let schema = amount_schema().with_terminate(Terminate::FirstFieldStartsWith("Total"));
        let data = "Date,Amount\n01/02/2024,1\n02/02/2024,2\nTotal for period,3\n04/02/2024,4\n";
        let records = read(data, &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].amount("amount"), Some(2.0));
    }

    #[test]
    fn test_custom_terminate_reads_cell_by_header() {
        fn blank_date(row: &RawRow) -> bool {
            row.get("Date").map_or(true, |d| d.trim().is_empty())
        }
        let schema = amount_schema().with_terminate(Terminate::Custom(blank_date));
        let data = "Amount,Date\n1,01/02/2024\n2,02/02/2024\n3,\n4,04/02/2024\n";
        let records = read(data, &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].amount("amount"), Some(2.0));
    }

    #[test]
    fn test_custom_initiate_skips_banner() {
        fn skip_banner(stream: &mut dyn BufRead) -> std::io::Result<()> {
            let mut line = String::new();
            stream.read_line(&mut line)?;
            Ok(())
        }
        let schema = amount_schema().with_initiate(Initiate::Custom(skip_banner));
        let data = "Exported by ClubDesk\nDate,Amount\n01/02/2024,1\n";
        let records = read(data, &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount("amount"), Some(1.0));
    }

    #[test]
    fn test_cell_failure_aborts_read() {
        let schema = amount_schema();
        let data = "Date,Amount\n01/02/2024,1\n02/02/2024,lots\n";
        let err = read(data, &schema, RecordOrder::FileOrder).unwrap_err();
        match err {
            SbciError::Cell { line, attribute, header, source, .. } => {
                assert_eq!(line, 3);
                assert_eq!(attribute, "amount");
                assert_eq!(header, "Amount");
                assert!(matches!(source, CoerceError::InvalidNumber(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_cells_and_short_rows() {
        let schema = CsvSchema::new(vec![
            Column::required("name", CellParser::Text, &["Name"]).not_blank(),
            Column::optional("note", CellParser::Text, &["Note"]),
        ])
        .unwrap();
        let records = read("Name,Note\nAnn\nBob,\n", &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records[0].get("note"), Some(&Value::Null));
        assert_eq!(records[1].get("note"), Some(&Value::Null));

        let err = read("Name,Note\n ,x\n", &schema, RecordOrder::FileOrder).unwrap_err();
        assert!(matches!(err, SbciError::Cell { source: CoerceError::Empty, .. }));
    }

    #[test]
    fn test_fixed_field_names_skip_header() {
        let schema = amount_schema().with_field_names(&["Date", "Amount"]);
        let records = read("01/02/2024,1\n02/02/2024,2\n", &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_initiate_skips_bom_and_preamble() {
        let schema = amount_schema().with_initiate(Initiate::SkipBom);
        let data = "\u{feff}Date,Amount\n01/02/2024,1\n";
        assert_eq!(read(data, &schema, RecordOrder::FileOrder).unwrap().len(), 1);

        let schema = amount_schema().with_initiate(Initiate::SkipUntilPrefix("Date"));
        let data = "Transactions report\nGenerated 1/2/2024,,\n\nDate,Amount\n01/02/2024,1\n";
        assert_eq!(read(data, &schema, RecordOrder::FileOrder).unwrap().len(), 1);
    }

    #[test]
    fn test_latin1_cells_decoded() {
        let schema = amount_schema();
        let mut data = b"Date,Amount,Note\n01/02/2024,1,caf".to_vec();
        data.push(0xe9);
        data.push(b'\n');
        let records = read_csv_bytes("t.csv", &data, &schema, &ReadOptions::default()).unwrap();
        assert_eq!(records[0].text("note"), Some("café"));
    }

    #[test]
    fn test_records_compare_structurally() {
        let schema = amount_schema();
        let data = "Date,Amount\n01/02/2024,1.50\n01/02/2024,1.5\n";
        let records = read(data, &schema, RecordOrder::FileOrder).unwrap();
        assert_eq!(records[0], records[1]);
        let set: std::collections::HashSet<_> = records.into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_read_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stmt.csv");
        std::fs::write(&path, "Date,Amount\n01/02/2024,1\n").unwrap();
        let records = read_csv(&path, &amount_schema(), &ReadOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date("date"), NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv(Path::new("/nonexistent/x.csv"), &amount_schema(), &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SbciError::Io(_)));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_read(verbose: u8) -> String {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(out.clone())
            .with_ansi(false)
            .finish();
        let opts = ReadOptions {
            verbose,
            ..Default::default()
        };
        let data = "Date,Amount,Colour\n01/02/2024,1,red\n";
        let records = tracing::subscriber::with_default(subscriber, || {
            read_csv_bytes("test.csv", data.as_bytes(), &amount_schema(), &opts)
        })
        .unwrap();
        assert_eq!(records.len(), 1);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_header_warnings_only_when_verbose() {
        let logs = logged_read(1);
        assert!(logs.contains("unknown column header"), "{logs}");
        assert!(logs.contains("Colour"), "{logs}");
        assert!(logs.contains("optional columns not present"), "{logs}");
        assert!(logs.contains("note"), "{logs}");

        let quiet = logged_read(0);
        assert!(!quiet.contains("unknown column header"), "{quiet}");
        assert!(!quiet.contains("optional columns not present"), "{quiet}");
    }
}
