use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::coerce::CoerceError;
use crate::csvinfo::{CellParser, Column, CsvSchema, Initiate, RawRow, Record, Terminate, Value};
use crate::error::{Result, SbciError};
use crate::season::Season;

const DMY: &[&str] = &["%d/%m/%Y"];
const BOOKED_DATE: &[&str] = &["%d/%m/%Y", "%d%b%y", "%d%b%Y"];
const BOOKED_TIME: &[&str] = &["%I:%M:%S %p", "%H:%M:%S"];
// 26Apr2016 02:07 PM or 27Jul18 4:36 PM
const TRANSACTION_STAMP: &[&str] = &["%d%b%y %I:%M %p", "%d%b%Y %I:%M %p"];
const PLAYER_DOB: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

static ROWS_TRAILER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d*\s*rows\s*$").expect("valid trailer regex"));

/// SportsTG appends a `27 rows` line (sometimes just ` rows `).
fn is_rows_trailer(row: &RawRow) -> bool {
    ROWS_TRAILER_RE.is_match(row.first()) && row.fields.iter().skip(1).all(|f| f.trim().is_empty())
}

/// Season labels such as `2020/21 Summer` become `S21`; anything else is
/// kept as written.
fn season_code(raw: &str) -> std::result::Result<Value, CoerceError> {
    let raw = raw.trim();
    Ok(match raw.parse::<Season>() {
        Ok(season) => Value::Text(season.to_string()),
        Err(_) => Value::Text(raw.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Schema kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaKind {
    CommbankTransactions,
    TrybookingRegistrations,
    TrybookingTransactions,
    Members,
    Players,
}

pub const ALL_SCHEMAS: &[SchemaKind] = &[
    SchemaKind::CommbankTransactions,
    SchemaKind::TrybookingRegistrations,
    SchemaKind::TrybookingTransactions,
    SchemaKind::Members,
    SchemaKind::Players,
];

impl SchemaKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::CommbankTransactions => "commbank",
            Self::TrybookingRegistrations => "trybooking-rego",
            Self::TrybookingTransactions => "trybooking-xact",
            Self::Members => "members",
            Self::Players => "players",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CommbankTransactions => "CommBank Transactions",
            Self::TrybookingRegistrations => "TryBooking Registrations",
            Self::TrybookingTransactions => "TryBooking Transactions",
            Self::Members => "Competition Platform Members",
            Self::Players => "Players (name, date of birth)",
        }
    }

    pub fn schema(&self) -> Result<CsvSchema> {
        match self {
            Self::CommbankTransactions => commbank_transactions(),
            Self::TrybookingRegistrations => trybooking_registrations(),
            Self::TrybookingTransactions => trybooking_transactions(),
            Self::Members => members(),
            Self::Players => players(),
        }
    }

    /// Attributes worth showing in a summary, in display order.
    pub fn summary_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::CommbankTransactions => &["date", "amount", "description", "balance"],
            Self::TrybookingRegistrations => &[
                "date_booked",
                "player_family_name",
                "player_first_name",
                "ticket_type",
                "net_booking",
            ],
            Self::TrybookingTransactions => &["date", "kind", "customer", "debit", "credit"],
            Self::Members => &["member_id", "family_name", "first_name", "date_of_birth", "email"],
            Self::Players => &["name", "dob"],
        }
    }
}

pub fn get_by_key(key: &str) -> Result<SchemaKind> {
    ALL_SCHEMAS
        .iter()
        .find(|s| s.key() == key)
        .copied()
        .ok_or_else(|| SbciError::UnknownSchema(key.to_string()))
}

/// Drop records equal to an earlier one, keeping first occurrences in order.
/// Overlapping bank statement downloads repeat transactions.
pub fn deduplicate(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// CommBank transactions: headerless Date,Amount,Description,Balance
// ---------------------------------------------------------------------------

fn commbank_transactions() -> Result<CsvSchema> {
    Ok(CsvSchema::new(vec![
        Column::required("date", CellParser::Date(DMY), &["Date"]).not_blank(),
        Column::required("amount", CellParser::Currency, &["Amount"]).not_blank(),
        Column::required("description", CellParser::Text, &["Description"]),
        Column::optional("balance", CellParser::Currency, &["Balance"]),
    ])?
    .with_field_names(&["Date", "Amount", "Description", "Balance"]))
}

// ---------------------------------------------------------------------------
// TryBooking registrations
// ---------------------------------------------------------------------------

fn trybooking_registrations() -> Result<CsvSchema> {
    Ok(CsvSchema::new(vec![
        Column::required("first_name", CellParser::Text, &["Booking First Name"]),
        Column::required("last_name", CellParser::Text, &["Booking Last Name"]),
        Column::optional("address_1", CellParser::Text, &["Booking Address 1"]),
        Column::optional("address_2", CellParser::Text, &["Booking Address 2"]),
        Column::optional("suburb", CellParser::Text, &["Booking Suburb"]),
        Column::optional("state", CellParser::Text, &["Booking State"]),
        Column::optional("post_code", CellParser::Postcode, &["Booking Post Code"]),
        Column::ignored("country", &["Booking Country"]),
        Column::optional("telephone", CellParser::Phone, &["Booking Telephone"]),
        Column::optional("email", CellParser::Email, &["Booking Email"]),
        Column::required("booking_id", CellParser::Text, &["Booking ID"]).not_blank(),
        Column::optional("number_of_tickets", CellParser::PosInt, &["Number of Tickets"]),
        Column::required(
            "net_booking",
            CellParser::Currency,
            &["Payment Received", "Net Booking"],
        ),
        Column::optional("discount_amount", CellParser::Currency, &["Discount Amount"]),
        Column::ignored("gift_certificates", &["Gift Certificates Redeemed"]),
        Column::optional("processing_fees", CellParser::Currency, &["Processing Fees"]),
        Column::ignored("ticket_fees", &["Ticket Fees", "Box Office Fees"]),
        Column::ignored("quicksale_fees", &["Quicksale Fees"]),
        Column::ignored("quicksale", &["Quicksale", "Box Office Quicksale"]),
        Column::optional(
            "date_booked",
            CellParser::Date(BOOKED_DATE),
            &[
                "Date Booked (GMT+10:00)",
                "Date Booked (UTC+10)",
                "Date Booked (UTC+11)",
            ],
        ),
        Column::optional("time_booked", CellParser::Time(BOOKED_TIME), &["Time Booked"]),
        Column::optional(
            "permission_to_contact",
            CellParser::Boolean,
            &["Permission to Contact"],
        ),
        Column::ignored("donation", &["Donation"]),
        Column::optional(
            "season",
            CellParser::Custom(season_code),
            &["Booking Data: Season"],
        ),
        Column::optional("ticket_type", CellParser::Text, &["Ticket Type"]),
        Column::optional("ticket_price", CellParser::Currency, &["Ticket Price (AUD)"]),
        Column::optional("discount_code", CellParser::Text, &["Promotion[Discount] Code"]),
        Column::ignored("section", &["Section"]),
        Column::required("ticket_number", CellParser::Text, &["Ticket Number"]).not_blank(),
        Column::ignored("seat_row", &["Seat Row"]),
        Column::ignored("seat_number", &["Seat Number"]),
        Column::ignored("refunded_misc", &["Refunded Misc"]),
        Column::optional("refunded_amount", CellParser::Currency, &["Ticket Refunded Amount"]),
        Column::optional("status", CellParser::Text, &["Ticket Status"]),
        Column::optional("void", CellParser::Boolean, &["Void"]),
        Column::optional(
            "player_first_name",
            CellParser::Text,
            &["Ticket Data: Player First Name"],
        ),
        Column::optional(
            "player_family_name",
            CellParser::Text,
            &["Ticket Data: Player Family Name"],
        ),
    ])?
    .with_initiate(Initiate::SkipBom)
    .with_terminate(Terminate::FirstFieldEquals(" rows ")))
}

// ---------------------------------------------------------------------------
// TryBooking account transactions
// ---------------------------------------------------------------------------

fn trybooking_transactions() -> Result<CsvSchema> {
    Ok(CsvSchema::new(vec![
        Column::required("date", CellParser::DateTime(TRANSACTION_STAMP), &["Date"]).not_blank(),
        Column::required("kind", CellParser::Text, &["Transaction"]),
        Column::optional("booking_id", CellParser::Text, &["Booking ID"]),
        Column::optional("description", CellParser::Text, &["Description"]),
        Column::optional("customer", CellParser::Text, &["Customer"]),
        Column::required("debit", CellParser::Currency, &["Debit"]),
        Column::required("credit", CellParser::Currency, &["Credit"]),
    ])?
    .with_initiate(Initiate::SkipUntilPrefix("Date"))
    .with_terminate(Terminate::FirstFieldStartsWith("Total")))
}

// ---------------------------------------------------------------------------
// Competition platform member exports (SportsTG, later PlayHQ)
// ---------------------------------------------------------------------------

fn members() -> Result<CsvSchema> {
    Ok(CsvSchema::new(vec![
        Column::optional("fiba_id", CellParser::Text, &["FIBA ID Number"]),
        Column::required("member_id", CellParser::Text, &["Member ID", "Profile ID"]).not_blank(),
        Column::optional("member_no", CellParser::Text, &["Member No."]),
        Column::required("first_name", CellParser::Text, &["First Name"]),
        Column::optional("preferred_name", CellParser::Text, &["Preferred Name"]),
        Column::required("family_name", CellParser::Text, &["Family Name", "Last Name"]),
        Column::optional("date_of_birth", CellParser::Date(DMY), &["Date of Birth"]),
        Column::optional("gender", CellParser::Text, &["Gender"]),
        Column::optional("address1", CellParser::Text, &["Address 1", "Address Line 1"]),
        Column::optional("address2", CellParser::Text, &["Address 2", "Address Line 2"]),
        Column::optional("suburb", CellParser::Text, &["Suburb"]),
        Column::optional("postal_code", CellParser::PosInt, &["Postal Code", "Postcode"]),
        Column::optional("phone_home", CellParser::Phone, &["Telephone Number (Home)"]),
        Column::ignored("phone_work", &["Telephone Number (Work)"]),
        Column::optional(
            "mobile",
            CellParser::Phone,
            &["Telephone Number (Mobile)", "Mobile", "Mobile Number"],
        ),
        Column::optional("email", CellParser::Email, &["Email", "Email Address"]),
        Column::ignored("medical_notes", &["Medical Notes"]),
        Column::optional("wwc_check_number", CellParser::Text, &["WWC Check Number"]),
        Column::optional("wwc_check_expiry", CellParser::Date(DMY), &["WWC Check Expiry"]),
        Column::optional("first_registered", CellParser::Date(DMY), &["First Registered"]),
        Column::optional("last_registered", CellParser::Date(DMY), &["Last Registered"]),
        Column::optional("registered_until", CellParser::Date(DMY), &["Registered Until"]),
        Column::optional("season", CellParser::Custom(season_code), &["Season"]),
        Column::optional("season_player", CellParser::Boolean, &["Season Player ?"]),
        Column::optional(
            "season_player_financial",
            CellParser::Boolean,
            &["Season Player Financial ?"],
        ),
        Column::optional("season_coach", CellParser::Boolean, &["Season Coach"]),
        Column::ignored("bsb", &["BSB"]),
        Column::ignored("account_number", &["Account Number"]),
        Column::ignored("account_name", &["Account Name"]),
    ])?
    .with_initiate(Initiate::SkipBom)
    .with_terminate(Terminate::Custom(is_rows_trailer)))
}

// ---------------------------------------------------------------------------
// Players list fed to the age-group report
// ---------------------------------------------------------------------------

fn players() -> Result<CsvSchema> {
    Ok(CsvSchema::new(vec![
        Column::required("name", CellParser::Text, &["Name", "Player"]).not_blank(),
        Column::required("dob", CellParser::Date(PLAYER_DOB), &["Dob", "DOB", "Date of Birth"])
            .not_blank(),
    ])?
    .with_initiate(Initiate::SkipBom))
}
