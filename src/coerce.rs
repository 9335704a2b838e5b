//! Scalar coercers used as per-column cell parsers.
//!
//! Every coercer takes the raw cell text and an `allow_none` flag. A blank or
//! whitespace-only cell yields `Ok(None)` when `allow_none` is set and
//! [`CoerceError::Empty`] otherwise.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoerceError {
    #[error("value is empty")]
    Empty,

    #[error("not a valid date/time for {formats}: {value:?}")]
    InvalidDate { value: String, formats: String },

    #[error("not a valid amount: {0:?}")]
    InvalidNumber(String),

    #[error("not a valid phone number: {0:?}")]
    InvalidPhone(String),

    #[error("not a valid email address: {0:?}")]
    InvalidEmail(String),

    #[error("not a valid positive integer: {0:?}")]
    InvalidPositiveInteger(String),

    #[error("not a known postcode: {0:?}")]
    UnknownPostcode(String),

    #[error("not a valid boolean string: {0:?}")]
    InvalidBoolean(String),
}

pub type CoerceResult<T> = std::result::Result<Option<T>, CoerceError>;

/// Map of normalized phone number to its corrected form.
pub type PhoneFixups = HashMap<String, String>;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

// Only the start is checked. Overseas and annotated numbers pass through.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d").expect("valid phone regex"));

/// Suburbs the club draws members from, keyed by name. A postcode may serve
/// several suburbs.
pub const POSTCODES: &[(&str, u32)] = &[
    ("Melbourne", 3000),
    ("Southbank", 3006),
    ("Hoppers Crossing", 3029),
    ("Moonee Ponds", 3039),
    ("Brunswick East", 3057),
    ("Sumner", 3057),
    ("Coburg", 3058),
    ("Fitzroy", 3065),
    ("Clifton Hill", 3068),
    ("Northcote", 3070),
    ("Thornbury", 3071),
    ("Preston", 3072),
    ("Reservoir", 3073),
    ("Fairfield", 3078),
    ("Alphington", 3078),
    ("Ivanhoe", 3079),
    ("Ivanhoe East", 3079),
    ("Heidelberg Heights", 3081),
    ("Bellfield", 3081),
    ("Eaglemont", 3084),
    ("Macleod", 3085),
    ("Macleod West", 3085),
    ("Yallambie", 3085),
    ("Watsonia", 3087),
    ("Kew", 3101),
    ("East Kew", 3102),
    ("Balwyn North", 3104),
    ("Bulleen", 3105),
    ("Doncaster", 3108),
    ("Camberwell", 3124),
    ("Camberwell East", 3126),
    ("Canterbury", 3126),
    ("Box Hill South", 3128),
    ("Prahran", 3181),
    ("Windsor", 3181),
    ("Patterson Lakes", 3197),
    ("Carrum", 3197),
    ("Albert Park", 3206),
    ("South Morang", 3752),
    ("Dulwich Hill", 2203),
    ("Como, WA", 6152),
    ("Little Lonsdale St, Vic", 8011),
];

pub fn suburbs_for_postcode(postcode: u32) -> Vec<&'static str> {
    POSTCODES
        .iter()
        .filter(|(_, pc)| *pc == postcode)
        .map(|(name, _)| *name)
        .collect()
}

fn prepare(raw: &str, allow_none: bool) -> CoerceResult<&str> {
    let s = raw.trim();
    if s.is_empty() {
        return if allow_none { Ok(None) } else { Err(CoerceError::Empty) };
    }
    Ok(Some(s))
}

fn invalid_date(value: &str, formats: &[&str]) -> CoerceError {
    CoerceError::InvalidDate {
        value: value.to_string(),
        formats: formats.join(" | "),
    }
}

/// Parse a date with the first of `formats` that matches the whole value.
pub fn date_from_str(raw: &str, formats: &[&str], allow_none: bool) -> CoerceResult<NaiveDate> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(Some)
        .ok_or_else(|| invalid_date(s, formats))
}

pub fn time_from_str(raw: &str, formats: &[&str], allow_none: bool) -> CoerceResult<NaiveTime> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    formats
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .map(Some)
        .ok_or_else(|| invalid_date(s, formats))
}

pub fn datetime_from_str(
    raw: &str,
    formats: &[&str],
    allow_none: bool,
) -> CoerceResult<NaiveDateTime> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Some)
        .ok_or_else(|| invalid_date(s, formats))
}

/// Parse an amount such as `1,234.50`, `-$50.00` or `(12.00)`.
pub fn currency_from_str(raw: &str, allow_none: bool) -> CoerceResult<f64> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    let cleaned = s.replace(',', "").replace('$', "");
    let cleaned = cleaned.trim();
    let (negate, digits) = match cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, cleaned),
    };
    let value: f64 = digits
        .parse()
        .map_err(|_| CoerceError::InvalidNumber(s.to_string()))?;
    if !value.is_finite() {
        return Err(CoerceError::InvalidNumber(s.to_string()));
    }
    Ok(Some(if negate { -value } else { value }))
}

/// Normalize an Australian phone number to its local `0`-prefixed form.
pub fn phone_from_str(
    raw: &str,
    fixups: Option<&PhoneFixups>,
    allow_none: bool,
) -> CoerceResult<String> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    let mut phone: String = s
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n' | '-' | '(' | ')' | '[' | ']' | '.'))
        .collect();
    if let Some(rest) = phone.strip_prefix('+') {
        phone = rest.to_string();
    }
    if let Some(rest) = phone.strip_prefix("61") {
        phone = format!("0{rest}");
    }
    if phone.starts_with('3') || phone.starts_with('4') {
        phone.insert(0, '0');
    }
    if let Some(fixed) = fixups.and_then(|f| f.get(&phone)) {
        return Ok(Some(fixed.clone()));
    }
    if !PHONE_RE.is_match(&phone) {
        return Err(CoerceError::InvalidPhone(s.to_string()));
    }
    Ok(Some(phone))
}

pub fn email_from_str(raw: &str, allow_none: bool) -> CoerceResult<String> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    if !EMAIL_RE.is_match(s) {
        return Err(CoerceError::InvalidEmail(s.to_string()));
    }
    Ok(Some(s.to_string()))
}

/// Digits only; leading zeros are kept (BSBs, account numbers).
pub fn posint_from_str(raw: &str, allow_none: bool) -> CoerceResult<String> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoerceError::InvalidPositiveInteger(s.to_string()));
    }
    Ok(Some(s.to_string()))
}

pub fn postcode_from_str(raw: &str, allow_none: bool) -> CoerceResult<u32> {
    let Some(digits) = posint_from_str(raw, allow_none)? else {
        return Ok(None);
    };
    let postcode: u32 = digits
        .parse()
        .map_err(|_| CoerceError::UnknownPostcode(digits.clone()))?;
    if suburbs_for_postcode(postcode).is_empty() {
        return Err(CoerceError::UnknownPostcode(digits));
    }
    Ok(Some(postcode))
}

pub fn boolean_from_str(raw: &str, allow_none: bool) -> CoerceResult<bool> {
    let Some(s) = prepare(raw, allow_none)? else {
        return Ok(None);
    };
    match s.to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" => Ok(Some(true)),
        "f" | "false" | "n" | "no" | "off" | "empty" | "none" | "nil" | "null" | "nan" => {
            Ok(Some(false))
        }
        other => other
            .parse::<i64>()
            .map(|n| Some(n != 0))
            .map_err(|_| CoerceError::InvalidBoolean(s.to_string())),
    }
}

/// Decode a cell as UTF-8, falling back to Latin-1 for legacy exports.
pub fn latin1_or_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
