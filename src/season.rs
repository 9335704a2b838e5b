//! Age groups and competition seasons.
//!
//! Winter competition runs within one calendar year. Summer straddles New
//! Year, so a summer season is identified by the year it ends in and its age
//! brackets run from 1 July to 30 June.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::coerce::date_from_str;
use crate::error::{Result, SbciError};

pub const SUMMER_LIMITS: &[u8] = &[8, 10, 12, 14, 16, 18, 21];
pub const WINTER_LIMITS: &[u8] = &[9, 11, 13, 15, 17, 19, 21];

/// Summer seasons are numbered by their end year, so each starts after the
/// winter season of the previous year.
pub const SUMMER_YEARS: std::ops::RangeInclusive<i32> = 2027..=2031;
pub const WINTER_YEARS: std::ops::RangeInclusive<i32> = 2026..=2030;
/// Years a parsed season may name.
const SEASON_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("year within chrono's supported range")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeasonType {
    Summer,
    Winter,
}

impl SeasonType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Winter => "Winter",
        }
    }

    fn initial(&self) -> char {
        match self {
            Self::Summer => 'S',
            Self::Winter => 'W',
        }
    }

    pub fn limits(&self) -> &'static [u8] {
        match self {
            Self::Summer => SUMMER_LIMITS,
            Self::Winter => WINTER_LIMITS,
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SeasonType {
    type Err = SbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s" | "summer" => Ok(Self::Summer),
            "w" | "winter" => Ok(Self::Winter),
            other => Err(SbciError::Other(format!("Unknown season type: {other}"))),
        }
    }
}

/// Outcome of looking a birthdate up in a set of brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<T> {
    Found(T),
    NotFound,
    /// The first two brackets that both contain the date.
    Ambiguous(T, T),
}

// ---------------------------------------------------------------------------
// AgeGroup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgeGroup {
    limit: u8,
    season_type: SeasonType,
}

impl AgeGroup {
    pub fn new(limit: u8, season_type: SeasonType) -> Self {
        Self { limit, season_type }
    }

    pub fn limit(&self) -> u8 {
        self.limit
    }

    /// Number of birth years a player stays in this bracket.
    pub fn duration(&self) -> i32 {
        if self.limit < 10 || (self.season_type == SeasonType::Summer && self.limit == 21) {
            3
        } else {
            2
        }
    }

    pub fn label(&self) -> String {
        format!("Under {:02}", self.limit)
    }

    /// Inclusive birthdate bounds for this bracket in the season numbered
    /// `year`.
    pub fn date_range(&self, year: i32) -> (NaiveDate, NaiveDate) {
        let limit = i32::from(self.limit);
        match self.season_type {
            SeasonType::Summer => {
                let base = year - 1 - limit;
                (ymd(base, 7, 1), ymd(base + self.duration(), 6, 30))
            }
            SeasonType::Winter => {
                let base = year - limit;
                (ymd(base, 1, 1), ymd(base + self.duration() - 1, 12, 31))
            }
        }
    }

    pub fn matches(&self, year: i32, dob: NaiveDate) -> bool {
        let (start, end) = self.date_range(year);
        start <= dob && dob <= end
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{:02}", self.limit)
    }
}

pub fn age_groups(season_type: SeasonType) -> Vec<AgeGroup> {
    season_type
        .limits()
        .iter()
        .map(|&limit| AgeGroup::new(limit, season_type))
        .collect()
}

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// Orders chronologically: W26 < S27 < W27 < S28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Season {
    year: i32,
    season_type: SeasonType,
}

impl Season {
    pub fn new(year: i32, season_type: SeasonType) -> Self {
        Self { year, season_type }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn season_type(&self) -> SeasonType {
        self.season_type
    }

    pub fn label(&self) -> String {
        match self.season_type {
            SeasonType::Summer => format!(
                "{:04}/{:02} {}",
                self.year - 1,
                self.year.rem_euclid(100),
                self.season_type
            ),
            SeasonType::Winter => format!("{:04} {}", self.year, self.season_type),
        }
    }

    pub fn age_groups(&self) -> Vec<AgeGroup> {
        age_groups(self.season_type)
    }

    /// Classify against the standard bracket table for this season type.
    pub fn classify(&self, dob: NaiveDate) -> Classification<AgeGroup> {
        self.classify_in(&self.age_groups(), dob)
    }

    /// Classify against an explicit bracket table.
    pub fn classify_in(&self, groups: &[AgeGroup], dob: NaiveDate) -> Classification<AgeGroup> {
        let mut found: Option<AgeGroup> = None;
        for ag in groups.iter().filter(|ag| ag.matches(self.year, dob)) {
            match found {
                Some(first) => return Classification::Ambiguous(first, *ag),
                None => found = Some(*ag),
            }
        }
        found.map_or(Classification::NotFound, Classification::Found)
    }

    /// `Ok(None)` when no bracket holds the date; an error when two do.
    pub fn age_group_of(&self, dob: NaiveDate) -> Result<Option<AgeGroup>> {
        match self.classify(dob) {
            Classification::Found(ag) => Ok(Some(ag)),
            Classification::NotFound => Ok(None),
            Classification::Ambiguous(first, second) => Err(SbciError::AmbiguousAgeGroup {
                dob,
                first: first.to_string(),
                second: second.to_string(),
            }),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.season_type.initial(), self.year.rem_euclid(100))
    }
}

/// Accepts `S27`, `W2026`, `2026-winter`, `2027-summer` and the labels
/// `2026/27 Summer` and `2027 Winter`.
impl FromStr for Season {
    type Err = SbciError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || SbciError::Other(format!("Not a valid season: {s}"));
        let (year, season_type) = if let Some((years, kind)) = s.split_once(' ') {
            let season_type: SeasonType = kind.trim().parse().map_err(|_| bad())?;
            let start: i32 = years
                .split('/')
                .next()
                .unwrap_or_default()
                .parse()
                .map_err(|_| bad())?;
            match season_type {
                SeasonType::Summer => (start + 1, season_type),
                SeasonType::Winter => (start, season_type),
            }
        } else if let Some((year, kind)) = s.split_once('-') {
            let year: i32 = year.parse().map_err(|_| bad())?;
            (year, kind.parse().map_err(|_| bad())?)
        } else {
            let mut chars = s.chars();
            let season_type: SeasonType = chars
                .next()
                .ok_or_else(bad)?
                .to_string()
                .parse()
                .map_err(|_| bad())?;
            let digits = chars.as_str();
            let year: i32 = digits.parse().map_err(|_| bad())?;
            match digits.len() {
                2 => (2000 + year, season_type),
                4 => (year, season_type),
                _ => return Err(bad()),
            }
        };
        if !SEASON_YEARS.contains(&year) {
            return Err(bad());
        }
        Ok(Self::new(year, season_type))
    }
}

pub fn summer_seasons() -> Vec<Season> {
    SUMMER_YEARS.map(|y| Season::new(y, SeasonType::Summer)).collect()
}

pub fn winter_seasons() -> Vec<Season> {
    WINTER_YEARS.map(|y| Season::new(y, SeasonType::Winter)).collect()
}

// ---------------------------------------------------------------------------
// Interleaved sequences
// ---------------------------------------------------------------------------

/// Alternates between two lists, starting with `first`, and stops as soon as
/// the list whose turn it is has run out.
pub struct Interleave<T> {
    first: std::vec::IntoIter<T>,
    second: std::vec::IntoIter<T>,
    first_turn: bool,
    done: bool,
}

impl<T> Interleave<T> {
    pub fn new(first: Vec<T>, second: Vec<T>) -> Self {
        Self {
            first: first.into_iter(),
            second: second.into_iter(),
            first_turn: true,
            done: false,
        }
    }
}

impl<T> Iterator for Interleave<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        let item = if self.first_turn {
            self.first.next()
        } else {
            self.second.next()
        };
        self.first_turn = !self.first_turn;
        if item.is_none() {
            self.done = true;
        }
        item
    }
}

/// U08, U09, U10, U11 ... summer bracket first.
pub fn age_group_sequence() -> Interleave<AgeGroup> {
    Interleave::new(age_groups(SeasonType::Summer), age_groups(SeasonType::Winter))
}

/// W26, S27, W27, S28 ... winter season first.
pub fn season_sequence() -> Interleave<Season> {
    Interleave::new(winter_seasons(), summer_seasons())
}

// ---------------------------------------------------------------------------
// Explicit date-range brackets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bracket {
    pub name: String,
    pub start: NaiveDate,
    /// Open-ended when `None`.
    pub end: Option<NaiveDate>,
}

impl Bracket {
    pub fn contains(&self, dob: NaiveDate) -> bool {
        self.start <= dob && self.end.map_or(true, |end| dob <= end)
    }
}

/// Named birthdate ranges, as published by a league for one season.
#[derive(Debug, Clone, Default)]
pub struct AgeBrackets {
    brackets: Vec<Bracket>,
}

impl AgeBrackets {
    /// Build from `name -> [start, end]` with `dd/mm/yyyy` dates.
    pub fn from_table(table: &BTreeMap<String, (String, Option<String>)>) -> Result<Self> {
        let mut brackets = Vec::with_capacity(table.len());
        for (name, (start, end)) in table {
            let start = date_from_str(start, &["%d/%m/%Y"], false)?
                .ok_or_else(|| SbciError::Settings(format!("age group {name} has no start")))?;
            let end = match end {
                Some(end) => date_from_str(end, &["%d/%m/%Y"], true)?,
                None => None,
            };
            brackets.push(Bracket {
                name: name.clone(),
                start,
                end,
            });
        }
        Ok(Self { brackets })
    }

    pub fn classify(&self, dob: NaiveDate) -> Classification<&Bracket> {
        let mut found: Option<&Bracket> = None;
        for b in self.brackets.iter().filter(|b| b.contains(dob)) {
            match found {
                Some(first) => return Classification::Ambiguous(first, b),
                None => found = Some(b),
            }
        }
        found.map_or(Classification::NotFound, Classification::Found)
    }

    pub fn find(&self, dob: NaiveDate) -> Result<Option<&Bracket>> {
        match self.classify(dob) {
            Classification::Found(b) => Ok(Some(b)),
            Classification::NotFound => Ok(None),
            Classification::Ambiguous(first, second) => Err(SbciError::AmbiguousAgeGroup {
                dob,
                first: first.name.clone(),
                second: second.name.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Season calendar helpers
// ---------------------------------------------------------------------------

/// Approximate end of the season in progress on `today`: 31 March for summer,
/// 30 September for winter.
pub fn end_of_season(today: NaiveDate) -> NaiveDate {
    let end_of_summer = ymd(today.year(), 3, 31);
    if today <= end_of_summer {
        return end_of_summer;
    }
    let end_of_winter = ymd(today.year(), 9, 30);
    if today <= end_of_winter {
        return end_of_winter;
    }
    ymd(today.year() + 1, 3, 31)
}

/// Whole years between `dob` and `on`.
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> i32 {
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years
}

/// Still under 18 when the current season ends.
pub fn is_under_18(dob: NaiveDate, today: NaiveDate) -> bool {
    age_on(dob, end_of_season(today)) < 18
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_duration_rule() {
        assert_eq!(AgeGroup::new(8, SeasonType::Summer).duration(), 3);
        assert_eq!(AgeGroup::new(9, SeasonType::Winter).duration(), 3);
        assert_eq!(AgeGroup::new(12, SeasonType::Winter).duration(), 2);
        assert_eq!(AgeGroup::new(21, SeasonType::Summer).duration(), 3);
        assert_eq!(AgeGroup::new(21, SeasonType::Winter).duration(), 2);
    }

    #[test]
    fn test_winter_date_range() {
        let u12 = AgeGroup::new(12, SeasonType::Winter);
        assert_eq!(u12.date_range(2026), (d(2014, 1, 1), d(2015, 12, 31)));
        assert!(u12.matches(2026, d(2014, 6, 15)));
        assert!(!u12.matches(2026, d(2013, 12, 31)));
        assert!(u12.matches(2026, d(2015, 12, 31)));
    }

    #[test]
    fn test_summer_date_range() {
        let u8 = AgeGroup::new(8, SeasonType::Summer);
        assert_eq!(u8.date_range(2027), (d(2018, 7, 1), d(2021, 6, 30)));
        let u10 = AgeGroup::new(10, SeasonType::Summer);
        assert_eq!(u10.date_range(2027), (d(2016, 7, 1), d(2018, 6, 30)));
    }

    #[test]
    fn test_classify_in_explicit_table() {
        let season = Season::new(2026, SeasonType::Winter);
        let table: Vec<AgeGroup> = [10, 12, 14]
            .iter()
            .map(|&l| AgeGroup::new(l, SeasonType::Winter))
            .collect();
        assert_eq!(
            season.classify_in(&table, d(2014, 6, 15)),
            Classification::Found(AgeGroup::new(12, SeasonType::Winter))
        );
        assert_eq!(season.classify_in(&table, d(2000, 1, 1)), Classification::NotFound);
    }

    #[test]
    fn test_classify_reports_ambiguity() {
        let season = Season::new(2026, SeasonType::Winter);
        let table = [
            AgeGroup::new(12, SeasonType::Winter),
            AgeGroup::new(13, SeasonType::Winter),
        ];
        // U12 covers 2014-2015, U13 covers 2013-2014
        assert_eq!(
            season.classify_in(&table, d(2014, 3, 1)),
            Classification::Ambiguous(table[0], table[1])
        );
    }

    #[test]
    fn test_standard_winter_table() {
        let season = Season::new(2026, SeasonType::Winter);
        let ag = season.age_group_of(d(2014, 6, 15)).unwrap();
        assert_eq!(ag.map(|a| a.to_string()), Some("U13".to_string()));
        assert_eq!(season.age_group_of(d(1990, 1, 1)).unwrap(), None);
        assert_eq!(season.age_group_of(d(2025, 1, 1)).unwrap(), None);
    }

    #[test]
    fn test_standard_tables_partition_birthdates() {
        for season in season_sequence() {
            let groups = season.age_groups();
            let oldest = groups.iter().map(|g| g.date_range(season.year()).0).min().unwrap();
            let youngest = groups.iter().map(|g| g.date_range(season.year()).1).max().unwrap();
            let mut dob = d(1995, 1, 1);
            let last = d(2030, 12, 31);
            while dob <= last {
                let outcome = season.classify(dob);
                assert!(
                    !matches!(outcome, Classification::Ambiguous(..)),
                    "{season} {dob}: {outcome:?}"
                );
                if dob >= oldest && dob <= youngest {
                    assert!(matches!(outcome, Classification::Found(_)), "{season} {dob}");
                } else {
                    assert_eq!(outcome, Classification::NotFound);
                }
                dob = dob.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn test_season_labels() {
        assert_eq!(Season::new(2027, SeasonType::Summer).label(), "2026/27 Summer");
        assert_eq!(Season::new(2027, SeasonType::Winter).label(), "2027 Winter");
        assert_eq!(Season::new(2027, SeasonType::Summer).to_string(), "S27");
        assert_eq!(Season::new(2026, SeasonType::Winter).to_string(), "W26");
        assert_eq!(AgeGroup::new(8, SeasonType::Summer).to_string(), "U08");
        assert_eq!(AgeGroup::new(8, SeasonType::Summer).label(), "Under 08");
    }

    #[test]
    fn test_season_parse() {
        let w26 = Season::new(2026, SeasonType::Winter);
        assert_eq!("W26".parse::<Season>().unwrap(), w26);
        assert_eq!("w2026".parse::<Season>().unwrap(), w26);
        assert_eq!("2026-winter".parse::<Season>().unwrap(), w26);
        assert_eq!("2027-Summer".parse::<Season>().unwrap(), Season::new(2027, SeasonType::Summer));
        assert!("X26".parse::<Season>().is_err());
        assert!("W226".parse::<Season>().is_err());
        assert!("999999-winter".parse::<Season>().is_err());
    }

    #[test]
    fn test_season_label_parses_back() {
        for season in season_sequence() {
            assert_eq!(season.label().parse::<Season>().unwrap(), season);
        }
        assert_eq!(
            "2020/21 Summer".parse::<Season>().unwrap(),
            Season::new(2021, SeasonType::Summer)
        );
        assert!("Full Season".parse::<Season>().is_err());
    }

    #[test]
    fn test_season_ordering_is_chronological() {
        let seasons: Vec<Season> = season_sequence().collect();
        let mut sorted = seasons.clone();
        sorted.sort();
        assert_eq!(seasons, sorted);
    }

    #[test]
    fn test_sequences_interleave_and_restart() {
        let names: Vec<String> = season_sequence().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["W26", "S27", "W27", "S28", "W28", "S29", "W29", "S30", "W30", "S31"]);
        let again: Vec<String> = season_sequence().map(|s| s.to_string()).collect();
        assert_eq!(names, again);

        let groups: Vec<String> = age_group_sequence().map(|a| a.to_string()).collect();
        assert_eq!(groups[..4], ["U08", "U09", "U10", "U11"]);
        assert_eq!(groups.len(), 14);
    }

    #[test]
    fn test_interleave_stops_at_shorter_list() {
        let seq: Vec<i32> = Interleave::new(vec![1, 3, 5, 7], vec![2, 4]).collect();
        assert_eq!(seq, vec![1, 2, 3, 4, 5]);
        let seq: Vec<i32> = Interleave::new(vec![1], vec![2, 4, 6]).collect();
        assert_eq!(seq, vec![1, 2]);
        let mut it = Interleave::new(Vec::<i32>::new(), vec![2]);
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_explicit_brackets() {
        let mut table = BTreeMap::new();
        table.insert("U12".to_string(), ("01/01/2014".to_string(), Some("31/12/2015".to_string())));
        table.insert("U14".to_string(), ("01/01/2012".to_string(), Some("31/12/2013".to_string())));
        table.insert("Open".to_string(), ("01/01/2020".to_string(), None));
        let brackets = AgeBrackets::from_table(&table).unwrap();
        assert_eq!(brackets.find(d(2014, 6, 15)).unwrap().map(|b| b.name.as_str()), Some("U12"));
        assert_eq!(brackets.find(d(2023, 6, 15)).unwrap().map(|b| b.name.as_str()), Some("Open"));
        assert_eq!(brackets.find(d(2016, 6, 15)).unwrap(), None);

        table.insert("Mixed".to_string(), ("01/06/2013".to_string(), Some("31/05/2014".to_string())));
        let brackets = AgeBrackets::from_table(&table).unwrap();
        let err = brackets.find(d(2014, 3, 1)).unwrap_err();
        assert!(matches!(err, SbciError::AmbiguousAgeGroup { .. }));
    }

    #[test]
    fn test_end_of_season_and_under_18() {
        assert_eq!(end_of_season(d(2026, 2, 1)), d(2026, 3, 31));
        assert_eq!(end_of_season(d(2026, 3, 31)), d(2026, 3, 31));
        assert_eq!(end_of_season(d(2026, 6, 1)), d(2026, 9, 30));
        assert_eq!(end_of_season(d(2026, 10, 19)), d(2027, 3, 31));

        let today = d(2026, 6, 1);
        assert!(is_under_18(d(2008, 10, 1), today));
        assert!(!is_under_18(d(2008, 9, 30), today));
        assert_eq!(age_on(d(2000, 2, 29), d(2018, 2, 28)), 17);
    }
}
