//! The temporal recognition domain.
//!
//! Everything time-specific lives here: the semantic kind and granularity
//! enums (with the string codes used by config metadata), the payload carried
//! through trie and regex matching, the resolved value exposed on output
//! entities, the built-in Chinese vocabulary, and the dynamic pattern set for
//! constructs a dictionary cannot enumerate.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::calendar;
use crate::dictionary::DictionaryEntry;
use crate::patterns::{PatternSet, RANK_FINE, RANK_MONTH, RANK_YEAR};
use crate::recognizer::EntityDomain;
use crate::Context;

pub(crate) const TIME_DOMAIN: &str = "time";

/// Semantic time kind resolved from a dictionary literal or dynamic pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeKind {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    LastNDays,
    LastNWeeks,
    LastNMonths,
    AbsoluteDate,
    IsoDate,
    AbsoluteMonth,
    AbsoluteQuarter,
    AbsoluteYear,
}

impl TimeKind {
    /// Parse the metadata code used by config documents and store rows.
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "TODAY" => TimeKind::Today,
            "YESTERDAY" => TimeKind::Yesterday,
            "THIS_WEEK" => TimeKind::ThisWeek,
            "LAST_WEEK" => TimeKind::LastWeek,
            "THIS_MONTH" => TimeKind::ThisMonth,
            "LAST_MONTH" => TimeKind::LastMonth,
            "THIS_QUARTER" => TimeKind::ThisQuarter,
            "LAST_QUARTER" => TimeKind::LastQuarter,
            "THIS_YEAR" => TimeKind::ThisYear,
            "LAST_YEAR" => TimeKind::LastYear,
            "LAST_N_DAYS" => TimeKind::LastNDays,
            "LAST_N_WEEKS" => TimeKind::LastNWeeks,
            "LAST_N_MONTHS" => TimeKind::LastNMonths,
            "ABSOLUTE_DATE" => TimeKind::AbsoluteDate,
            "ISO_DATE" => TimeKind::IsoDate,
            "ABSOLUTE_MONTH" => TimeKind::AbsoluteMonth,
            "ABSOLUTE_QUARTER" => TimeKind::AbsoluteQuarter,
            "ABSOLUTE_YEAR" => TimeKind::AbsoluteYear,
            _ => return None,
        };
        Some(kind)
    }

    pub fn code(&self) -> &'static str {
        match self {
            TimeKind::Today => "TODAY",
            TimeKind::Yesterday => "YESTERDAY",
            TimeKind::ThisWeek => "THIS_WEEK",
            TimeKind::LastWeek => "LAST_WEEK",
            TimeKind::ThisMonth => "THIS_MONTH",
            TimeKind::LastMonth => "LAST_MONTH",
            TimeKind::ThisQuarter => "THIS_QUARTER",
            TimeKind::LastQuarter => "LAST_QUARTER",
            TimeKind::ThisYear => "THIS_YEAR",
            TimeKind::LastYear => "LAST_YEAR",
            TimeKind::LastNDays => "LAST_N_DAYS",
            TimeKind::LastNWeeks => "LAST_N_WEEKS",
            TimeKind::LastNMonths => "LAST_N_MONTHS",
            TimeKind::AbsoluteDate => "ABSOLUTE_DATE",
            TimeKind::IsoDate => "ISO_DATE",
            TimeKind::AbsoluteMonth => "ABSOLUTE_MONTH",
            TimeKind::AbsoluteQuarter => "ABSOLUTE_QUARTER",
            TimeKind::AbsoluteYear => "ABSOLUTE_YEAR",
        }
    }

    /// Calendar unit this kind naturally maps to.
    pub fn granularity(&self) -> Granularity {
        match self {
            TimeKind::Today
            | TimeKind::Yesterday
            | TimeKind::LastNDays
            | TimeKind::AbsoluteDate
            | TimeKind::IsoDate => Granularity::Day,
            TimeKind::ThisWeek | TimeKind::LastWeek | TimeKind::LastNWeeks => Granularity::Week,
            TimeKind::ThisMonth
            | TimeKind::LastMonth
            | TimeKind::LastNMonths
            | TimeKind::AbsoluteMonth => Granularity::Month,
            TimeKind::ThisQuarter | TimeKind::LastQuarter | TimeKind::AbsoluteQuarter => {
                Granularity::Quarter
            }
            TimeKind::ThisYear | TimeKind::LastYear | TimeKind::AbsoluteYear => Granularity::Year,
        }
    }

    /// True for kinds anchored to the reference date rather than an explicit
    /// calendar position.
    pub fn is_relative(&self) -> bool {
        !matches!(
            self,
            TimeKind::AbsoluteDate
                | TimeKind::IsoDate
                | TimeKind::AbsoluteMonth
                | TimeKind::AbsoluteQuarter
                | TimeKind::AbsoluteYear
        )
    }
}

/// Calendar unit of a resolved time expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DAY" => Some(Granularity::Day),
            "WEEK" => Some(Granularity::Week),
            "MONTH" => Some(Granularity::Month),
            "QUARTER" => Some(Granularity::Quarter),
            "YEAR" => Some(Granularity::Year),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Granularity::Day => "DAY",
            Granularity::Week => "WEEK",
            Granularity::Month => "MONTH",
            Granularity::Quarter => "QUARTER",
            Granularity::Year => "YEAR",
        }
    }
}

/// Optional parameters captured by dynamic patterns or dictionary metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeParams {
    /// Numeric span for the `LastN*` kinds.
    pub n: Option<u32>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub quarter: Option<u32>,
}

/// Trie terminal payload and dynamic-pattern extraction product alike.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePayload {
    pub kind: TimeKind,
    pub granularity: Granularity,
    pub description: String,
    pub params: TimeParams,
}

impl TimePayload {
    fn dynamic(kind: TimeKind, params: TimeParams) -> Self {
        TimePayload { kind, granularity: kind.granularity(), description: String::new(), params }
    }
}

/// Resolved value on a recognized time entity, usable directly as a query
/// filter without re-deriving calendar logic downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeValue {
    pub kind: TimeKind,
    pub granularity: Granularity,
    /// Inclusive range start.
    pub start_date: NaiveDate,
    /// Inclusive range end.
    pub end_date: NaiveDate,
    /// True when the range was anchored to the reference date.
    pub relative: bool,
    pub params: TimeParams,
}

/// The temporal [`EntityDomain`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeDomain;

impl EntityDomain for TimeDomain {
    type Payload = TimePayload;
    type Value = TimeValue;

    fn domain_type(&self) -> &'static str {
        TIME_DOMAIN
    }

    fn payload_for(&self, entry: &DictionaryEntry) -> Option<TimePayload> {
        let kind = TimeKind::from_code(entry.metadata.get("time_type")?.as_str()?)?;
        let granularity = entry
            .metadata
            .get("granularity")
            .and_then(Value::as_str)
            .and_then(Granularity::from_code)
            .unwrap_or_else(|| kind.granularity());

        let params = TimeParams {
            n: get_u32(&entry.metadata, "n"),
            year: get_u32(&entry.metadata, "year").map(|y| y as i32),
            month: get_u32(&entry.metadata, "month"),
            day: get_u32(&entry.metadata, "day"),
            quarter: get_u32(&entry.metadata, "quarter"),
        };

        Some(TimePayload { kind, granularity, description: entry.description.clone(), params })
    }

    fn default_entries(&self) -> Vec<DictionaryEntry> {
        [
            ("今天", &["今日", "当天", "当日"][..], TimeKind::Today),
            ("昨天", &["昨日"][..], TimeKind::Yesterday),
            ("本周", &["这周", "本星期", "这个星期"][..], TimeKind::ThisWeek),
            ("上周", &["上星期", "上个星期"][..], TimeKind::LastWeek),
            ("本月", &["这个月", "当月"][..], TimeKind::ThisMonth),
            ("上月", &["上个月"][..], TimeKind::LastMonth),
            ("本季度", &["这个季度", "当季"][..], TimeKind::ThisQuarter),
            ("上季度", &["上个季度"][..], TimeKind::LastQuarter),
            ("今年", &["本年", "本年度"][..], TimeKind::ThisYear),
            ("去年", &["上年", "上一年"][..], TimeKind::LastYear),
        ]
        .into_iter()
        .map(|(name, aliases, kind)| builtin_entry(name, aliases, kind))
        .collect()
    }

    fn dynamic_patterns(&self) -> PatternSet<TimePayload> {
        let mut set = PatternSet::new();

        set.register("last_n_days", r"(?:最近|近|过去)(\d{1,3})\s*[天日]", RANK_FINE, |caps| {
            let n = caps.get(1)?.as_str().parse().ok()?;
            Some(TimePayload::dynamic(
                TimeKind::LastNDays,
                TimeParams { n: Some(n), ..TimeParams::default() },
            ))
        });

        set.register(
            "last_n_weeks",
            r"(?:最近|近|过去)(\d{1,3})\s*(?:个星期|星期|周)",
            RANK_FINE,
            |caps| {
                let n = caps.get(1)?.as_str().parse().ok()?;
                Some(TimePayload::dynamic(
                    TimeKind::LastNWeeks,
                    TimeParams { n: Some(n), ..TimeParams::default() },
                ))
            },
        );

        set.register("last_n_months", r"(?:最近|近|过去)(\d{1,3})\s*个月", RANK_FINE, |caps| {
            let n = caps.get(1)?.as_str().parse().ok()?;
            Some(TimePayload::dynamic(
                TimeKind::LastNMonths,
                TimeParams { n: Some(n), ..TimeParams::default() },
            ))
        });

        set.register("iso_date", r"(\d{4})-(\d{1,2})-(\d{1,2})", RANK_FINE, |caps| {
            date_payload(TimeKind::IsoDate, caps)
        });

        set.register("cn_date", r"(\d{4})年(\d{1,2})月(\d{1,2})日", RANK_FINE, |caps| {
            date_payload(TimeKind::AbsoluteDate, caps)
        });

        set.register("cn_month", r"(\d{4})年(\d{1,2})月", RANK_MONTH, |caps| {
            let year = caps.get(1)?.as_str().parse().ok()?;
            let month: u32 = caps.get(2)?.as_str().parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some(TimePayload::dynamic(
                TimeKind::AbsoluteMonth,
                TimeParams { year: Some(year), month: Some(month), ..TimeParams::default() },
            ))
        });

        set.register("cn_quarter", r"(?:(\d{4})年)?第([1-4])季度", RANK_MONTH, |caps| {
            let year = match caps.get(1) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            let quarter = caps.get(2)?.as_str().parse().ok()?;
            Some(TimePayload::dynamic(
                TimeKind::AbsoluteQuarter,
                TimeParams { year, quarter: Some(quarter), ..TimeParams::default() },
            ))
        });

        set.register("cn_year", r"(\d{4})年", RANK_YEAR, |caps| {
            let year = caps.get(1)?.as_str().parse().ok()?;
            Some(TimePayload::dynamic(
                TimeKind::AbsoluteYear,
                TimeParams { year: Some(year), ..TimeParams::default() },
            ))
        });

        set
    }

    fn resolve(&self, payload: &TimePayload, context: &Context) -> Option<TimeValue> {
        let (start_date, end_date) =
            calendar::range_for(payload.kind, &payload.params, context.reference_date)?;
        Some(TimeValue {
            kind: payload.kind,
            granularity: payload.granularity,
            start_date,
            end_date,
            relative: payload.kind.is_relative(),
            params: payload.params,
        })
    }
}

fn get_u32(metadata: &Map<String, Value>, key: &str) -> Option<u32> {
    metadata.get(key)?.as_u64().map(|v| v as u32)
}

/// Validate captured year/month/day and build a single-day payload.
fn date_payload(kind: TimeKind, caps: &regex::Captures) -> Option<TimePayload> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?;
    Some(TimePayload::dynamic(
        kind,
        TimeParams {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            ..TimeParams::default()
        },
    ))
}

fn builtin_entry(name: &str, aliases: &[&str], kind: TimeKind) -> DictionaryEntry {
    let mut metadata = Map::new();
    metadata.insert("time_type".to_string(), Value::String(kind.code().to_string()));
    metadata.insert("granularity".to_string(), Value::String(kind.granularity().code().to_string()));

    DictionaryEntry {
        name: name.to_string(),
        domain_type: TIME_DOMAIN.to_string(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        description: kind.code().to_string(),
        metadata,
        priority: 0,
        active: true,
    }
}
