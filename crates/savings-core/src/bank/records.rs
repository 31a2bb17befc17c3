//! Redemption log ingestion.
//!
//! Each partner bank exports a CSV snapshot of offer redemptions. Exports
//! differ in date order (day-first vs month-first) and carry internal staff
//! redemptions that must not count as client savings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::SavingsError;
use crate::types::Money;
use crate::SavingsResult;

// ---------------------------------------------------------------------------
// Source configuration
// ---------------------------------------------------------------------------

/// Order of day and month in a bank's exported dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// 06/02/2025 is 6 February (UK exports)
    DayFirst,
    /// 02/06/2025 is 6 February (US exports)
    MonthFirst,
}

/// One bank's redemption export and the filters applied to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSource {
    pub name: String,
    /// File name relative to the data directory
    pub file_name: String,
    pub date_order: DateOrder,
    /// First day of the validity window (inclusive)
    pub window_start: NaiveDate,
    /// Case-insensitive substrings; matching redeemer domains are dropped
    #[serde(default)]
    pub excluded_domains: Vec<String>,
    /// Case-insensitive substrings; matching offer names are dropped
    #[serde(default)]
    pub excluded_offers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

const REQUIRED_COLUMNS: [&str; 5] = [
    "Offer redeemed on",
    "Estimated Value",
    "Offer redeemed by",
    "Name of offer",
    "Redeemer Domain",
];

/// Column layout shared by every bank export.
#[derive(Debug, Deserialize)]
struct RawRedemption {
    #[serde(rename = "Offer redeemed on")]
    redeemed_on: Option<String>,
    #[serde(rename = "Estimated Value")]
    estimated_value: Option<String>,
    #[serde(rename = "Offer redeemed by")]
    redeemed_by: Option<String>,
    #[serde(rename = "Name of offer")]
    offer_name: Option<String>,
    #[serde(rename = "Redeemer Domain")]
    redeemer_domain: Option<String>,
}

/// A single client redemption that survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub date: NaiveDate,
    pub company: Option<String>,
    pub offer_name: Option<String>,
    /// None when the export's value could not be parsed
    pub savings_amount: Option<Money>,
    pub redeemer_domain: Option<String>,
}

/// Row counts from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub excluded_domain: usize,
    pub missing_date: usize,
    pub outside_window: usize,
    pub excluded_offer: usize,
    pub unparsed_amounts: usize,
    pub kept: usize,
}

/// A bank's filtered redemption history. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDataset {
    pub bank_name: String,
    pub records: Vec<RedemptionRecord>,
    pub report: LoadReport,
}

impl BankDataset {
    pub fn new(bank_name: impl Into<String>, records: Vec<RedemptionRecord>) -> Self {
        let report = LoadReport {
            rows_read: records.len(),
            unparsed_amounts: records.iter().filter(|r| r.savings_amount.is_none()).count(),
            kept: records.len(),
            ..LoadReport::default()
        };
        BankDataset {
            bank_name: bank_name.into(),
            records,
            report,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the dataset without redemptions of matching offers
    /// (e.g. `["AWS"]` to compare with and without Amazon credits).
    pub fn without_offers(&self, patterns: &[String]) -> BankDataset {
        let records: Vec<RedemptionRecord> = self
            .records
            .iter()
            .filter(|r| !matches_any(r.offer_name.as_deref(), patterns))
            .cloned()
            .collect();
        let removed = self.records.len() - records.len();
        BankDataset {
            bank_name: self.bank_name.clone(),
            report: LoadReport {
                excluded_offer: self.report.excluded_offer + removed,
                kept: records.len(),
                unparsed_amounts: records.iter().filter(|r| r.savings_amount.is_none()).count(),
                ..self.report.clone()
            },
            records,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse an exported value such as `"$1,250.00"`. Returns None for blanks
/// and anything that is not a number once `$`, `,` and spaces are removed.
pub fn parse_amount(raw: &str) -> Option<Money> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

const DAY_FIRST_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y", "%d.%m.%Y"];
const MONTH_FIRST_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m/%d/%y", "%m-%d-%Y"];

/// Parse a redemption date in the bank's order. Any time-of-day suffix is
/// ignored and ISO dates are accepted from every bank.
pub fn parse_date(raw: &str, order: DateOrder) -> SavingsResult<NaiveDate> {
    let date_part = raw
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Ok(date);
    }

    let formats: &[&str] = match order {
        DateOrder::DayFirst => &DAY_FIRST_FORMATS,
        DateOrder::MonthFirst => &MONTH_FIRST_FORMATS,
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| SavingsError::DateError(format!("cannot parse '{raw}' as {order:?} date")))
}

/// Case-insensitive substring match against any pattern. Missing values
/// never match.
pub fn matches_any(value: Option<&str>, patterns: &[String]) -> bool {
    match value {
        Some(v) => {
            let lower = v.to_lowercase();
            patterns
                .iter()
                .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
        }
        None => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and filter a bank export from any reader.
pub fn read_redemptions<R: Read>(
    reader: R,
    source: &BankSource,
    window_end: NaiveDate,
) -> SavingsResult<BankDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?;
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(SavingsError::Csv(format!(
            "{} export is missing column '{missing}'",
            source.name
        )));
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (index, row) in csv_reader.deserialize::<RawRedemption>().enumerate() {
        let row = row?;
        report.rows_read += 1;

        let domain = non_empty(row.redeemer_domain);
        if matches_any(domain.as_deref(), &source.excluded_domains) {
            report.excluded_domain += 1;
            continue;
        }

        let date = match non_empty(row.redeemed_on) {
            Some(raw) => parse_date(&raw, source.date_order).map_err(|e| {
                SavingsError::DateError(format!("{} row {}: {e}", source.name, index + 2))
            })?,
            None => {
                report.missing_date += 1;
                continue;
            }
        };
        if date < source.window_start || date > window_end {
            report.outside_window += 1;
            continue;
        }

        let offer_name = non_empty(row.offer_name);
        if matches_any(offer_name.as_deref(), &source.excluded_offers) {
            report.excluded_offer += 1;
            continue;
        }

        let savings_amount = row.estimated_value.as_deref().and_then(parse_amount);
        if savings_amount.is_none() {
            report.unparsed_amounts += 1;
            tracing::warn!(
                bank = %source.name,
                row = index + 2,
                value = ?row.estimated_value,
                "estimated value could not be parsed; excluded from aggregates"
            );
        }

        records.push(RedemptionRecord {
            date,
            company: non_empty(row.redeemed_by),
            offer_name,
            savings_amount,
            redeemer_domain: domain,
        });
    }

    report.kept = records.len();
    tracing::info!(
        bank = %source.name,
        rows = report.rows_read,
        kept = report.kept,
        "loaded redemption history"
    );
    tracing::debug!(bank = %source.name, ?report, "redemption filter summary");

    Ok(BankDataset {
        bank_name: source.name.clone(),
        records,
        report,
    })
}

/// Open `data_dir/source.file_name` and load it.
pub fn load_redemptions(
    data_dir: &Path,
    source: &BankSource,
    window_end: NaiveDate,
) -> SavingsResult<BankDataset> {
    let path = data_dir.join(&source.file_name);
    let file = File::open(&path).map_err(|e| SavingsError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    read_redemptions(file, source, window_end).map_err(|e| match e {
        SavingsError::Csv(reason) => SavingsError::DataLoad {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}
