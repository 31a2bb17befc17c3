//! Descriptive statistics over a bank's redemption history.
//!
//! Unparsed amounts are skipped by every sum, mean and median. Records with
//! no company are left out of the per-company figures.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::records::BankDataset;
use crate::types::Money;

const TOP_COMPANIES: usize = 10;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Total savings attributed to one client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySavings {
    pub company: String,
    pub total_savings: Money,
}

/// Savings booked in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySavings {
    /// `YYYY-MM`
    pub month: String,
    pub total_savings: Money,
    pub median_savings: Money,
    pub redemptions: usize,
}

/// Descriptive statistics for one bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStats {
    pub bank_name: String,
    pub total_savings: Money,
    pub avg_savings_per_redemption: Money,
    pub median_savings_per_redemption: Money,
    pub min_savings: Money,
    pub max_savings: Money,
    pub unique_companies: usize,
    pub unique_offers: usize,
    /// Every kept redemption, including those with unparsed amounts
    pub total_redemptions: usize,
    pub avg_savings_per_company: Money,
    pub median_savings_per_company: Money,
    pub avg_redemptions_per_company: Decimal,
    pub top_10_companies: Vec<CompanySavings>,
    pub monthly: Vec<MonthlySavings>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Mean of `values`, 0 when empty.
pub(crate) fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len() as u64)
}

/// Compute the median of a sorted slice of Decimals.
fn median_sorted(sorted: &[Decimal]) -> Decimal {
    if sorted.is_empty() {
        return Decimal::ZERO;
    }
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / dec!(2)
    }
}

pub(crate) fn median(values: &[Decimal]) -> Decimal {
    let mut sorted = values.to_vec();
    sorted.sort();
    median_sorted(&sorted)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Compute the full statistics block for one dataset.
pub fn calculate_bank_stats(dataset: &BankDataset) -> BankStats {
    let amounts: Vec<Decimal> = dataset
        .records
        .iter()
        .filter_map(|r| r.savings_amount)
        .collect();

    let mut company_totals: HashMap<&str, Decimal> = HashMap::new();
    let mut company_redemptions: HashMap<&str, usize> = HashMap::new();
    let mut offers: BTreeSet<&str> = BTreeSet::new();
    let mut months: BTreeMap<(i32, u32), (Vec<Decimal>, usize)> = BTreeMap::new();

    for record in &dataset.records {
        if let Some(company) = record.company.as_deref() {
            *company_totals.entry(company).or_insert(Decimal::ZERO) +=
                record.savings_amount.unwrap_or(Decimal::ZERO);
            *company_redemptions.entry(company).or_insert(0) += 1;
        }
        if let Some(offer) = record.offer_name.as_deref() {
            offers.insert(offer);
        }
        let bucket = months
            .entry((record.date.year(), record.date.month()))
            .or_insert_with(|| (Vec::new(), 0));
        if let Some(amount) = record.savings_amount {
            bucket.0.push(amount);
        }
        bucket.1 += 1;
    }

    let per_company: Vec<Decimal> = company_totals.values().copied().collect();
    let redemption_counts: Vec<Decimal> = company_redemptions
        .values()
        .map(|n| Decimal::from(*n as u64))
        .collect();

    let mut ranked: Vec<CompanySavings> = company_totals
        .iter()
        .map(|(company, total)| CompanySavings {
            company: (*company).to_string(),
            total_savings: *total,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_savings
            .cmp(&a.total_savings)
            .then_with(|| a.company.cmp(&b.company))
    });
    ranked.truncate(TOP_COMPANIES);

    let monthly = months
        .into_iter()
        .map(|((year, month), (values, redemptions))| MonthlySavings {
            month: format!("{year:04}-{month:02}"),
            total_savings: values.iter().sum(),
            median_savings: median(&values),
            redemptions,
        })
        .collect();

    BankStats {
        bank_name: dataset.bank_name.clone(),
        total_savings: amounts.iter().sum(),
        avg_savings_per_redemption: mean(&amounts),
        median_savings_per_redemption: median(&amounts),
        min_savings: amounts.iter().min().copied().unwrap_or(Decimal::ZERO),
        max_savings: amounts.iter().max().copied().unwrap_or(Decimal::ZERO),
        unique_companies: company_totals.len(),
        unique_offers: offers.len(),
        total_redemptions: dataset.records.len(),
        avg_savings_per_company: mean(&per_company),
        median_savings_per_company: median(&per_company),
        avg_redemptions_per_company: mean(&redemption_counts),
        top_10_companies: ranked,
        monthly,
    }
}
