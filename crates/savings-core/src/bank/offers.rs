//! Offer ranking across every loaded bank.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::prediction::CompanyMix;
use super::records::BankDataset;
use super::stats::mean;
use crate::types::{CompanyType, EngagementTier, Money, Rate, TierTable};
use crate::SavingsResult;

/// Which offers make up the denominator of `TopOffer::percentage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferShareBasis {
    /// Only the returned offers, so shares sum to roughly 100
    #[default]
    TopOffers,
    /// Every offer with at least one parsed amount
    AllOffers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOfferParams {
    pub engagement: TierTable,
    /// Client count at which the historical averages apply unscaled
    pub reference_clients: u64,
    pub limit: usize,
    #[serde(default)]
    pub share_basis: OfferShareBasis,
}

impl Default for TopOfferParams {
    fn default() -> Self {
        TopOfferParams {
            engagement: TierTable {
                rarely: dec!(0.5),
                often: dec!(1.0),
                frequently: dec!(1.5),
            },
            reference_clients: 10_000,
            limit: 10,
            share_basis: OfferShareBasis::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOffer {
    pub offer_name: String,
    /// Historical average scaled to the requested client base
    pub avg_savings: Money,
    /// Share of total adjusted savings, in percent
    pub percentage: Rate,
    pub score: Decimal,
    pub usage_count: usize,
    pub unique_companies: usize,
}

#[derive(Default)]
struct OfferTally<'a> {
    amounts: Vec<Decimal>,
    companies: BTreeSet<&'a str>,
}

fn ln_1p(count: usize) -> Decimal {
    Decimal::from(count as u64 + 1)
        .checked_ln()
        .unwrap_or(Decimal::ZERO)
}

/// Rank offers by adjusted savings weighted by usage and reach.
pub fn get_top_offers(
    datasets: &[BankDataset],
    num_clients: u64,
    company_types: &[CompanyType],
    engagement: EngagementTier,
    params: &TopOfferParams,
    mix: &CompanyMix,
) -> SavingsResult<Vec<TopOffer>> {
    let type_factor = mix.factor(company_types)?;
    let scale = if params.reference_clients == 0 {
        Decimal::ONE
    } else {
        Decimal::from(num_clients) / Decimal::from(params.reference_clients)
    };
    let adjustment = scale * params.engagement.get(engagement) * type_factor;

    let mut tallies: BTreeMap<&str, OfferTally> = BTreeMap::new();
    for record in datasets.iter().flat_map(|d| d.records.iter()) {
        let Some(offer) = record.offer_name.as_deref() else {
            continue;
        };
        let tally = tallies.entry(offer).or_default();
        if let Some(amount) = record.savings_amount {
            tally.amounts.push(amount);
        }
        if let Some(company) = record.company.as_deref() {
            tally.companies.insert(company);
        }
    }

    let mut ranked: Vec<TopOffer> = tallies
        .into_iter()
        .filter(|(_, t)| !t.amounts.is_empty())
        .map(|(name, t)| {
            let adjusted = mean(&t.amounts) * adjustment;
            let usage_count = t.amounts.len();
            let unique_companies = t.companies.len();
            TopOffer {
                offer_name: name.to_string(),
                avg_savings: adjusted,
                percentage: Decimal::ZERO,
                score: adjusted * ln_1p(usage_count) * ln_1p(unique_companies),
                usage_count,
                unique_companies,
            }
        })
        .collect();

    let all_offers_total: Money = ranked.iter().map(|o| o.avg_savings).sum();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.offer_name.cmp(&b.offer_name))
    });
    ranked.truncate(params.limit);

    let denominator = match params.share_basis {
        OfferShareBasis::TopOffers => ranked.iter().map(|o| o.avg_savings).sum(),
        OfferShareBasis::AllOffers => all_offers_total,
    };
    let even_share = if ranked.is_empty() {
        Decimal::ZERO
    } else {
        dec!(100) / Decimal::from(ranked.len() as u64)
    };
    for offer in &mut ranked {
        offer.percentage = if denominator > Decimal::ZERO {
            offer.avg_savings / denominator * dec!(100)
        } else {
            even_share
        }
        .round_dp(2);
    }

    tracing::debug!(
        num_clients,
        %engagement,
        returned = ranked.len(),
        basis = ?params.share_basis,
        "ranked top offers"
    );

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::records::RedemptionRecord;
    use crate::error::SavingsError;
    use chrono::NaiveDate;

    fn rec(company: &str, offer: &str, amount: Option<Decimal>) -> RedemptionRecord {
        RedemptionRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            company: Some(company.to_string()),
            offer_name: Some(offer.to_string()),
            savings_amount: amount,
            redeemer_domain: None,
        }
    }

    fn datasets() -> Vec<BankDataset> {
        vec![
            BankDataset::new(
                "SVB",
                vec![
                    rec("Acme", "AWS", Some(dec!(5000))),
                    rec("Beta", "AWS", Some(dec!(3000))),
                    rec("Acme", "Slack", Some(dec!(400))),
                    rec("Acme", "Ghost", None),
                ],
            ),
            BankDataset::new(
                "JPM",
                vec![
                    rec("Gamma", "AWS", Some(dec!(4000))),
                    rec("Gamma", "Notion", Some(dec!(600))),
                    rec("Delta", "Notion", Some(dec!(200))),
                ],
            ),
        ]
    }

    fn top(params: &TopOfferParams) -> Vec<TopOffer> {
        get_top_offers(
            &datasets(),
            10_000,
            &[CompanyType::Startup],
            EngagementTier::Often,
            params,
            &CompanyMix::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_offers_grouped_across_banks_and_ranked() {
        let offers = top(&TopOfferParams::default());
        let names: Vec<&str> = offers.iter().map(|o| o.offer_name.as_str()).collect();
        assert_eq!(names, vec!["AWS", "Notion", "Slack"]);
        let aws = &offers[0];
        assert_eq!(aws.avg_savings, dec!(4000));
        assert_eq!(aws.usage_count, 3);
        assert_eq!(aws.unique_companies, 3);
        assert!(offers.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_offer_without_amounts_is_skipped() {
        let offers = top(&TopOfferParams::default());
        assert!(offers.iter().all(|o| o.offer_name != "Ghost"));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let offers = top(&TopOfferParams::default());
        let sum: Decimal = offers.iter().map(|o| o.percentage).sum();
        assert!((sum - dec!(100)).abs() <= dec!(0.05), "sum = {sum}");
    }

    #[test]
    fn test_limit_and_all_offers_basis() {
        let params = TopOfferParams {
            limit: 1,
            share_basis: OfferShareBasis::AllOffers,
            ..TopOfferParams::default()
        };
        let offers = top(&params);
        assert_eq!(offers.len(), 1);
        // 4000 of 4000 + 400 + 400
        assert_eq!(offers[0].percentage, dec!(83.33));
    }

    #[test]
    fn test_default_limit_keeps_ten_best() {
        let records = (1..=12)
            .map(|i| rec(&format!("Co{i}"), &format!("Offer{i:02}"), Some(Decimal::from(i * 100))))
            .collect();
        let offers = get_top_offers(
            &[BankDataset::new("SVB", records)],
            10_000,
            &[CompanyType::Startup],
            EngagementTier::Often,
            &TopOfferParams::default(),
            &CompanyMix::default(),
        )
        .unwrap();
        assert_eq!(offers.len(), 10);
        assert!(offers.windows(2).all(|w| w[0].score > w[1].score));
        assert_eq!(offers[0].offer_name, "Offer12");
        assert!(offers.iter().all(|o| o.offer_name != "Offer01" && o.offer_name != "Offer02"));
    }

    #[test]
    fn test_scaling_by_clients_and_engagement() {
        let offers = get_top_offers(
            &datasets(),
            5_000,
            &[CompanyType::Sme],
            EngagementTier::Frequently,
            &TopOfferParams::default(),
            &CompanyMix::default(),
        )
        .unwrap();
        // 4000 * 0.5 * 1.5 * 0.7
        assert_eq!(offers[0].avg_savings, dec!(2100));
    }

    #[test]
    fn test_zero_clients_share_evenly() {
        let offers = get_top_offers(
            &datasets(),
            0,
            &[CompanyType::Startup],
            EngagementTier::Often,
            &TopOfferParams::default(),
            &CompanyMix::default(),
        )
        .unwrap();
        assert_eq!(offers.len(), 3);
        assert!(offers.iter().all(|o| o.percentage == dec!(33.33)));
    }

    #[test]
    fn test_no_company_types_rejected() {
        let err = get_top_offers(
            &datasets(),
            100,
            &[],
            EngagementTier::Often,
            &TopOfferParams::default(),
            &CompanyMix::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SavingsError::InvalidInput { .. }));
    }
}
