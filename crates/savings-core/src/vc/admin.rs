//! Administrative time saved by a platform team that no longer brokers
//! vendor relationships by hand.
//!
//! Hours are annualised from monthly/weekly task estimates, scaled by the
//! share of a staff member's time spent on vendor admin, reduced by the
//! automation rate and priced at a salaried hourly rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Task-time assumptions behind the admin estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminTimeParams {
    /// Hours per company per month answering vendor requests (20 min every 2 months)
    pub request_hours_per_company: Decimal,
    /// Hours per company per month making introductions (15 min monthly)
    pub introduction_hours_per_company: Decimal,
    /// Fixed monthly hours managing vendor relationships
    pub vendor_relationship_hours: Decimal,
    /// Fixed monthly hours maintaining vendor directories
    pub admin_update_hours: Decimal,
    /// Inbound vendor inquiries per week
    pub inquiries_per_week: Decimal,
    /// Hours per inquiry (10 min)
    pub hours_per_inquiry: Decimal,
    pub weeks_per_year: Decimal,
    /// Share of the admin's time spent on these tasks
    pub admin_factor: Rate,
    /// Fraction of the manual hours removed by the platform
    pub automation_reduction: Rate,
    pub annual_salary: Money,
    pub working_hours_per_year: Decimal,
}

impl Default for AdminTimeParams {
    fn default() -> Self {
        AdminTimeParams {
            request_hours_per_company: dec!(0.5),
            introduction_hours_per_company: dec!(0.25),
            vendor_relationship_hours: dec!(5),
            admin_update_hours: dec!(8),
            inquiries_per_week: dec!(10),
            hours_per_inquiry: dec!(0.1667),
            weeks_per_year: dec!(52),
            admin_factor: dec!(0.5),
            automation_reduction: dec!(0.85),
            annual_salary: dec!(150000),
            working_hours_per_year: dec!(2080),
        }
    }
}

impl AdminTimeParams {
    pub fn hourly_rate(&self) -> Money {
        if self.working_hours_per_year.is_zero() {
            return Decimal::ZERO;
        }
        self.annual_salary / self.working_hours_per_year
    }
}

/// Annual hours per activity and the resulting dollar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminHoursBreakdown {
    pub portfolio_requests: Decimal,
    pub vendor_introductions: Decimal,
    pub vendor_relationship: Decimal,
    pub admin_updates: Decimal,
    pub vendor_inquiries: Decimal,
    /// Sum of the activities scaled by the admin factor
    pub total_hours: Decimal,
    pub hours_saved: Decimal,
    pub hourly_rate: Money,
    pub dollar_savings: Money,
}

/// Annual hour breakdown for a portfolio of `count` companies.
/// Negative counts are not rejected and yield negative hours.
pub fn admin_hours(count: i64, params: &AdminTimeParams) -> AdminHoursBreakdown {
    let n = Decimal::from(count);

    let portfolio_requests = n * params.request_hours_per_company * MONTHS_PER_YEAR;
    let vendor_introductions = n * params.introduction_hours_per_company * MONTHS_PER_YEAR;
    let vendor_relationship = params.vendor_relationship_hours * MONTHS_PER_YEAR;
    let admin_updates = params.admin_update_hours * MONTHS_PER_YEAR;
    let vendor_inquiries =
        params.inquiries_per_week * params.hours_per_inquiry * params.weeks_per_year;

    let total_hours = (portfolio_requests
        + vendor_introductions
        + vendor_relationship
        + admin_updates
        + vendor_inquiries)
        * params.admin_factor;
    let hours_saved = total_hours * params.automation_reduction;
    let hourly_rate = params.hourly_rate();

    AdminHoursBreakdown {
        portfolio_requests,
        vendor_introductions,
        vendor_relationship,
        admin_updates,
        vendor_inquiries,
        total_hours,
        hours_saved,
        hourly_rate,
        dollar_savings: hours_saved * hourly_rate,
    }
}

/// Dollar value of admin time saved for `count` companies.
pub fn admin_savings(count: i64, params: &AdminTimeParams) -> Money {
    admin_hours(count, params).dollar_savings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_companies_matches_formula() {
        let p = AdminTimeParams::default();
        let manual = dec!(100) * dec!(0.5) * dec!(12)
            + dec!(100) * dec!(0.25) * dec!(12)
            + dec!(5) * dec!(12)
            + dec!(8) * dec!(12)
            + dec!(10) * dec!(0.1667) * dec!(52);
        let total_hours = manual * dec!(0.5);
        let hours_saved = total_hours * dec!(0.85);
        let expected = hours_saved * (dec!(150000) / dec!(2080));

        let breakdown = admin_hours(100, &p);
        assert_eq!(breakdown.total_hours, total_hours);
        assert_eq!(breakdown.hours_saved, hours_saved);
        assert!((breakdown.dollar_savings - expected).abs() < dec!(0.000001));

        // 1142.684 manual hours -> 571.342 admin hours -> 485.6407 saved
        assert_eq!(total_hours, dec!(571.342));
        assert_eq!(hours_saved, dec!(485.6407));
        assert!(breakdown.dollar_savings > dec!(35_000) && breakdown.dollar_savings < dec!(35_100));
    }

    #[test]
    fn test_zero_companies_keeps_fixed_overhead() {
        let p = AdminTimeParams::default();
        let b = admin_hours(0, &p);
        assert_eq!(b.portfolio_requests, Decimal::ZERO);
        assert_eq!(b.vendor_introductions, Decimal::ZERO);
        assert!(b.dollar_savings > Decimal::ZERO);
    }

    #[test]
    fn test_grows_linearly_with_count() {
        let p = AdminTimeParams::default();
        let a = admin_savings(100, &p);
        let b = admin_savings(200, &p);
        let c = admin_savings(300, &p);
        assert!(((c - b) - (b - a)).abs() < dec!(0.000001));
        assert!(b > a);
    }

    #[test]
    fn test_zero_working_hours_prices_at_zero() {
        let p = AdminTimeParams {
            working_hours_per_year: Decimal::ZERO,
            ..AdminTimeParams::default()
        };
        assert_eq!(admin_savings(100, &p), Decimal::ZERO);
    }
}
