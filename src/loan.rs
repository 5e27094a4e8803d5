//! Loan amortization and the yearly aggregation behind the payment chart.

use crate::models::{ScheduleEntry, YearAggregate};
use std::collections::BTreeMap;

/// A computed loan: the fixed monthly payment and the full per-month
/// amortization schedule.
#[derive(Debug, Clone, Default)]
pub struct LoanSchedule {
    pub monthly_payment: f64,
    pub schedule: Vec<ScheduleEntry>,
}

/// Computes the fixed monthly payment and amortization schedule for a loan.
///
/// A non-positive principal or term, or a negative rate, yields an empty
/// schedule and a zero payment rather than an error. A zero rate degenerates
/// to straight division of the principal.
pub fn calculate_loan_schedule(
    principal: f64,
    annual_interest_rate: f64,
    loan_term_years: u32,
) -> LoanSchedule {
    if principal <= 0.0 || annual_interest_rate < 0.0 || loan_term_years == 0 {
        return LoanSchedule::default();
    }

    let monthly_rate = (annual_interest_rate / 100.0) / 12.0;
    let payments = loan_term_years * 12;

    let monthly_payment = if monthly_rate == 0.0 {
        principal / payments as f64
    } else {
        let growth = (1.0 + monthly_rate).powi(payments as i32);
        principal * (monthly_rate * growth) / (growth - 1.0)
    };

    let mut schedule = Vec::with_capacity(payments as usize);
    let mut remaining_balance = principal;
    for month in 1..=payments {
        let interest_payment = remaining_balance * monthly_rate;
        let principal_payment = monthly_payment - interest_payment;
        remaining_balance -= principal_payment;
        // Floating-point drift can push the final balance just below zero.
        if remaining_balance < 0.0 {
            remaining_balance = 0.0;
        }
        schedule.push(ScheduleEntry {
            month,
            principal_payment,
            interest_payment,
            remaining_balance,
        });
    }

    LoanSchedule { monthly_payment, schedule }
}

/// Calendar year a schedule month falls in, counted from 1.
pub fn schedule_year(month: u32) -> u32 {
    month.div_ceil(12)
}

/// Groups schedule entries into per-year principal/interest totals, ordered
/// ascending by year. Only years present in the input appear; there is no
/// gap-filling.
pub fn aggregate_by_year(schedule: &[ScheduleEntry]) -> Vec<YearAggregate> {
    let mut years: BTreeMap<u32, YearAggregate> = BTreeMap::new();
    for entry in schedule {
        let year = schedule_year(entry.month);
        let aggregate = years.entry(year).or_insert(YearAggregate {
            year,
            principal: 0.0,
            interest: 0.0,
        });
        aggregate.principal += entry.principal_payment;
        aggregate.interest += entry.interest_payment;
    }
    years.into_values().collect()
}

/// The schedule entries of one year, in their original chronological order.
pub fn drill_down(schedule: &[ScheduleEntry], year: u32) -> Vec<ScheduleEntry> {
    schedule
        .iter()
        .filter(|entry| schedule_year(entry.month) == year)
        .cloned()
        .collect()
}

/// Debt Service Coverage Ratio: net operating income over total annual debt
/// service. Not meaningful (0) when there is no debt service.
pub fn calculate_dscr(net_operating_income: f64, total_debt_service: f64) -> f64 {
    if total_debt_service <= 0.0 {
        return 0.0;
    }
    net_operating_income / total_debt_service
}

/// A qualitative read of a DSCR value shown next to the loan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub level: &'static str,
    pub dscr_status: &'static str,
    pub message: &'static str,
}

const HIGH_RISK: Assessment = Assessment {
    level: "high",
    dscr_status: "High risk",
    message: "Projected operating income does not cover the loan payments. \
              Lenders are unlikely to approve this loan as planned.",
};

const MEDIUM_RISK: Assessment = Assessment {
    level: "medium",
    dscr_status: "Caution",
    message: "Operating income covers the payments with little room to \
              spare. A slow quarter could make this loan hard to service.",
};

const LOW_RISK: Assessment = Assessment {
    level: "low",
    dscr_status: "Healthy",
    message: "Operating income comfortably covers the scheduled payments.",
};

/// DSCR bands: below 1.0 the income does not cover the debt, below 1.25 the
/// margin is thin, at or above 1.25 lenders generally consider it safe.
pub fn dscr_assessment(dscr: f64) -> Assessment {
    if dscr < 1.0 {
        HIGH_RISK
    } else if dscr < 1.25 {
        MEDIUM_RISK
    } else {
        LOW_RISK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(month: u32, principal: f64, interest: f64) -> ScheduleEntry {
        ScheduleEntry {
            month,
            principal_payment: principal,
            interest_payment: interest,
            remaining_balance: 0.0,
        }
    }

    #[test]
    fn invalid_inputs_yield_an_empty_schedule() {
        assert!(calculate_loan_schedule(0.0, 5.0, 10).schedule.is_empty());
        assert!(calculate_loan_schedule(-100.0, 5.0, 10).schedule.is_empty());
        assert!(calculate_loan_schedule(1000.0, -1.0, 10).schedule.is_empty());
        assert!(calculate_loan_schedule(1000.0, 5.0, 0).schedule.is_empty());
        assert_eq!(calculate_loan_schedule(0.0, 5.0, 10).monthly_payment, 0.0);
    }

    #[test]
    fn zero_rate_loan_is_straight_division() {
        let loan = calculate_loan_schedule(12_000.0, 0.0, 1);
        assert_eq!(loan.schedule.len(), 12);
        assert!((loan.monthly_payment - 1000.0).abs() < 1e-9);
        for entry in &loan.schedule {
            assert_eq!(entry.interest_payment, 0.0);
            assert!((entry.principal_payment - 1000.0).abs() < 1e-9);
        }
        assert!(loan.schedule.last().unwrap().remaining_balance.abs() < 1e-6);
    }

    #[test]
    fn amortization_pays_the_principal_down_to_zero() {
        let loan = calculate_loan_schedule(250_000.0, 6.5, 30);
        assert_eq!(loan.schedule.len(), 360);

        let total_principal: f64 =
            loan.schedule.iter().map(|e| e.principal_payment).sum();
        assert!((total_principal - 250_000.0).abs() < 1e-3);
        assert!(loan.schedule.last().unwrap().remaining_balance.abs() < 1e-3);

        // Interest share shrinks as the balance amortizes.
        assert!(
            loan.schedule[0].interest_payment
                > loan.schedule[359].interest_payment
        );
    }

    #[test]
    fn known_payment_amount() {
        // $200,000 at 6% over 30 years is the textbook $1,199.10/month.
        let loan = calculate_loan_schedule(200_000.0, 6.0, 30);
        assert!((loan.monthly_payment - 1199.10).abs() < 0.01);
    }

    #[test]
    fn twelve_months_aggregate_into_one_year() {
        let schedule: Vec<ScheduleEntry> =
            (1..=12).map(|m| entry(m, 100.0, 10.0)).collect();
        let years = aggregate_by_year(&schedule);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].year, 1);
        assert!((years[0].principal - 1200.0).abs() < 1e-9);
        assert!((years[0].interest - 120.0).abs() < 1e-9);
    }

    #[test]
    fn twenty_four_months_split_into_two_years() {
        let schedule: Vec<ScheduleEntry> =
            (1..=24).map(|m| entry(m, 100.0, 10.0)).collect();
        let years = aggregate_by_year(&schedule);
        assert_eq!(years.len(), 2);
        assert_eq!((years[0].year, years[1].year), (1, 2));
        assert!((years[0].principal - 1200.0).abs() < 1e-9);
        assert!((years[1].principal - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn aggregation_skips_absent_years() {
        // Months 1 and 25 only: years 1 and 3, nothing for year 2.
        let schedule = vec![entry(1, 50.0, 5.0), entry(25, 70.0, 7.0)];
        let years = aggregate_by_year(&schedule);
        assert_eq!(years.len(), 2);
        assert_eq!((years[0].year, years[1].year), (1, 3));
    }

    #[test]
    fn empty_schedule_aggregates_to_nothing() {
        assert!(aggregate_by_year(&[]).is_empty());
    }

    #[test]
    fn drill_down_returns_the_year_in_order() {
        let schedule: Vec<ScheduleEntry> =
            (1..=24).map(|m| entry(m, 100.0, 10.0)).collect();
        let year_two = drill_down(&schedule, 2);
        assert_eq!(year_two.len(), 12);
        let months: Vec<u32> = year_two.iter().map(|e| e.month).collect();
        assert_eq!(months, (13..=24).collect::<Vec<u32>>());
        assert!(drill_down(&schedule, 3).is_empty());
    }

    #[test]
    fn month_to_year_boundaries() {
        assert_eq!(schedule_year(1), 1);
        assert_eq!(schedule_year(12), 1);
        assert_eq!(schedule_year(13), 2);
        assert_eq!(schedule_year(24), 2);
        assert_eq!(schedule_year(25), 3);
    }

    #[test]
    fn dscr_handles_missing_debt_service() {
        assert_eq!(calculate_dscr(50_000.0, 0.0), 0.0);
        assert_eq!(calculate_dscr(50_000.0, -1.0), 0.0);
        assert!((calculate_dscr(50_000.0, 40_000.0) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn assessment_bands() {
        assert_eq!(dscr_assessment(0.8).level, "high");
        assert_eq!(dscr_assessment(1.0).level, "medium");
        assert_eq!(dscr_assessment(1.24).level, "medium");
        assert_eq!(dscr_assessment(1.25).level, "low");
        assert_eq!(dscr_assessment(3.0).level, "low");
    }
}
