//! Monthly, quarterly, and annual profitability projection with the key
//! financial ratios derived from the annual figures.

use crate::models::{ForecastParams, Product};
use crate::totals::{annualize_revenue, normalize_seasonality};
use serde::{Deserialize, Serialize};

/// One projected calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthMetrics {
    pub month: u32,
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub operating_expenses: f64,
    pub tax: f64,
    pub net_profit: f64,
}

/// Aggregated figures for a period, with the annual ratio set attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub revenue: f64,
    pub gross_profit: f64,
    pub tax: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    pub roa: f64,
    pub current_ratio: f64,
    pub debt_to_equity_ratio: f64,
    pub interest_coverage_ratio: f64,
    pub operating_cash_flow_ratio: f64,
}

/// The full projection returned by the recalculation endpoint. Replaced
/// wholesale on each successful recalculation, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub annual: Metrics,
    pub quarterly: Metrics,
    pub monthly: Vec<MonthMetrics>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PeriodTotals {
    revenue: f64,
    gross_profit: f64,
    tax: f64,
    net_profit: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyRatios {
    pub profit_margin: f64,
    pub roa: f64,
    pub current_ratio: f64,
    pub debt_to_equity_ratio: f64,
    pub interest_coverage_ratio: f64,
    pub operating_cash_flow_ratio: f64,
}

/// Inputs for the ratio computation, all annual figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioInputs {
    pub net_profit: f64,
    pub total_revenue: f64,
    pub total_assets: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub total_debt: f64,
    pub net_operating_income: f64,
    pub interest_expense: f64,
    pub depreciation: f64,
}

/// Builds the twelve-month projection and its quarterly/annual rollups.
///
/// Revenue is the annualized product revenue spread evenly across months and
/// scaled by the normalized seasonality weights. Tax applies only to months
/// with positive pre-tax profit. Quarterly figures are the average of the
/// four quarter totals, matching the displayed "typical quarter".
pub fn build_forecast(
    products: &[Product],
    params: &ForecastParams,
    total_assets: f64,
    total_debt: f64,
) -> ForecastResponse {
    let base_annual_revenue = annualize_revenue(products);
    let base_monthly_revenue = base_annual_revenue / 12.0;
    let monthly_op_ex = params.annual_operating_expenses / 12.0;

    let factors = seasonality_factors(&params.seasonality);

    let monthly: Vec<MonthMetrics> = (0..12)
        .map(|i| {
            let revenue = base_monthly_revenue * factors[i];
            let cogs = revenue * (params.cogs_percentage / 100.0);
            let gross_profit = revenue - cogs;
            let pre_tax = gross_profit - monthly_op_ex;
            let tax = if pre_tax > 0.0 {
                pre_tax * (params.tax_rate / 100.0)
            } else {
                0.0
            };
            MonthMetrics {
                month: i as u32 + 1,
                revenue,
                cogs,
                gross_profit,
                operating_expenses: monthly_op_ex,
                tax,
                net_profit: pre_tax - tax,
            }
        })
        .collect();

    let annual = aggregate(&monthly);
    let quarterly = average_quarter(&monthly);

    let net_operating_income = annual.gross_profit - params.annual_operating_expenses;
    let ratios = key_ratios(&RatioInputs {
        net_profit: annual.net_profit,
        total_revenue: annual.revenue,
        total_assets,
        current_assets: params.current_assets,
        current_liabilities: params.current_liabilities,
        total_debt,
        net_operating_income,
        interest_expense: params.interest_expense,
        depreciation: params.depreciation,
    });

    ForecastResponse {
        annual: with_ratios(annual, &ratios),
        quarterly: with_ratios(quarterly, &ratios),
        monthly,
    }
}

/// Annual pre-tax operating profit implied by a forecast, persisted for the
/// loan page's debt-service assessment.
pub fn net_operating_income(forecast: &ForecastResponse, params: &ForecastParams) -> f64 {
    forecast.annual.gross_profit - params.annual_operating_expenses
}

fn seasonality_factors(seasonality: &[f64]) -> Vec<f64> {
    let mut weights: Vec<f64> = seasonality.iter().copied().take(12).collect();
    weights.resize(12, 1.0);
    // An all-zero weight set means "no seasonality", not "no revenue".
    if weights.iter().sum::<f64>() <= 0.0 {
        weights = vec![1.0; 12];
    }
    normalize_seasonality(&weights)
}

fn aggregate(months: &[MonthMetrics]) -> PeriodTotals {
    months.iter().fold(PeriodTotals::default(), |acc, m| PeriodTotals {
        revenue: acc.revenue + m.revenue,
        gross_profit: acc.gross_profit + m.gross_profit,
        tax: acc.tax + m.tax,
        net_profit: acc.net_profit + m.net_profit,
    })
}

fn average_quarter(months: &[MonthMetrics]) -> PeriodTotals {
    let mut sum = PeriodTotals::default();
    for quarter in months.chunks(3) {
        let totals = aggregate(quarter);
        sum.revenue += totals.revenue;
        sum.gross_profit += totals.gross_profit;
        sum.tax += totals.tax;
        sum.net_profit += totals.net_profit;
    }
    PeriodTotals {
        revenue: sum.revenue / 4.0,
        gross_profit: sum.gross_profit / 4.0,
        tax: sum.tax / 4.0,
        net_profit: sum.net_profit / 4.0,
    }
}

/// Key financial ratios. Every ratio whose divisor is not positive comes
/// back as 0 rather than an error or a NaN.
pub fn key_ratios(inputs: &RatioInputs) -> KeyRatios {
    let ratio = |numerator: f64, divisor: f64| {
        if divisor > 0.0 { numerator / divisor } else { 0.0 }
    };

    let total_equity = inputs.total_assets - inputs.total_debt;
    let ebitda = inputs.net_operating_income + inputs.depreciation;
    let operating_cash_flow =
        inputs.net_profit + inputs.depreciation + inputs.interest_expense;

    KeyRatios {
        profit_margin: ratio(inputs.net_profit, inputs.total_revenue) * 100.0,
        roa: ratio(inputs.net_profit, inputs.total_assets) * 100.0,
        current_ratio: ratio(inputs.current_assets, inputs.current_liabilities),
        debt_to_equity_ratio: ratio(inputs.total_debt, total_equity),
        interest_coverage_ratio: ratio(ebitda, inputs.interest_expense),
        operating_cash_flow_ratio: ratio(operating_cash_flow, inputs.current_liabilities),
    }
}

fn with_ratios(totals: PeriodTotals, ratios: &KeyRatios) -> Metrics {
    Metrics {
        revenue: totals.revenue,
        gross_profit: totals.gross_profit,
        tax: totals.tax,
        net_profit: totals.net_profit,
        profit_margin: ratios.profit_margin,
        roa: ratios.roa,
        current_ratio: ratios.current_ratio,
        debt_to_equity_ratio: ratios.debt_to_equity_ratio,
        interest_coverage_ratio: ratios.interest_coverage_ratio,
        operating_cash_flow_ratio: ratios.operating_cash_flow_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;

    fn one_product() -> Vec<Product> {
        vec![Product {
            description: "Subscription".to_string(),
            price: 100.0,
            sales_volume: 10.0,
            sales_volume_unit: Frequency::Monthly,
        }]
    }

    #[test]
    fn flat_seasonality_spreads_revenue_evenly() {
        let params = ForecastParams::default();
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);

        assert_eq!(forecast.monthly.len(), 12);
        for m in &forecast.monthly {
            assert!((m.revenue - 1000.0).abs() < 1e-9);
        }
        assert!((forecast.annual.revenue - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn quarterly_is_the_average_quarter() {
        let params = ForecastParams::default();
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);
        assert!((forecast.quarterly.revenue - forecast.annual.revenue / 4.0).abs() < 1e-9);
        assert!((forecast.quarterly.net_profit - forecast.annual.net_profit / 4.0).abs() < 1e-9);
    }

    #[test]
    fn cogs_and_tax_flow_through_net_profit() {
        let params = ForecastParams {
            cogs_percentage: 50.0,
            tax_rate: 10.0,
            annual_operating_expenses: 1200.0,
            ..ForecastParams::default()
        };
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);

        let m = &forecast.monthly[0];
        assert!((m.cogs - 500.0).abs() < 1e-9);
        assert!((m.gross_profit - 500.0).abs() < 1e-9);
        assert!((m.operating_expenses - 100.0).abs() < 1e-9);
        // pre-tax 400, tax 40, net 360
        assert!((m.tax - 40.0).abs() < 1e-9);
        assert!((m.net_profit - 360.0).abs() < 1e-9);
    }

    #[test]
    fn loss_months_pay_no_tax() {
        let params = ForecastParams {
            annual_operating_expenses: 1_000_000.0,
            ..ForecastParams::default()
        };
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);
        for m in &forecast.monthly {
            assert_eq!(m.tax, 0.0);
            assert!(m.net_profit < 0.0);
        }
    }

    #[test]
    fn seasonality_shifts_revenue_without_changing_the_total() {
        let mut params = ForecastParams::default();
        params.seasonality = vec![0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 6.5];
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);

        assert!(forecast.monthly[11].revenue > forecast.monthly[0].revenue);
        assert!((forecast.annual.revenue - 12_000.0).abs() < 1e-6);
    }

    #[test]
    fn all_zero_seasonality_falls_back_to_flat() {
        let mut params = ForecastParams::default();
        params.seasonality = vec![0.0; 12];
        let forecast = build_forecast(&one_product(), &params, 0.0, 0.0);
        for m in &forecast.monthly {
            assert!((m.revenue - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn no_products_means_zero_everything() {
        let forecast = build_forecast(&[], &ForecastParams::default(), 0.0, 0.0);
        assert_eq!(forecast.annual.revenue, 0.0);
        assert_eq!(forecast.annual.net_profit, 0.0);
        assert_eq!(forecast.annual.profit_margin, 0.0);
    }

    #[test]
    fn ratios_guard_every_divisor() {
        let ratios = key_ratios(&RatioInputs::default());
        assert_eq!(ratios.profit_margin, 0.0);
        assert_eq!(ratios.roa, 0.0);
        assert_eq!(ratios.current_ratio, 0.0);
        assert_eq!(ratios.debt_to_equity_ratio, 0.0);
        assert_eq!(ratios.interest_coverage_ratio, 0.0);
        assert_eq!(ratios.operating_cash_flow_ratio, 0.0);
    }

    #[test]
    fn ratios_match_hand_computation() {
        let ratios = key_ratios(&RatioInputs {
            net_profit: 20_000.0,
            total_revenue: 100_000.0,
            total_assets: 80_000.0,
            current_assets: 30_000.0,
            current_liabilities: 15_000.0,
            total_debt: 40_000.0,
            net_operating_income: 25_000.0,
            interest_expense: 5_000.0,
            depreciation: 2_000.0,
        });
        assert!((ratios.profit_margin - 20.0).abs() < 1e-9);
        assert!((ratios.roa - 25.0).abs() < 1e-9);
        assert!((ratios.current_ratio - 2.0).abs() < 1e-9);
        assert!((ratios.debt_to_equity_ratio - 1.0).abs() < 1e-9);
        assert!((ratios.interest_coverage_ratio - 5.4).abs() < 1e-9);
        assert!((ratios.operating_cash_flow_ratio - 27_000.0 / 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn annual_and_quarterly_share_the_ratio_set() {
        let params = ForecastParams {
            current_assets: 10_000.0,
            current_liabilities: 5_000.0,
            ..ForecastParams::default()
        };
        let forecast = build_forecast(&one_product(), &params, 50_000.0, 20_000.0);
        assert_eq!(forecast.annual.current_ratio, forecast.quarterly.current_ratio);
        assert_eq!(forecast.annual.roa, forecast.quarterly.roa);
    }
}
