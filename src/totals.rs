//! Derived totals over the editable row collections. All functions are pure
//! and recomputed on every change; nothing here is cached.

use crate::models::{Activity, Expense, LineItem, Product};

/// Sum of line-item amounts. An empty list sums to 0.
pub fn sum_amounts(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.amount).sum()
}

/// Annualized revenue across all products: price times sales volume times
/// the number of sales periods per year.
pub fn annualize_revenue(products: &[Product]) -> f64 {
    products
        .iter()
        .map(|p| p.price * p.sales_volume * p.sales_volume_unit.periods_per_year())
        .sum()
}

/// Annual operating expenses implied by the recurring expense list.
pub fn annualize_expenses(expenses: &[Expense]) -> f64 {
    expenses
        .iter()
        .map(|e| e.amount * e.frequency.periods_per_year())
        .sum()
}

/// Total allocated activity weight in percent. Advisory: callers compare
/// against 100 to flag over-allocation but never reject it.
pub fn total_weight(activities: &[Activity]) -> u32 {
    activities.iter().map(|a| a.weight).sum()
}

/// Scales twelve seasonality weights so they sum to 12 (one average month
/// each). A non-positive total is a defined no-op: the input comes back
/// unchanged.
pub fn normalize_seasonality(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return weights.to_vec();
    }
    let scale = weights.len() as f64 / total;
    weights.iter().map(|w| w * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;

    fn product(price: f64, volume: f64, unit: Frequency) -> Product {
        Product {
            description: "test".to_string(),
            price,
            sales_volume: volume,
            sales_volume_unit: unit,
        }
    }

    #[test]
    fn empty_collections_sum_to_zero() {
        assert_eq!(sum_amounts(&[]), 0.0);
        assert_eq!(annualize_revenue(&[]), 0.0);
        assert_eq!(annualize_expenses(&[]), 0.0);
        assert_eq!(total_weight(&[]), 0);
    }

    #[test]
    fn monthly_product_annualizes_by_twelve() {
        let products = vec![product(10.0, 5.0, Frequency::Monthly)];
        assert_eq!(annualize_revenue(&products), 600.0);
    }

    #[test]
    fn mixed_units_annualize_independently() {
        let products = vec![
            product(10.0, 5.0, Frequency::Monthly),
            product(200.0, 3.0, Frequency::Quarterly),
        ];
        assert_eq!(annualize_revenue(&products), 600.0 + 2400.0);
    }

    #[test]
    fn expenses_annualize_by_frequency() {
        let expenses = vec![
            Expense {
                item: "Rent".to_string(),
                amount: 1000.0,
                frequency: Frequency::Monthly,
                readonly: true,
            },
            Expense {
                item: "Insurance".to_string(),
                amount: 300.0,
                frequency: Frequency::Quarterly,
                readonly: false,
            },
        ];
        assert_eq!(annualize_expenses(&expenses), 12_000.0 + 1200.0);
    }

    #[test]
    fn line_items_sum() {
        let items = vec![
            LineItem { description: "Cash".to_string(), amount: 5000.0 },
            LineItem { description: "Equipment".to_string(), amount: 1500.5 },
        ];
        assert_eq!(sum_amounts(&items), 6500.5);
    }

    #[test]
    fn weight_total_is_advisory_not_capped() {
        let activities = vec![
            Activity { weight: 60, ..Activity::default() },
            Activity { weight: 55, ..Activity::default() },
        ];
        assert_eq!(total_weight(&activities), 115);
    }

    #[test]
    fn flat_seasonality_is_unchanged_up_to_rounding() {
        let normalized = normalize_seasonality(&[1.0; 12]);
        for w in &normalized {
            assert!((w - 1.0).abs() < 1e-12);
        }
        let sum: f64 = normalized.iter().sum();
        assert!((sum - 12.0).abs() < 1e-9);
    }

    #[test]
    fn skewed_seasonality_sums_to_twelve() {
        let mut weights = vec![0.5; 12];
        weights[11] = 6.0;
        let normalized = normalize_seasonality(&weights);
        let sum: f64 = normalized.iter().sum();
        assert!((sum - 12.0).abs() < 1e-9);
        assert!(normalized[11] > normalized[0]);
    }

    #[test]
    fn zero_total_seasonality_is_a_no_op() {
        let zeros = vec![0.0; 12];
        assert_eq!(normalize_seasonality(&zeros), zeros);
    }

    #[test]
    fn add_then_remove_restores_totals_bit_for_bit() {
        let mut products = vec![
            product(19.99, 120.0, Frequency::Monthly),
            product(450.0, 7.0, Frequency::Quarterly),
        ];
        let before_len = products.len();
        let before_total = annualize_revenue(&products);

        products.push(product(3.5, 999.0, Frequency::Monthly));
        assert_ne!(annualize_revenue(&products), before_total);

        products.pop();
        assert_eq!(products.len(), before_len);
        assert_eq!(annualize_revenue(&products).to_bits(), before_total.to_bits());
    }
}
