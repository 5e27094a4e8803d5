use crate::numfmt::lenient_number;
use serde::{Deserialize, Serialize};

/// How often a recurring amount applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
}

impl Frequency {
    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
        }
    }
}

/// A product or service the business sells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sales_volume: f64,
    #[serde(default)]
    pub sales_volume_unit: Frequency,
}

/// A recurring operating expense. Seeded default categories are marked
/// `readonly`; their item name is fixed and the row cannot be removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub item: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub readonly: bool,
}

/// An asset or liability row on the forecast page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
}

/// A startup activity with an importance weight and completion progress,
/// both in percent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub progress: u32,
}

/// One month of a loan amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub principal_payment: f64,
    pub interest_payment: f64,
    pub remaining_balance: f64,
}

/// Per-year principal/interest totals, derived from the schedule on demand
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAggregate {
    pub year: u32,
    pub principal: f64,
    pub interest: f64,
}

/// Forecast inputs plus the derived figures persisted after each
/// recalculation so other pages (loan assessment) can read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParams {
    pub cogs_percentage: f64,
    pub tax_rate: f64,
    pub annual_operating_expenses: f64,
    pub seasonality: Vec<f64>,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub interest_expense: f64,
    pub depreciation: f64,
    pub total_annual_revenue: f64,
    pub annual_net_profit: f64,
    pub quarterly_net_profit: f64,
    pub net_operating_income: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            cogs_percentage: 35.0,
            tax_rate: 8.0,
            annual_operating_expenses: 0.0,
            seasonality: vec![1.0; 12],
            current_assets: 0.0,
            current_liabilities: 0.0,
            interest_expense: 0.0,
            depreciation: 0.0,
            total_annual_revenue: 0.0,
            annual_net_profit: 0.0,
            quarterly_net_profit: 0.0,
            net_operating_income: 0.0,
        }
    }
}

/// The last loan run through the calculator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanState {
    pub amount: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    pub monthly_payment: f64,
    pub schedule: Vec<ScheduleEntry>,
}

/// The authoritative planning session, persisted as one JSON document and
/// rewritten on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub company_name: String,
    pub products: Vec<Product>,
    pub expenses: Vec<Expense>,
    pub assets: Vec<LineItem>,
    pub liabilities: Vec<LineItem>,
    pub activities: Vec<Activity>,
    pub params: ForecastParams,
    pub loan: LoanState,
    pub revision: u64,
    pub last_saved: Option<String>,
}

impl SessionData {
    /// A fresh session: empty row collections apart from the default expense
    /// categories and the standard startup-activity checklist.
    pub fn seeded() -> Self {
        Self {
            expenses: default_expenses(),
            activities: default_activities(),
            ..Self::default()
        }
    }

    /// Highest activity id in use, for assigning ids to new rows.
    pub fn max_activity_id(&self) -> u64 {
        self.activities.iter().map(|a| a.id).max().unwrap_or(0)
    }
}

fn default_expenses() -> Vec<Expense> {
    ["Rent", "Utilities", "Salaries and wages", "Insurance", "Marketing"]
        .into_iter()
        .map(|item| Expense {
            item: item.to_string(),
            amount: 0.0,
            frequency: Frequency::Monthly,
            readonly: true,
        })
        .collect()
}

fn default_activities() -> Vec<Activity> {
    [
        ("Register the business entity", "Choose a structure and file the paperwork"),
        ("Open a business bank account", "Separate business and personal finances"),
        ("Write the business plan", "Mission, market, and financial projections"),
        ("Secure initial funding", "Savings, loans, or outside investment"),
        ("Find a location", "Lease, buy, or set up a home office"),
        ("Obtain licenses and permits", "Local, state, and industry requirements"),
        ("Set up bookkeeping", "Accounting system and tax registrations"),
        ("Build an online presence", "Website, listings, and social accounts"),
        ("Hire initial staff", "Define roles and start recruiting"),
        ("Plan the launch", "Opening promotion and first customers"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (activity, description))| Activity {
        id: i as u64 + 1,
        activity: activity.to_string(),
        description: description.to_string(),
        weight: 10,
        progress: 0,
    })
    .collect()
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
pub struct SaveDetailsRequest {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub company_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveActivitiesRequest {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub revision: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    pub status: String,
    pub revision: u64,
    pub total_weight: u32,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    #[serde(default = "default_cogs", deserialize_with = "lenient_number")]
    pub cogs_percentage: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub annual_operating_expenses: f64,
    #[serde(default = "default_tax", deserialize_with = "lenient_number")]
    pub tax_rate: f64,
    #[serde(default = "default_seasonality")]
    pub seasonality: Vec<f64>,
    #[serde(default)]
    pub assets: Vec<LineItem>,
    #[serde(default)]
    pub liabilities: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub depreciation: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_assets: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_liabilities: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub interest_expense: f64,
}

fn default_cogs() -> f64 {
    35.0
}

fn default_tax() -> f64 {
    8.0
}

fn default_seasonality() -> Vec<f64> {
    vec![1.0; 12]
}

/// Loan calculator form fields arrive as display strings (the amount keeps
/// its thousands separators).
#[derive(Debug, Deserialize)]
pub struct LoanForm {
    #[serde(default)]
    pub loan_amount: String,
    #[serde(default)]
    pub interest_rate: String,
    #[serde(default)]
    pub loan_term: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub year: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub term_years: u32,
    pub monthly_payment: f64,
    pub yearly: Vec<YearAggregate>,
    pub schedule: Vec<ScheduleEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_fields_accept_grouped_strings_and_null() {
        let product: Product = serde_json::from_str(
            r#"{"description":"Widget","price":"1,250.50","sales_volume":null,"sales_volume_unit":"quarterly"}"#,
        )
        .unwrap();
        assert_eq!(product.price, 1250.5);
        assert_eq!(product.sales_volume, 0.0);
        assert_eq!(product.sales_volume_unit, Frequency::Quarterly);
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut data = SessionData::seeded();
        data.products.push(Product {
            description: "Consulting".to_string(),
            price: 150.0,
            sales_volume: 20.0,
            sales_volume_unit: Frequency::Monthly,
        });
        data.revision = 3;

        let json = serde_json::to_string(&data).unwrap();
        let back: SessionData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.products.len(), 1);
        assert_eq!(back.revision, 3);
        assert_eq!(back.activities.len(), 10);
        assert!(back.expenses.iter().all(|e| e.readonly));
    }

    #[test]
    fn old_documents_without_new_fields_still_load() {
        let data: SessionData = serde_json::from_str(r#"{"company_name":"Acme"}"#).unwrap();
        assert_eq!(data.company_name, "Acme");
        assert_eq!(data.revision, 0);
        assert_eq!(data.params.cogs_percentage, 35.0);
        assert_eq!(data.params.seasonality, vec![1.0; 12]);
    }

    #[test]
    fn max_activity_id_tracks_seeded_rows() {
        let data = SessionData::seeded();
        assert_eq!(data.max_activity_id(), 10);
        assert_eq!(SessionData::default().max_activity_id(), 0);
    }
}
