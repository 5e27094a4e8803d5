use crate::errors::AppError;
use crate::forecast::{self, ForecastResponse};
use crate::loan::{aggregate_by_year, calculate_loan_schedule, drill_down};
use crate::models::{
    ActivitiesResponse, LoanForm, LoanState, RecalculateRequest, SaveActivitiesRequest,
    SaveDetailsRequest, SaveResponse, ScheduleQuery, ScheduleResponse, SessionData,
};
use crate::numfmt::parse_formatted_number;
use crate::state::AppState;
use crate::storage::persist_data;
use crate::totals;
use crate::ui;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use tracing::info;

pub async fn index() -> Redirect {
    Redirect::to("/product-detail")
}

pub async fn product_detail(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(ui::render_product_detail(&data))
}

pub async fn save_product_details(
    State(state): State<AppState>,
    Json(payload): Json<SaveDetailsRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let mut data = state.data.lock().await;

    // Rows with no description are discarded rather than saved half-empty.
    data.products = payload
        .products
        .into_iter()
        .filter(|p| !p.description.trim().is_empty())
        .collect();
    data.expenses = payload
        .expenses
        .into_iter()
        .filter(|e| !e.item.trim().is_empty())
        .collect();
    data.company_name = payload.company_name.trim().to_string();

    data.params.annual_operating_expenses = totals::annualize_expenses(&data.expenses);
    refresh_derived(&mut data);
    data.revision += 1;

    persist_data(&state.data_path, &mut data).await?;

    Ok(Json(SaveResponse {
        status: "success".to_string(),
        revision: data.revision,
    }))
}

pub async fn financial_forecast(State(state): State<AppState>) -> Html<String> {
    let mut data = state.data.lock().await;
    data.params.annual_operating_expenses = totals::annualize_expenses(&data.expenses);
    let forecast = refresh_derived(&mut data);
    Html(ui::render_forecast(&data, &forecast))
}

pub async fn recalculate_forecast(
    State(state): State<AppState>,
    Json(payload): Json<RecalculateRequest>,
) -> Result<Json<ForecastResponse>, AppError> {
    if payload.seasonality.len() != 12 {
        return Err(AppError::bad_request("seasonality must contain 12 weights"));
    }

    let mut data = state.data.lock().await;

    data.assets = payload
        .assets
        .into_iter()
        .filter(|item| !item.description.trim().is_empty())
        .collect();
    data.liabilities = payload
        .liabilities
        .into_iter()
        .filter(|item| !item.description.trim().is_empty())
        .collect();

    data.params.cogs_percentage = payload.cogs_percentage;
    data.params.tax_rate = payload.tax_rate;
    data.params.annual_operating_expenses = payload.annual_operating_expenses;
    data.params.seasonality = payload.seasonality;
    data.params.current_assets = payload.current_assets;
    data.params.current_liabilities = payload.current_liabilities;
    data.params.interest_expense = payload.interest_expense;
    data.params.depreciation = payload.depreciation;

    let forecast = refresh_derived(&mut data);
    data.revision += 1;

    persist_data(&state.data_path, &mut data).await?;

    Ok(Json(forecast))
}

pub async fn loan_calculator(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(ui::render_loan(&data))
}

pub async fn submit_loan(
    State(state): State<AppState>,
    Form(form): Form<LoanForm>,
) -> Result<Redirect, AppError> {
    let amount = parse_formatted_number(&form.loan_amount, 0.0);
    let interest_rate = parse_formatted_number(&form.interest_rate, 0.0);
    let term_years = form.loan_term.trim().parse::<u32>().unwrap_or(0);

    let loan = calculate_loan_schedule(amount, interest_rate, term_years);
    info!(
        amount,
        interest_rate, term_years, months = loan.schedule.len(),
        "loan schedule computed"
    );

    let mut data = state.data.lock().await;
    data.loan = LoanState {
        amount,
        interest_rate,
        term_years,
        monthly_payment: loan.monthly_payment,
        schedule: loan.schedule,
    };
    data.revision += 1;

    persist_data(&state.data_path, &mut data).await?;

    Ok(Redirect::to("/loan-calculator"))
}

/// Yearly aggregates plus the schedule; with `?year=N` the schedule narrows
/// to that year's months. Recomputed from the stored schedule on every call.
pub async fn loan_schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Json<ScheduleResponse> {
    let data = state.data.lock().await;
    let schedule = match query.year {
        Some(year) => drill_down(&data.loan.schedule, year),
        None => data.loan.schedule.clone(),
    };

    Json(ScheduleResponse {
        term_years: data.loan.term_years,
        monthly_payment: data.loan.monthly_payment,
        yearly: aggregate_by_year(&data.loan.schedule),
        schedule,
    })
}

pub async fn startup_activities(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(ui::render_activities(&data))
}

pub async fn save_activities(
    State(state): State<AppState>,
    Json(payload): Json<SaveActivitiesRequest>,
) -> Result<Json<ActivitiesResponse>, AppError> {
    let mut data = state.data.lock().await;

    let mut next_id = data.max_activity_id();
    data.activities = payload
        .activities
        .into_iter()
        .filter(|a| !a.activity.trim().is_empty())
        .map(|mut a| {
            if a.id == 0 {
                next_id += 1;
                a.id = next_id;
            }
            a.weight = a.weight.min(100);
            a.progress = a.progress.min(100);
            a
        })
        .collect();

    let total_weight = totals::total_weight(&data.activities);
    if total_weight > 100 {
        // Advisory only; the badge turns red but the save goes through.
        info!(total_weight, "activity weights exceed 100%");
    }
    data.revision += 1;

    persist_data(&state.data_path, &mut data).await?;

    Ok(Json(ActivitiesResponse {
        status: "success".to_string(),
        revision: data.revision,
        total_weight,
        activities: data.activities.clone(),
    }))
}

pub async fn session(State(state): State<AppState>) -> Json<SessionData> {
    let data = state.data.lock().await;
    Json(data.clone())
}

/// Recomputes the forecast from the current session and persists the derived
/// headline figures into the params, so every page sees fresh totals before
/// any response goes out.
fn refresh_derived(data: &mut SessionData) -> ForecastResponse {
    let total_assets = totals::sum_amounts(&data.assets);
    let total_debt = totals::sum_amounts(&data.liabilities);
    let forecast =
        forecast::build_forecast(&data.products, &data.params, total_assets, total_debt);

    data.params.total_annual_revenue = forecast.annual.revenue;
    data.params.annual_net_profit = forecast.annual.net_profit;
    data.params.quarterly_net_profit = forecast.quarterly.net_profit;
    data.params.net_operating_income = forecast::net_operating_income(&forecast, &data.params);

    forecast
}
