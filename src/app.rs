use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/product-detail", get(handlers::product_detail))
        .route("/save-product-details", post(handlers::save_product_details))
        .route("/financial-forecast", get(handlers::financial_forecast))
        .route("/recalculate-forecast", post(handlers::recalculate_forecast))
        .route(
            "/loan-calculator",
            get(handlers::loan_calculator).post(handlers::submit_loan),
        )
        .route("/startup-activities", get(handlers::startup_activities))
        .route("/save-activities", post(handlers::save_activities))
        .route("/api/loan-schedule", get(handlers::loan_schedule))
        .route("/api/session", get(handlers::session))
        .with_state(state)
}
