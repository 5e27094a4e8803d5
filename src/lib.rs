pub mod app;
pub mod errors;
pub mod forecast;
pub mod handlers;
pub mod loan;
pub mod models;
pub mod numfmt;
pub mod storage;
pub mod totals;
pub mod ui;
pub mod state;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
