use crate::errors::AppError;
use crate::models::SessionData;
use chrono::Utc;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("PLANNER_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/session.json"))
}

/// Loads the session document, falling back to a freshly seeded session when
/// the file is missing or unreadable. Sessions saved before the activity
/// checklist existed get the default list backfilled.
pub async fn load_data(path: &Path) -> SessionData {
    let mut data = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse session file: {err}");
                SessionData::seeded()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionData::seeded(),
        Err(err) => {
            error!("failed to read session file: {err}");
            SessionData::seeded()
        }
    };

    if data.activities.is_empty() {
        data.activities = SessionData::seeded().activities;
    }

    data
}

/// Writes the whole document back, stamping the save time. Callers mutate
/// in memory first; a failed write leaves the previous file as
/// last-known-good.
pub async fn persist_data(path: &Path, data: &mut SessionData) -> Result<(), AppError> {
    data.last_saved = Some(Utc::now().to_rfc3339());
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
