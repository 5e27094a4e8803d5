use crate::models::SessionData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Shared handle to the authoritative session document. The mutex is the
/// only synchronization point; every handler mutation happens inside it.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<SessionData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: SessionData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }
}
