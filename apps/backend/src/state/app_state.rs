use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::messaging::{LoggingMessenger, Messenger};
use crate::scheduler::Scheduler;
use crate::services::settings::SettingsService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Runtime settings (cached row store)
    pub settings: Arc<SettingsService>,
    /// Durable task scheduler (timer runtime)
    pub scheduler: Arc<Scheduler>,
    /// Outbound messaging port
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    /// Create a new AppState around an established database connection.
    pub fn new(db: DatabaseConnection, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            settings: Arc::new(SettingsService::new(db.clone())),
            scheduler: Scheduler::new(db.clone()),
            db,
            messenger,
        }
    }

    /// Test state with the logging messenger.
    pub fn for_tests(db: DatabaseConnection) -> Self {
        Self::new(db, Arc::new(LoggingMessenger))
    }

    /// Test state with a caller-provided messenger (usually a recording one).
    pub fn for_tests_with_messenger(db: DatabaseConnection, messenger: Arc<dyn Messenger>) -> Self {
        Self::new(db, messenger)
    }
}
