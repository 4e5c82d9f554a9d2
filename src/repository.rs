use std::collections::HashMap;
use std::path::Path;

use crate::config::DatabaseConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::RawRow;

/// Source of raw message rows and user identities
#[cfg_attr(test, mockall::automock)]
pub trait MessageRepository {
    /// One row per (message, receiver) pair, with raw identities
    fn fetch_rows(&self) -> Result<Vec<RawRow>>;

    /// Username to email of every user
    fn fetch_users(&self) -> Result<HashMap<String, String>>;
}

/// Repository over a Mattermost SQLite database
pub struct SqliteRepository {
    database: Database,
    excluded_bot: Option<String>,
}

impl SqliteRepository {
    /// Open the database named by the configuration
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let database = Database::open(Path::new(&config.path))?;
        Ok(Self::new(database, config.excluded_bot.clone()))
    }

    #[must_use]
    pub const fn new(database: Database, excluded_bot: Option<String>) -> Self {
        Self {
            database,
            excluded_bot,
        }
    }
}

impl MessageRepository for SqliteRepository {
    fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        self.database.message_rows(self.excluded_bot.as_deref())
    }

    fn fetch_users(&self) -> Result<HashMap<String, String>> {
        Ok(self.database.user_emails()?.into_iter().collect())
    }
}
