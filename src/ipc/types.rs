use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::records::Entity;
use crate::table::{Row, TableView};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Where a table session's rows come from.
pub enum TableSource {
    /// Rows pushed by the UI with `tables.open` / `tables.setRows`.
    Inline,
    /// Rows loaded from the store; `tables.refresh` reloads them.
    Entity { entity: Entity, filters: Row },
}

pub struct TableSession {
    pub view: TableView,
    pub source: TableSource,
    /// `AppState::tick` value of the last request that touched this session.
    pub last_used: u64,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub tables: HashMap<String, TableSession>,
    clock: u64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
            db: None,
            tables: HashMap::new(),
            clock: 0,
        }
    }

    /// Monotonic counter used to order table sessions by recent use.
    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Registers a session, first dropping the least recently used ones
    /// while `max_open_tables` are already open. Returns the evicted ids.
    pub fn insert_table(&mut self, table_id: String, mut session: TableSession) -> Vec<String> {
        let mut evicted = Vec::new();
        while !self.tables.is_empty() && self.tables.len() >= self.config.max_open_tables {
            let Some(oldest) = self
                .tables
                .iter()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.tables.remove(&oldest);
            log::warn!("table {} evicted: {} tables open", oldest, self.config.max_open_tables);
            evicted.push(oldest);
        }
        session.last_used = self.tick();
        self.tables.insert(table_id, session);
        evicted
    }
}
