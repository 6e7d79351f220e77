use anyhow::{anyhow, Context};
use log::LevelFilter;
use std::path::PathBuf;

use crate::table::TableOptions;

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened at startup; otherwise the UI sends `workspace.select`.
    pub workspace: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub default_page_size: usize,
    pub currency_symbol: String,
    /// Open table sessions kept at once; the least recently used one is
    /// dropped to make room.
    pub max_open_tables: usize,
}

pub const DEFAULT_MAX_OPEN_TABLES: usize = 64;

fn positive(name: &str, value: &str) -> anyhow::Result<usize> {
    let n = value
        .parse::<usize>()
        .with_context(|| format!("{name}: not a number: {value}"))?;
    if n == 0 {
        return Err(anyhow!("{name} must be greater than 0"));
    }
    Ok(n)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: LevelFilter::Warn,
            default_page_size: TableOptions::default().page_size,
            currency_symbol: "$".to_string(),
            max_open_tables: DEFAULT_MAX_OPEN_TABLES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(p) = get("SCHOOLD_WORKSPACE") {
            cfg.workspace = Some(PathBuf::from(p));
        }
        if let Some(level) = get("SCHOOLD_LOG") {
            cfg.log_level = level
                .parse::<LevelFilter>()
                .map_err(|_| anyhow!("SCHOOLD_LOG: unknown level {level}"))?;
        }
        if let Some(size) = get("SCHOOLD_PAGE_SIZE") {
            cfg.default_page_size = positive("SCHOOLD_PAGE_SIZE", &size)?;
        }
        if let Some(max) = get("SCHOOLD_MAX_TABLES") {
            cfg.max_open_tables = positive("SCHOOLD_MAX_TABLES", &max)?;
        }
        if let Some(sym) = lookup("SCHOOLD_CURRENCY") {
            if !sym.is_empty() {
                cfg.currency_symbol = sym;
            }
        }
        Ok(cfg)
    }
}
