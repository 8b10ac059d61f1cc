//! Status command - one-line summary of the cache store

use crate::cli::args::StatusArgs;
use crate::config::Config;
use crate::error::HoardResult;
use crate::store::{format_bytes, CacheStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of a store's contents
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    pub store: String,
    pub entries: usize,
    pub total_bytes: u64,
    pub last_cleanup: Option<DateTime<Utc>>,
}

impl StoreSummary {
    /// Collect the summary for `store`
    pub fn collect(store: &CacheStore) -> HoardResult<Self> {
        let entries = store.entries()?;
        Ok(Self {
            store: store.base_dir().display().to_string(),
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            last_cleanup: store.last_cleanup()?.map(DateTime::<Utc>::from),
        })
    }

    /// Human-readable single line
    pub fn line(&self) -> String {
        let last = self
            .last_cleanup
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        format!(
            "{}: {} entries, {}, last cleanup {}",
            self.store,
            self.entries,
            format_bytes(self.total_bytes),
            last
        )
    }
}

/// Execute the status command
pub fn execute(args: StatusArgs, config: &Config) -> HoardResult<()> {
    let store = super::open_store(config)?;
    let summary = StoreSummary::collect(&store)?;

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{}", summary.line());
    }

    Ok(())
}
