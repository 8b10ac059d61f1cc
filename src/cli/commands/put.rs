//! Put command - store a file as a cache entry

use crate::cli::args::PutArgs;
use crate::config::Config;
use crate::error::{HoardError, HoardResult};
use crate::store::CacheKey;
use console::style;
use std::fs;
use tracing::debug;

/// Execute the put command
pub fn execute(args: PutArgs, config: &Config) -> HoardResult<()> {
    let bytes = fs::read(&args.file)
        .map_err(|e| HoardError::io(format!("reading {}", args.file.display()), e))?;

    let key = match args.key {
        Some(ref k) => CacheKey::parse(k)?,
        None => CacheKey::from_content(&bytes),
    };
    debug!("Storing {} as {}", args.file.display(), key);

    let store = super::open_store(config)?;
    if store.put(&key, &bytes)? {
        println!("{} {}", style("stored").green(), key);
    } else {
        println!("{} {}", style("cached").dim(), key);
    }

    Ok(())
}
