//! Get command - copy an entry out of the cache

use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{HoardError, HoardResult};
use crate::store::CacheKey;
use std::fs;
use std::io::{self, Write};

/// Execute the get command
pub fn execute(args: GetArgs, config: &Config) -> HoardResult<()> {
    let key = CacheKey::parse(&args.key)?;
    let store = super::open_store(config)?;

    let bytes = store
        .get(&key)?
        .ok_or_else(|| HoardError::EntryNotFound(key.to_string()))?;

    match args.output {
        Some(path) => fs::write(&path, &bytes)
            .map_err(|e| HoardError::io(format!("writing {}", path.display()), e)),
        None => io::stdout()
            .lock()
            .write_all(&bytes)
            .map_err(|e| HoardError::io("writing entry to stdout", e)),
    }
}
