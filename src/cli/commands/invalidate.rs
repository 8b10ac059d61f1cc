//! Invalidate command - remove a single entry

use crate::cli::args::InvalidateArgs;
use crate::config::Config;
use crate::error::HoardResult;
use crate::store::CacheKey;
use console::style;

/// Execute the invalidate command
pub fn execute(args: InvalidateArgs, config: &Config) -> HoardResult<()> {
    let key = CacheKey::parse(&args.key)?;
    let store = super::open_store(config)?;

    if store.invalidate(&key)? {
        println!("{} {}", style("removed").red(), key);
    } else {
        println!("No entry for {}", key);
    }

    Ok(())
}
