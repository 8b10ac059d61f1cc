//! CLI command implementations

pub mod config;
pub mod gc;
pub mod get;
pub mod invalidate;
pub mod put;
pub mod status;

pub use config::execute as config;
pub use gc::execute as gc;
pub use get::execute as get;
pub use invalidate::execute as invalidate;
pub use put::execute as put;
pub use status::execute as status;

use crate::config::Config;
use crate::error::HoardResult;
use crate::store::CacheStore;

/// Open the configured store
fn open_store(config: &Config) -> HoardResult<CacheStore> {
    CacheStore::open(config.cache.store_dir(), config.cache.lock_timeout())
}
