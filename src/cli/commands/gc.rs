//! Gc command - end-of-build cache maintenance

use crate::cleanup::{BuildRole, CleanupGate, CleanupStatus, GateOutcome};
use crate::cli::args::GcArgs;
use crate::config::Config;
use crate::error::HoardResult;
use crate::store::{format_bytes, CacheStore};
use console::style;
use std::fmt::Display;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Execute the gc command for a build in `role`
pub fn execute(args: GcArgs, config: &Config, role: BuildRole) -> HoardResult<()> {
    // Configuration errors surface before any store is touched
    let strategy = config.cache.eviction()?;
    let mut scheduler = config.cache.scheduler()?;
    if args.force {
        scheduler = scheduler.forced();
    }

    let mut dirs = vec![config.cache.store_dir()];
    dirs.extend(args.stores);

    // Nested builds neither open nor create stores
    if !role.is_root() {
        debug!("Cache cleanup disabled for {} build", role);
        for dir in &dirs {
            println!("{}", describe(dir.display(), GateOutcome::Disabled));
        }
        return Ok(());
    }

    let mut stores = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        match CacheStore::open(dir, config.cache.lock_timeout()) {
            Ok(store) => stores.push(store),
            Err(e) => {
                warn!("Could not open cache store {}: {}", dir.display(), e);
                println!("{}", describe(dir.display(), GateOutcome::Failed(e.to_string())));
            }
        }
    }
    debug!("Running cache maintenance for {} store(s) as {} build", stores.len(), role);

    let outcomes = CleanupGate::new(role).run(&mut scheduler, &stores, SystemTime::now(), &strategy);

    for (store, outcome) in stores.iter().zip(outcomes) {
        println!("{}", describe(store, outcome));
    }

    Ok(())
}

fn describe(store: impl Display, outcome: GateOutcome) -> String {
    match outcome {
        GateOutcome::Disabled => format!(
            "{} {}: cleanup disabled for nested builds",
            style("-").dim(),
            store
        ),
        GateOutcome::Checked(CleanupStatus::AlreadyChecked) => {
            format!("{} {}: already checked", style("-").dim(), store)
        }
        GateOutcome::Checked(CleanupStatus::Skipped) => {
            format!("{} {}: not due", style("-").dim(), store)
        }
        GateOutcome::Checked(CleanupStatus::Cleaned(o)) => format!(
            "{} {}: removed {} entries ({} reclaimed)",
            style("✓").green(),
            store,
            o.removed,
            format_bytes(o.reclaimed_bytes)
        ),
        GateOutcome::Failed(reason) => {
            format!("{} {}: skipped ({})", style("!").yellow(), store, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::EvictionOutcome;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn describe_outcomes() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path(), Duration::from_millis(200)).unwrap();

        assert!(describe(&store, GateOutcome::Disabled).contains("disabled"));
        assert!(describe(&store, GateOutcome::Checked(CleanupStatus::Skipped)).contains("not due"));

        let cleaned = GateOutcome::Checked(CleanupStatus::Cleaned(EvictionOutcome {
            candidates: 2,
            removed: 2,
            reclaimed_bytes: 4096,
        }));
        assert!(describe(&store, cleaned).contains("removed 2 entries (4 KB reclaimed)"));

        let failed = GateOutcome::Failed("lock not acquired".to_string());
        assert!(describe(&store, failed).contains("skipped (lock not acquired)"));
    }

    #[test]
    fn nested_build_does_not_create_stores() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(temp.path().join("store"));
        let args = GcArgs {
            stores: vec![temp.path().join("extra")],
            role: None,
            force: false,
        };

        execute(args, &config, BuildRole::Nested(crate::cleanup::NestedKind::BuildLogic)).unwrap();

        assert!(!temp.path().join("store").exists());
        assert!(!temp.path().join("extra").exists());
    }

    #[test]
    fn one_locked_store_does_not_fail_the_run() {
        use crate::store::LockMode;

        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(temp.path().join("store"));
        config.cache.lock_timeout_secs = 0;
        let locked = CacheStore::open(temp.path().join("store"), Duration::from_secs(1)).unwrap();
        let _writer = locked.lock(LockMode::Exclusive).unwrap();
        let args = GcArgs {
            stores: vec![temp.path().join("extra")],
            role: None,
            force: false,
        };

        execute(args, &config, BuildRole::Root).unwrap();

        assert!(locked.last_cleanup().unwrap().is_none());
        assert!(temp.path().join("extra").join("gc.properties").exists());
    }
}
