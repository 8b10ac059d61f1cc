//! Integration tests for hoard

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Write a payload entry with a fixed modification time (ms since epoch)
fn write_aged_entry(dir: &Path, name: &str, modified_ms: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"cached output").unwrap();
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_millis(modified_ms);
    set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
    path
}

fn hex_name(c: char) -> String {
    c.to_string().repeat(32)
}

mod cleanup_tests {
    use super::*;
    use hoard::cleanup::{
        AgeBasedEviction, BuildRole, CleanupGate, CleanupScheduler, CleanupStatus, GateOutcome,
        NestedKind, RetentionPeriod,
    };
    use hoard::store::CacheStore;

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    #[test]
    fn root_build_removes_only_expired_entries() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path(), Duration::from_secs(1)).unwrap();
        let newest = write_aged_entry(store.base_dir(), &hex_name('a'), 10_000);
        let middle = write_aged_entry(store.base_dir(), &hex_name('b'), 5_000);
        let oldest = write_aged_entry(store.base_dir(), &hex_name('c'), 0);

        // One day of retention puts the threshold at 2000 ms
        let now = SystemTime::UNIX_EPOCH + Duration::from_millis(DAY_MS + 2_000);
        let strategy = AgeBasedEviction::new(RetentionPeriod::from_days(1).unwrap());
        let mut scheduler = CleanupScheduler::default();

        let outcomes = CleanupGate::new(BuildRole::Root)
            .run(&mut scheduler, &[store.clone()], now, &strategy);

        match outcomes.as_slice() {
            [GateOutcome::Checked(CleanupStatus::Cleaned(outcome))] => {
                assert_eq!(outcome.removed, 1);
                assert_eq!(outcome.reclaimed_bytes, b"cached output".len() as u64);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(newest.exists());
        assert!(middle.exists());
        assert!(!oldest.exists());
        assert!(store.properties_path().exists());

        let marker = fs::metadata(store.gc_marker_path()).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&marker).unix_seconds(),
            FileTime::from_system_time(now).unix_seconds()
        );
    }

    #[test]
    fn nested_build_leaves_expired_entries() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path(), Duration::from_secs(1)).unwrap();
        let expired = write_aged_entry(store.base_dir(), &hex_name('d'), 0);
        let strategy = AgeBasedEviction::new(RetentionPeriod::from_days(1).unwrap());
        let mut scheduler = CleanupScheduler::default();

        let outcomes = CleanupGate::new(BuildRole::Nested(NestedKind::IncludedBuild))
            .run(&mut scheduler, &[store.clone()], SystemTime::now(), &strategy);

        assert_eq!(outcomes, vec![GateOutcome::Disabled]);
        assert!(expired.exists());
        assert!(!store.gc_marker_path().exists());
    }

    #[test]
    fn next_build_within_interval_does_not_scan() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path(), Duration::from_secs(1)).unwrap();
        let strategy = AgeBasedEviction::new(RetentionPeriod::from_days(1).unwrap());
        let now = SystemTime::now();

        let first = CleanupGate::new(BuildRole::Root)
            .run(&mut CleanupScheduler::default(), &[store.clone()], now, &strategy);
        assert!(matches!(
            first[0],
            GateOutcome::Checked(CleanupStatus::Cleaned(_))
        ));
        let marker_after_first = store.last_cleanup().unwrap();

        // An entry that would qualify if a scan happened
        let expired = write_aged_entry(store.base_dir(), &hex_name('e'), 0);

        let second = CleanupGate::new(BuildRole::Root)
            .run(
                &mut CleanupScheduler::default(),
                &[store.clone()],
                now + Duration::from_secs(60),
                &strategy,
            );

        assert_eq!(second, vec![GateOutcome::Checked(CleanupStatus::Skipped)]);
        assert!(expired.exists());
        assert_eq!(store.last_cleanup().unwrap(), marker_after_first);
    }

    #[test]
    fn writers_and_cleanup_share_one_store_across_threads() {
        use hoard::store::CacheKey;
        use std::thread;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let dir = dir.clone();
                thread::spawn(move || {
                    let store = CacheStore::open(&dir, Duration::from_secs(10)).unwrap();
                    for j in 0..10 {
                        let bytes = format!("output {i}-{j}");
                        store
                            .put(&CacheKey::from_content(bytes.as_bytes()), bytes.as_bytes())
                            .unwrap();
                    }
                })
            })
            .collect();

        let store = CacheStore::open(&dir, Duration::from_secs(10)).unwrap();
        let strategy = AgeBasedEviction::new(RetentionPeriod::from_days(1).unwrap());
        CleanupScheduler::default()
            .forced()
            .maybe_cleanup(&store, SystemTime::now(), &strategy)
            .unwrap();

        for writer in writers {
            writer.join().unwrap();
        }

        // Fresh entries survive and every published entry is complete
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 40);
        for entry in entries {
            let key = CacheKey::parse(&entry.key).unwrap();
            let bytes = store.get(&key).unwrap().unwrap();
            assert_eq!(CacheKey::from_content(&bytes), key);
        }
    }
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    /// Command isolated from the user's config and any enclosing build
    fn hoard(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("hoard");
        cmd.env_remove("HOARD_PARENT_BUILD")
            .env_remove("HOARD_CACHE_DIR")
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(temp.path().join("store"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("hoard")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build output cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("hoard")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("hoard"));
    }

    #[test]
    fn put_then_get_roundtrip() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("artifact.bin");
        fs::write(&input, b"compiled bytes").unwrap();
        let key = hex_name('7');

        hoard(&temp)
            .args(["put", "--key", &key])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains(key.as_str()));

        hoard(&temp)
            .args(["get", &key])
            .assert()
            .success()
            .stdout("compiled bytes");
    }

    #[test]
    fn get_missing_entry_fails() {
        let temp = TempDir::new().unwrap();

        hoard(&temp)
            .args(["get", &hex_name('0')])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache entry not found"));
    }

    #[test]
    fn invalid_key_rejected() {
        let temp = TempDir::new().unwrap();

        hoard(&temp)
            .args(["invalidate", "not-a-key"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache key"));
    }

    #[test]
    fn status_prints_summary_line() {
        let temp = TempDir::new().unwrap();

        hoard(&temp)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("0 entries, 0 bytes, last cleanup never"));
    }

    #[test]
    fn gc_removes_expired_entries() {
        let temp = TempDir::new().unwrap();
        let store_dir = temp.path().join("store");
        fs::create_dir_all(&store_dir).unwrap();
        let expired = write_aged_entry(&store_dir, &hex_name('1'), 0);

        hoard(&temp)
            .arg("gc")
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 1 entries"));

        assert!(!expired.exists());
        assert!(store_dir.join("gc.properties").exists());

        // Within the interval the next run does not scan
        hoard(&temp)
            .arg("gc")
            .assert()
            .success()
            .stdout(predicate::str::contains("not due"));
    }

    #[test]
    fn gc_disabled_for_nested_build() {
        let temp = TempDir::new().unwrap();
        let store_dir = temp.path().join("store");
        fs::create_dir_all(&store_dir).unwrap();
        let expired = write_aged_entry(&store_dir, &hex_name('2'), 0);

        hoard(&temp)
            .env("HOARD_PARENT_BUILD", "1")
            .arg("gc")
            .assert()
            .success()
            .stdout(predicate::str::contains("cleanup disabled"));

        hoard(&temp)
            .args(["gc", "--role", "build-logic"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleanup disabled"));

        assert!(expired.exists());
        assert!(!store_dir.join("gc.properties").exists());
        assert!(!store_dir.join("cache.properties").exists());
    }

    #[test]
    fn gc_rejects_retention_below_one_day() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("config.toml"),
            "[cache]\nretention_days = 0\n",
        )
        .unwrap();

        hoard(&temp)
            .arg("gc")
            .assert()
            .failure()
            .stderr(predicate::str::contains("at least a day"));

        // Rejected before any store was opened
        assert!(!temp.path().join("store").exists());
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();

        hoard(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();

        hoard(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }
}
