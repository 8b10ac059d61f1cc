//! hoard - content-addressed build output cache
//!
//! A cache store is a directory of immutable entries named by content key,
//! shared by every process of a build (daemons, forked helpers, nested
//! builds). Access is coordinated with advisory file locks, and stale
//! entries are removed by an age-based cleanup that runs at most once per
//! check interval and only from the root build.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;

pub use error::{HoardError, HoardResult};
