//! KEEPSAKE - Embedded Region Store
//!
//! A single-file persistence layer storing named collections ("regions") of
//! key → multi-value records in a length-prefixed text container.
//!
//! ## Features
//! - **Regions**: named, case-insensitive collections of `Key → [String]` records
//! - **Staging**: add/replace/remove operations are queued and visible to reads
//!   before they reach disk
//! - **Commit**: `save()` rotates the live file to a `.bak` and rewrites it
//! - **Rollback**: `restore()` discards staged work and reloads the last durable state
//! - **Resilience**: a corrupt entry or zone is logged and skipped, never fatal
//! - **Concurrency**: optional `Arc + RwLock` handle for multi-threaded hosts
//!
//! ## Example
//! ```no_run
//! use keepsake::{config::Config, engine::Keepsake, types::Key};
//!
//! let mut store = Keepsake::open(Config::new("./data", "inventory")).unwrap();
//!
//! assert!(store.add_region("Tools"));
//! let mut tools = store.get_region("tools").unwrap().clone();
//! tools.add_item(Key::from("hammer"), vec!["steel".into(), "12".into()]);
//! assert!(store.replace_region(tools));
//! store.save().unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;
