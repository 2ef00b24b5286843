//! # gitops-db
//!
//! Persistence and ownership-authorization layer for a multi-tenant GitOps
//! control plane.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use gitops_db::config::DatabaseConfig;
//! use gitops_db::store::{CheckedStore, SqliteStore, Store};
//!
//! let store = SqliteStore::open(&DatabaseConfig::default()).unwrap();
//! store.initialize().unwrap();
//!
//! // Tenant-facing reads go through the checked interface. A record the user
//! // has no grant for looks exactly like a record that does not exist.
//! match store.checked_get_managed_environment_by_id("env-1", "user-1") {
//!     Ok(env) => println!("{}", env.name),
//!     Err(e) if e.is_not_found() => println!("no such environment"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `gitops-db` maintenance binary.

pub mod config;
pub mod error;
pub mod store;
pub mod types;
