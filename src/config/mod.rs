mod database;

pub use database::{DatabaseConfig, JournalMode};
