// migratetool/src/migrate/mod.rs
//! The migration pipeline: fetch dump, transform it, upload and import it,
//! copy the application file tree, patch the destination credentials. Each
//! step is independently invocable and retryable.

pub mod archive;
pub mod credentials;
pub mod dump;
pub mod files;
pub mod logic;
pub mod transform;

pub use logic::{MigrateOptions, plan, run_migrate_flow};
