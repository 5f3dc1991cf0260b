//! Logger setup shared by the daemon and the migration runner.
//!
//! Modules log through the `log` macros directly; the only thing needed at
//! startup is wiring them to env_logger.

use env_logger::Env;

/// Initialize env_logger. Output defaults to info level so a bare daemon
/// start reports ingestion cycles without `RUST_LOG` being set.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
