//! Library configuration management

use anyhow::Result;

pub mod library_config;

pub use library_config::LibraryConfig;

/// Brings a persisted configuration up to the current schema version.
pub trait Migrate {
	fn current_version(&self) -> u32;

	fn target_version() -> u32;

	fn migrate(&mut self) -> Result<()>;
}
