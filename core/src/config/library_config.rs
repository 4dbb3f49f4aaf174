//! Library configuration

use super::Migrate;
use crate::object::media::rendition::RenditionSize;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "lightbox.json";

/// Main library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
	/// Config schema version
	pub version: u32,

	/// Data directory path
	pub data_dir: PathBuf,

	/// Root of the original photo files, a photo's `path` is relative to it
	pub photos_path: PathBuf,

	/// Root of the generated renditions
	pub renditions_path: PathBuf,

	/// URL prefix the presentation layer serves originals under
	#[serde(default = "default_photos_url_prefix")]
	pub photos_url_prefix: String,

	/// URL prefix the presentation layer serves renditions under
	#[serde(default = "default_renditions_url_prefix")]
	pub renditions_url_prefix: String,

	/// Database file name (relative to data_dir)
	pub database_file: String,

	/// Logging level
	pub log_level: String,
}

fn default_photos_url_prefix() -> String {
	"/photos/".to_string()
}

fn default_renditions_url_prefix() -> String {
	"/renditions/".to_string()
}

impl LibraryConfig {
	/// Load configuration from a specific data directory
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)?;
			let mut config: LibraryConfig = serde_json::from_str(&json)?;

			if config.version < Self::target_version() {
				info!(
					"Migrating config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.migrate()?;
				config.save()?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		}
	}

	/// Load configuration, writing the default one only when none exists yet.
	///
	/// A config file that can't be read or parsed is an error and stays untouched on disk.
	pub fn load_or_create(data_dir: &Path) -> Result<Self> {
		Self::load_from(data_dir).with_context(|| {
			format!(
				"failed to load config from {:?}",
				data_dir.join(CONFIG_FILE_NAME)
			)
		})
	}

	/// Create default configuration with specific data directory
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			photos_path: data_dir.join("photos"),
			renditions_path: data_dir.join("renditions"),
			photos_url_prefix: default_photos_url_prefix(),
			renditions_url_prefix: default_renditions_url_prefix(),
			database_file: "library.db".to_string(),
			log_level: "info".to_string(),
			data_dir,
		}
	}

	/// Save configuration to disk
	pub fn save(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;

		let config_path = self.data_dir.join(CONFIG_FILE_NAME);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	/// Get the path for logs directory
	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	/// Get the path of the library database
	pub fn database_path(&self) -> PathBuf {
		self.data_dir.join(&self.database_file)
	}

	/// Absolute location of a photo's original file
	pub fn source_path(&self, photo_path: &str) -> PathBuf {
		self.photos_path.join(photo_path)
	}

	/// Directory holding the renditions of every photo in the album at `album_path`
	pub fn rendition_dir(&self, album_path: &str) -> PathBuf {
		self.renditions_path.join(album_path)
	}

	/// URL path the presentation layer serves a photo's original under
	pub fn public_source_path(&self, photo_path: &str) -> String {
		format!("{}{photo_path}", self.photos_url_prefix)
	}

	/// URL path the presentation layer serves one rendition under
	pub fn public_rendition_path(
		&self,
		album_path: &str,
		photo_id: i32,
		size: RenditionSize,
		extension: &str,
	) -> String {
		format!(
			"{}{album_path}/{}",
			self.renditions_url_prefix,
			size.file_name(photo_id, extension)
		)
	}

	/// Ensure all required directories exist
	pub fn ensure_directories(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;
		fs::create_dir_all(self.logs_dir())?;
		fs::create_dir_all(&self.photos_path)?;
		fs::create_dir_all(&self.renditions_path)?;
		Ok(())
	}
}

impl Migrate for LibraryConfig {
	fn current_version(&self) -> u32 {
		self.version
	}

	fn target_version() -> u32 {
		1
	}

	fn migrate(&mut self) -> Result<()> {
		match self.version {
			0 => {
				// v0 files predate the URL prefixes, serde already filled the defaults in
				self.version = 1;
				Ok(())
			}
			1 => Ok(()), // Already at target version
			v => Err(anyhow!("Unknown config version: {}", v)),
		}
	}
}
