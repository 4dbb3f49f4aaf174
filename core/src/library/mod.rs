//! An open photo library: its configuration, database and the services built on them

use crate::{
	config::LibraryConfig,
	infra::db::Database,
	object::{
		album::Albums,
		media::rendition::{source_extension, RenditionSize},
		photo::{Photo, PhotoLifecycle},
	},
};

use std::path::Path;

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use tracing::info;

pub struct Library {
	config: LibraryConfig,
	db: Database,
	lifecycle: PhotoLifecycle,
	albums: Albums,
}

impl Library {
	/// Opens (creating when missing) the library described by `config`
	pub async fn open(config: LibraryConfig) -> Result<Self> {
		config
			.ensure_directories()
			.context("failed to create library directories")?;

		let db = Database::create(&config.database_path())
			.await
			.context("failed to open library database")?;
		db.migrate()
			.await
			.context("failed to migrate library database")?;

		let lifecycle = PhotoLifecycle::new(
			db.conn().clone(),
			&config.photos_path,
			&config.renditions_path,
		);
		let albums = Albums::new(db.conn().clone());

		info!(data_dir = %config.data_dir.display(), "opened library");

		Ok(Self {
			config,
			db,
			lifecycle,
			albums,
		})
	}

	#[must_use]
	pub const fn config(&self) -> &LibraryConfig {
		&self.config
	}

	#[must_use]
	pub fn db(&self) -> &DatabaseConnection {
		self.db.conn()
	}

	#[must_use]
	pub const fn lifecycle(&self) -> &PhotoLifecycle {
		&self.lifecycle
	}

	#[must_use]
	pub const fn albums(&self) -> &Albums {
		&self.albums
	}

	/// URL path of the photo's original file
	#[must_use]
	pub fn public_source_path(&self, photo: &Photo) -> String {
		self.config.public_source_path(&photo.record.path)
	}

	/// URL path of one of the photo's renditions
	#[must_use]
	pub fn public_rendition_path(&self, photo: &Photo, size: RenditionSize) -> String {
		self.config.public_rendition_path(
			&photo.album_path,
			photo.id(),
			size,
			&source_extension(Path::new(&photo.record.path)),
		)
	}
}
