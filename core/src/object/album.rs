//! Albums own a path segment and a tag list, nothing more

use crate::infra::db::entities::album;

use super::{
	tag::{parse_tag_list, TagDiff, TagError, TagTarget, TagVocabulary},
	normalize_relative_path,
};

use chrono::Utc;
use sea_orm::{
	ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
	QueryOrder, Set, SqlErr, TransactionTrait,
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AlbumError {
	#[error("invalid {field}: {message}")]
	Validation {
		field: &'static str,
		message: String,
	},
	#[error("an album already exists at <path='{0}'>")]
	DuplicatePath(String),
	#[error("album not found <id={0}>")]
	NotFound(i32),
	#[error(transparent)]
	Tag(#[from] TagError),
	#[error("database error: {0}")]
	Database(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct Albums {
	db: DatabaseConnection,
	tags: TagVocabulary,
}

impl Albums {
	#[must_use]
	pub fn new(db: DatabaseConnection) -> Self {
		Self {
			db,
			tags: TagVocabulary,
		}
	}

	pub async fn create(&self, path: &str, title: &str) -> Result<album::Model, AlbumError> {
		let path = normalize_relative_path(path.trim_matches('/')).map_err(|message| {
			AlbumError::Validation {
				field: "path",
				message,
			}
		})?;
		if title.trim().is_empty() {
			return Err(AlbumError::Validation {
				field: "title",
				message: "title is empty".to_string(),
			});
		}

		let album = album::ActiveModel {
			path: Set(path.clone()),
			title: Set(title.to_string()),
			created_at: Set(Utc::now()),
			..Default::default()
		}
		.insert(&self.db)
		.await
		.map_err(|e| match e.sql_err() {
			Some(SqlErr::UniqueConstraintViolation(_)) => AlbumError::DuplicatePath(path.clone()),
			_ => AlbumError::Database(e),
		})?;

		info!(album_id = album.id, path = %album.path, "created album");

		Ok(album)
	}

	pub async fn find(&self, id: i32) -> Result<album::Model, AlbumError> {
		album::Entity::find_by_id(id)
			.one(&self.db)
			.await?
			.ok_or(AlbumError::NotFound(id))
	}

	pub async fn find_by_path(&self, path: &str) -> Result<Option<album::Model>, AlbumError> {
		// No album can live at a path that doesn't normalize
		let Ok(path) = normalize_relative_path(path.trim_matches('/')) else {
			return Ok(None);
		};

		Ok(album::Entity::find()
			.filter(album::Column::Path.eq(path))
			.one(&self.db)
			.await?)
	}

	pub async fn list(&self) -> Result<Vec<album::Model>, AlbumError> {
		Ok(album::Entity::find()
			.order_by_asc(album::Column::Path)
			.all(&self.db)
			.await?)
	}

	pub async fn tag_list(&self, id: i32) -> Result<String, AlbumError> {
		self.find(id).await?;
		Ok(self.tags.tag_list(&self.db, TagTarget::Album(id)).await?)
	}

	/// Replaces the album's tags with the tokens of the space-separated `tag_list`
	pub async fn set_tag_list(&self, id: i32, tag_list: &str) -> Result<TagDiff, AlbumError> {
		self.find(id).await?;

		let txn = self.db.begin().await?;
		let diff = self
			.tags
			.sync(&txn, TagTarget::Album(id), parse_tag_list(tag_list))
			.await?;
		txn.commit().await?;

		Ok(diff)
	}
}
