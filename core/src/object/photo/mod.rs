//! Photos: a source file on disk mirrored by a database record
//!
//! [`PhotoLifecycle`] is the only way records are created, edited and removed, so the
//! files a photo owns (its source, its renditions and the metadata embedded in the
//! source) follow the record through every transition.

use crate::infra::db::entities::{album, photo};

use super::media::rendition::Rendition;

use std::collections::BTreeSet;

use serde::Serialize;

mod error;
mod field;
mod lifecycle;

pub use error::{IngestCause, IngestFailed, IngestStage, PhotoError};
pub use field::{Field, FieldSource};
pub use lifecycle::PhotoLifecycle;

pub use crate::infra::db::entities::photo::PhotoState;

/// A persisted photo, with the bits of its album and tags callers usually need
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
	pub record: photo::Model,
	pub album_path: String,
	/// Sorted, space-joined names of the photo's tags
	pub tag_list: String,
}

impl Photo {
	#[must_use]
	pub const fn id(&self) -> i32 {
		self.record.id
	}

	#[must_use]
	pub fn tags(&self) -> BTreeSet<&str> {
		self.tag_list.split_whitespace().collect()
	}

	/// `<id>-<title>` with every run of non alphanumeric characters turned into `-`,
	/// stable enough to appear in URLs
	#[must_use]
	pub fn slug(&self) -> String {
		let mut slug = self.record.id.to_string();
		slug.push('-');

		let mut pending_dash = false;
		for c in self.record.title.chars() {
			if c.is_ascii_alphanumeric() {
				if pending_dash {
					slug.push('-');
					pending_dash = false;
				}
				slug.push(c);
			} else {
				pending_dash = true;
			}
		}
		if pending_dash {
			slug.push('-');
		}

		slug
	}
}

/// A photo whose bytes are on disk but which has no record yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPhoto {
	pub album_id: i32,
	/// `<album path>/<file name>`, relative to the photos root
	pub path: String,
	pub title: Field<String>,
	pub description: Field<String>,
	pub latitude: Field<f64>,
	pub longitude: Field<f64>,
	/// Tags supplied with the photo, they replace the album's tags as the seed
	pub tags: Vec<String>,
}

impl PendingPhoto {
	/// The record for a file uploaded as `file_name` into `album`, titled after the
	/// file until its embedded metadata says otherwise
	#[must_use]
	pub fn from_upload(album: &album::Model, file_name: &str) -> Self {
		Self {
			album_id: album.id,
			path: format!("{}/{file_name}", album.path),
			title: Field::fallback(file_name.to_string()),
			description: Field::unset(),
			latitude: Field::unset(),
			longitude: Field::unset(),
			tags: vec![],
		}
	}

	#[must_use]
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Field::user(Some(title.into()));
		self
	}

	#[must_use]
	pub fn with_description(mut self, description: Option<String>) -> Self {
		self.description = Field::user(description);
		self
	}

	#[must_use]
	pub fn with_location(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
		self.latitude = Field::user(latitude);
		self.longitude = Field::user(longitude);
		self
	}

	#[must_use]
	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}
}

/// Requested edits, `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoUpdate {
	pub title: Option<String>,
	pub description: Option<Option<String>>,
	pub latitude: Option<Option<f64>>,
	pub longitude: Option<Option<f64>>,
	/// Space-separated, replaces the photo's whole tag set
	pub tag_list: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoField {
	Title,
	Description,
	Latitude,
	Longitude,
	TagList,
}

#[derive(Debug)]
pub struct CreateReport {
	pub photo: Photo,
	pub renditions: Vec<Rendition>,
	pub failures: Vec<IngestFailed>,
}

impl CreateReport {
	/// Whether every file stage went through
	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}
}

#[derive(Debug, Default)]
pub struct RenditionReport {
	pub renditions: Vec<Rendition>,
	pub failures: Vec<IngestFailed>,
}

#[derive(Debug)]
pub struct UpdateReport {
	pub photo: Photo,
	pub changed: Vec<PhotoField>,
	/// `false` when nothing changed and the file was left alone
	pub metadata_written: bool,
}
