use crate::object::{media::rendition::RenditionError, tag::TagError};

use lb_utils::error::FileIOError;

use std::{fmt, path::Path};

use sea_orm::DbErr;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum PhotoError {
	#[error("invalid {field}: {message}")]
	Validation {
		field: &'static str,
		message: String,
	},
	#[error("a photo already exists at <path='{0}'>")]
	DuplicatePath(String),
	#[error("photo not found <id={0}>")]
	NotFound(i32),
	#[error("failed to write embedded metadata <path='{}'>: {source}", .path.display())]
	MetadataWriteFailed {
		path: Box<Path>,
		#[source]
		source: lb_media_metadata::Error,
	},
	#[error("{} file(s) could not be removed: {}", .failures.len(), join_errors(.failures))]
	CleanupIncomplete { failures: Vec<FileIOError> },
	#[error("metadata task failed: {0}")]
	Task(#[from] JoinError),
	#[error("database error: {0}")]
	Database(#[from] DbErr),
}

impl PhotoError {
	pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
		Self::Validation {
			field,
			message: message.into(),
		}
	}

	/// Maps a tag error, `field` names what the offending text came from
	pub(crate) fn from_tag(field: &'static str, e: TagError) -> Self {
		match e {
			TagError::EmptyText(text) => {
				Self::validation(field, format!("tag is empty after normalization: {text:?}"))
			}
			TagError::Unresolved(name) => Self::Database(DbErr::RecordNotFound(format!(
				"tag <name='{name}'> vanished while resolving"
			))),
			TagError::Database(e) => Self::Database(e),
		}
	}
}

fn join_errors(failures: &[FileIOError]) -> String {
	failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

/// The create step a non fatal failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
	MetadataRead,
	Renditions,
}

impl fmt::Display for IngestStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MetadataRead => f.write_str("metadata read"),
			Self::Renditions => f.write_str("renditions"),
		}
	}
}

#[derive(Error, Debug)]
pub enum IngestCause {
	#[error(transparent)]
	Metadata(#[from] lb_media_metadata::Error),
	#[error(transparent)]
	Rendition(#[from] RenditionError),
	#[error("ingest task failed: {0}")]
	Task(#[from] JoinError),
}

/// A file stage of a create that failed without undoing the created record
#[derive(Error, Debug)]
#[error("{stage} stage failed: {cause}")]
pub struct IngestFailed {
	pub stage: IngestStage,
	#[source]
	pub cause: IngestCause,
}

impl IngestFailed {
	pub(crate) fn new(stage: IngestStage, cause: impl Into<IngestCause>) -> Self {
		Self {
			stage,
			cause: cause.into(),
		}
	}
}
