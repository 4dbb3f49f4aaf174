use super::RenditionSize;

use lb_utils::error::FileIOError;

use std::path::Path;

use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum RenditionError {
	#[error("unsupported image <path='{}'>: {source}", .path.display())]
	UnsupportedImage {
		path: Box<Path>,
		#[source]
		source: lb_images::Error,
	},
	#[error("decoding task failed: {0}")]
	DecodeTask(#[source] JoinError),
	#[error("failed to write the {size} rendition: {source}")]
	WriteFailed {
		size: RenditionSize,
		#[source]
		source: WriteError,
	},
}

impl RenditionError {
	pub(super) fn unsupported(path: &Path, source: lb_images::Error) -> Self {
		Self::UnsupportedImage {
			path: path.into(),
			source,
		}
	}
}

#[derive(Error, Debug)]
pub enum WriteError {
	#[error("failed to encode image: {0}")]
	Encode(#[from] image::ImageError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("rendition path has no parent directory <path='{}'>", .0.display())]
	NoParent(Box<Path>),
	#[error("rendition task failed: {0}")]
	Task(#[from] JoinError),
}
