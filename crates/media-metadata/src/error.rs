use std::path::Path;

use lb_utils::error::FileIOError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("embedded metadata is unreadable <path='{}'>: {source}", .path.display())]
	Unreadable {
		path: Box<Path>,
		#[source]
		source: CodecError,
	},
	#[error("embedded metadata is unwritable <path='{}'>: {source}", .path.display())]
	Unwritable {
		path: Box<Path>,
		#[source]
		source: CodecError,
	},
}

impl Error {
	#[must_use]
	pub fn path(&self) -> &Path {
		match self {
			Self::Unreadable { path, .. } | Self::Unwritable { path, .. } => path,
		}
	}

	pub(crate) fn unreadable(path: impl AsRef<Path>, source: impl Into<CodecError>) -> Self {
		Self::Unreadable {
			path: path.as_ref().into(),
			source: source.into(),
		}
	}

	pub(crate) fn unwritable(path: impl AsRef<Path>, source: impl Into<CodecError>) -> Self {
		Self::Unwritable {
			path: path.as_ref().into(),
			source: source.into(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("error from the exif crate: {0}")]
	Exif(#[from] exif::Error),
	#[error("writing embedded metadata is only supported for JPEG files")]
	UnsupportedContainer,
	#[error("malformed JPEG stream: {0}")]
	MalformedJpeg(&'static str),
	#[error("the encoded metadata block is too large for a JPEG segment ({0} bytes)")]
	BlockTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
