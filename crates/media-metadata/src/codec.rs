use std::{
	fs,
	io::Write,
	path::{Path, PathBuf},
};

use exif::Tag;
use lb_utils::error::FileIOError;
use tracing::{debug, trace};

use crate::{
	error::{CodecError, Error, Result},
	exif::{encode_block, ExifReader, DOCUMENT_NAME, LAT_MAX_POS, LONG_MAX_POS},
	jpeg,
};

/// The embedded fields a photo reads on ingest and pushes back on edit.
///
/// Absent fields are `None` (or an empty keyword list), never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSnapshot {
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub keywords: Vec<String>,
}

impl MetadataSnapshot {
	fn from_reader(reader: &ExifReader) -> Self {
		Self {
			latitude: reader.coordinate(Tag::GPSLatitude, Tag::GPSLatitudeRef, LAT_MAX_POS),
			longitude: reader.coordinate(Tag::GPSLongitude, Tag::GPSLongitudeRef, LONG_MAX_POS),
			title: reader.ascii(DOCUMENT_NAME),
			description: reader.ascii(Tag::ImageDescription),
			keywords: reader.keywords(),
		}
	}
}

/// Boundary adapter between photo records and the Exif block of their files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCodec;

impl MetadataCodec {
	pub fn read(&self, path: impl AsRef<Path>) -> Result<MetadataSnapshot> {
		let path = path.as_ref();

		let snapshot = match open(path) {
			Ok(Some(reader)) => MetadataSnapshot::from_reader(&reader),
			Ok(None) => MetadataSnapshot::default(),
			Err(e) => return Err(Error::unreadable(path, e)),
		};

		trace!(path = %path.display(), ?snapshot, "read embedded metadata");

		Ok(snapshot)
	}

	/// Replaces the managed fields of the file at `path` with `fields`.
	///
	/// Fields that are `None` end up absent from the file. The new content is staged in a
	/// temporary file next to `path` and renamed over it, so readers only ever observe the
	/// old or the new block.
	pub fn write(&self, path: impl AsRef<Path>, fields: &MetadataSnapshot) -> Result<()> {
		let path = path.as_ref();

		let data = fs::read(path)
			.map_err(|e| FileIOError::from((path, e)))
			.map_err(|e| Error::unwritable(path, e))?;

		if !jpeg::is_jpeg(&data) {
			return Err(Error::unwritable(path, CodecError::UnsupportedContainer));
		}

		let existing = match ExifReader::from_slice(&data) {
			Ok(reader) => Some(reader),
			Err(e) if is_missing_block(&e) => None,
			Err(e) => return Err(Error::unwritable(path, e)),
		};

		let rewritten = encode_block(existing.as_ref(), fields)
			.and_then(|block| jpeg::replace_exif(&data, block.as_deref()))
			.map_err(|e| Error::unwritable(path, e))?;

		persist_atomically(path, &rewritten).map_err(|e| Error::unwritable(path, e))?;

		debug!(path = %path.display(), "wrote embedded metadata");

		Ok(())
	}

	/// Every field of the embedded block as `(tag, value)` pairs, for diagnostics.
	pub fn dump(&self, path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
		let path = path.as_ref();
		open(path)
			.map(|reader| reader.map(|reader| reader.entries()).unwrap_or_default())
			.map_err(|e| Error::unreadable(path, e))
	}
}

fn open(path: &Path) -> std::result::Result<Option<ExifReader>, CodecError> {
	match ExifReader::from_path(path) {
		Ok(reader) => Ok(Some(reader)),
		Err(e) if is_missing_block(&e) => Ok(None),
		Err(e) => Err(e),
	}
}

/// Files without a block, or containers that can't hold one, read as empty.
const fn is_missing_block(e: &CodecError) -> bool {
	matches!(
		e,
		CodecError::Exif(
			exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_)
		)
	)
}

fn persist_atomically(path: &Path, data: &[u8]) -> std::result::Result<(), CodecError> {
	let dir = path
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

	let mut staged = tempfile::Builder::new()
		.prefix(".lb-metadata-")
		.tempfile_in(&dir)
		.map_err(|e| FileIOError::from((&dir, e, "creating staging file")))?;

	staged
		.write_all(data)
		.and_then(|()| staged.as_file().sync_all())
		.map_err(|e| FileIOError::from((staged.path(), e)))?;

	// The staging file is created private, keep whatever the photo had
	let permissions = fs::metadata(path)
		.map_err(|e| FileIOError::from((path, e)))?
		.permissions();
	fs::set_permissions(staged.path(), permissions)
		.map_err(|e| FileIOError::from((staged.path(), e)))?;

	staged
		.persist(path)
		.map_err(|e| FileIOError::from((path, e.error, "renaming staged file")))?;

	Ok(())
}
