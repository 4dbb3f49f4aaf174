//! Resized derivatives of a photo
//!
//! Every photo gets the same fixed set of renditions, written next to each other under
//! the renditions root as `<album path>/<photo id>_<label><source extension>`. They are
//! not tracked anywhere else: a missing rendition is stale, never corrupt, and can be
//! regenerated from the source at any time.

use lb_images::{format_image, output_format, DynamicImage, ImageFormat};
use lb_utils::error::FileIOError;

use std::{
	fmt, fs,
	io::{Cursor, Write},
	path::{Path, PathBuf},
	sync::Arc,
};

use futures::{
	future::{BoxFuture, FutureExt},
	stream::FuturesOrdered,
};
use image::{imageops::FilterType, GenericImageView};
use serde::{Deserialize, Serialize};
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, instrument, trace};

mod error;

pub use error::{RenditionError, WriteError};

/// Renditions of one photo, yielded in [`RenditionSize::ALL`] order as each one completes.
pub type RenditionStream = FuturesOrdered<BoxFuture<'static, Result<Rendition, RenditionError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenditionSize {
	Thumb,
	Album,
	Large,
}

impl RenditionSize {
	pub const ALL: [Self; 3] = [Self::Thumb, Self::Album, Self::Large];

	#[must_use]
	pub const fn label(self) -> &'static str {
		match self {
			Self::Thumb => "thumb",
			Self::Album => "album",
			Self::Large => "large",
		}
	}

	/// Declared length of the long edge, in pixels
	#[must_use]
	pub const fn long_edge(self) -> u32 {
		match self {
			Self::Thumb => 85,
			Self::Album => 150,
			Self::Large => 800,
		}
	}

	/// `extension` is the source's, dot included (or empty)
	#[must_use]
	pub fn file_name(self, photo_id: i32, extension: &str) -> String {
		format!("{photo_id}_{}{extension}", self.label())
	}

	/// Dimensions of this rendition for a `width`x`height` source.
	///
	/// The long edge is the declared one, but never more than the source's, and the short
	/// edge keeps the aspect ratio, rounded to the nearest pixel and at least 1.
	#[must_use]
	pub fn dimensions(self, width: u32, height: u32) -> (u32, u32) {
		let long = width.max(height);
		if long == 0 {
			return (0, 0);
		}

		let target = self.long_edge().min(long);

		if width >= height {
			(target, scale_edge(height, width, target))
		} else {
			(scale_edge(width, height, target), target)
		}
	}
}

impl fmt::Display for RenditionSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// `short * target / long`, rounded half up, never below 1
fn scale_edge(short: u32, long: u32, target: u32) -> u32 {
	let (short, long, target) = (u64::from(short), u64::from(long), u64::from(target));
	let scaled = (2 * short * target + long) / (2 * long);
	u32::try_from(scaled).map_or(1, |scaled| scaled.max(1))
}

/// The extension of `source` with its leading dot, or an empty string
#[must_use]
pub fn source_extension(source: &Path) -> String {
	source
		.extension()
		.map(|ext| format!(".{}", ext.to_string_lossy()))
		.unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
	pub size: RenditionSize,
	pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenditionGenerator {
	root: PathBuf,
}

impl RenditionGenerator {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Directory holding the renditions of every photo of an album
	#[must_use]
	pub fn directory(&self, album_path: &str) -> PathBuf {
		self.root.join(album_path)
	}

	/// This does not check if the rendition exists, it just returns the path it would exist at
	#[must_use]
	pub fn path_for(
		&self,
		album_path: &str,
		photo_id: i32,
		size: RenditionSize,
		source: &Path,
	) -> PathBuf {
		self.directory(album_path)
			.join(size.file_name(photo_id, &source_extension(source)))
	}

	#[must_use]
	pub fn paths_for(
		&self,
		album_path: &str,
		photo_id: i32,
		source: &Path,
	) -> [(RenditionSize, PathBuf); 3] {
		RenditionSize::ALL.map(|size| (size, self.path_for(album_path, photo_id, size, source)))
	}

	/// Decodes `source` once and starts writing every rendition of it.
	///
	/// A source that can't be decoded fails the whole call before anything is written.
	/// Otherwise each size is resized, encoded and written on the blocking pool
	/// concurrently with the others, and fails on its own.
	#[instrument(skip(self, source), fields(source = %source.display()))]
	pub async fn generate(
		&self,
		source: &Path,
		album_path: &str,
		photo_id: i32,
	) -> Result<RenditionStream, RenditionError> {
		let format = output_format(source).map_err(|e| RenditionError::unsupported(source, e))?;

		let image = spawn_blocking({
			let source = source.to_path_buf();
			move || format_image(source)
		})
		.await?
		.map_err(|e| RenditionError::unsupported(source, e))?;

		trace!(
			width = image.width(),
			height = image.height(),
			?format,
			"decoded rendition source"
		);

		let image = Arc::new(image);

		Ok(self
			.paths_for(album_path, photo_id, source)
			.into_iter()
			.map(|(size, path)| {
				let image = Arc::clone(&image);
				let destination = path.clone();

				spawn_blocking(move || render(&image, size, format, &destination))
					.map(move |res| {
						res.map_err(WriteError::from)
							.and_then(|written| written)
							.map(|()| {
								debug!(%size, path = %path.display(), "wrote rendition");
								Rendition { size, path }
							})
							.map_err(|source| RenditionError::WriteFailed { size, source })
					})
					.boxed()
			})
			.collect())
	}
}

fn render(
	image: &DynamicImage,
	size: RenditionSize,
	format: ImageFormat,
	destination: &Path,
) -> Result<(), WriteError> {
	let (width, height) = size.dimensions(image.width(), image.height());

	let resized = if (width, height) == image.dimensions() {
		image.clone()
	} else {
		image.resize_exact(width, height, FilterType::Triangle)
	};

	// The JPEG encoder has no alpha channel support
	let resized = if format == ImageFormat::Jpeg {
		DynamicImage::ImageRgb8(resized.to_rgb8())
	} else {
		resized
	};

	let mut encoded = Cursor::new(vec![]);
	resized.write_to(&mut encoded, format)?;

	write_atomically(destination, encoded.get_ref())
}

fn write_atomically(destination: &Path, data: &[u8]) -> Result<(), WriteError> {
	let dir = destination
		.parent()
		.ok_or_else(|| WriteError::NoParent(destination.into()))?;

	fs::create_dir_all(dir)
		.map_err(|e| FileIOError::from((dir, e, "creating rendition directory")))?;

	let mut staged = tempfile::Builder::new()
		.prefix(".lb-rendition-")
		.tempfile_in(dir)
		.map_err(|e| FileIOError::from((dir, e, "creating staging file")))?;

	staged
		.write_all(data)
		.and_then(|()| staged.as_file().sync_all())
		.map_err(|e| FileIOError::from((staged.path(), e)))?;

	staged
		.persist(destination)
		.map_err(|e| FileIOError::from((destination, e.error, "renaming staged file")))?;

	Ok(())
}

impl From<JoinError> for RenditionError {
	fn from(e: JoinError) -> Self {
		Self::DecodeTask(e)
	}
}
