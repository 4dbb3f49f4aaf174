//! Test helpers for integration tests

#![allow(dead_code)]

use lb_core::{infra::db::entities::album, Library, LibraryConfig};
use lb_media_metadata::{MetadataCodec, MetadataSnapshot};

use std::{
	collections::BTreeSet,
	fs,
	path::{Path, PathBuf},
};

use image::{Rgb, RgbImage};
use tempfile::TempDir;

/// A library living in its own temporary data directory
pub struct TestLibrary {
	// Dropped last, after the library closed its database
	pub library: Library,
	pub dir: TempDir,
}

impl TestLibrary {
	pub async fn new() -> Self {
		let dir = TempDir::new().unwrap();
		let config = LibraryConfig::default_with_dir(dir.path().to_path_buf());
		let library = Library::open(config).await.unwrap();

		Self { library, dir }
	}

	pub async fn album(&self, path: &str, title: &str) -> album::Model {
		self.library.albums().create(path, title).await.unwrap()
	}

	pub fn photos_root(&self) -> &Path {
		&self.library.config().photos_path
	}

	pub fn renditions_root(&self) -> &Path {
		&self.library.config().renditions_path
	}

	/// Writes a plain `width`x`height` JPEG as if it was just uploaded into `album`
	pub fn upload_jpeg(
		&self,
		album: &album::Model,
		name: &str,
		width: u32,
		height: u32,
	) -> PathBuf {
		let path = self.photos_root().join(&album.path).join(name);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		RgbImage::from_pixel(width, height, Rgb([180, 90, 30]))
			.save(&path)
			.unwrap();
		path
	}

	/// Same as [`Self::upload_jpeg`], with `metadata` embedded in the file
	pub fn upload_jpeg_with_metadata(
		&self,
		album: &album::Model,
		name: &str,
		metadata: &MetadataSnapshot,
	) -> PathBuf {
		let path = self.upload_jpeg(album, name, 1000, 500);
		MetadataCodec.write(&path, metadata).unwrap();
		path
	}

	/// Every file under the data directory, relative to it (logs and database excluded)
	pub fn files(&self) -> BTreeSet<PathBuf> {
		let mut files = BTreeSet::new();
		for root in [self.photos_root(), self.renditions_root()] {
			collect_files(root, self.dir.path(), &mut files);
		}
		files
	}
}

fn collect_files(dir: &Path, base: &Path, files: &mut BTreeSet<PathBuf>) {
	let Ok(entries) = fs::read_dir(dir) else {
		return;
	};

	for entry in entries {
		let path = entry.unwrap().path();
		if path.is_dir() {
			collect_files(&path, base, files);
		} else {
			files.insert(path.strip_prefix(base).unwrap().to_path_buf());
		}
	}
}

pub fn opera_house() -> MetadataSnapshot {
	MetadataSnapshot {
		latitude: Some(-33.856_784),
		longitude: Some(151.215_297),
		title: Some("Opera House".to_string()),
		description: Some("Sails at dusk".to_string()),
		keywords: vec!["Sydney Harbour".to_string(), "sunset".to_string()],
	}
}

pub fn assert_close(actual: Option<f64>, expected: f64) {
	let actual = actual.expect("coordinate is missing");
	assert!(
		(actual - expected).abs() < 1e-6,
		"expected {expected}, got {actual}"
	);
}
