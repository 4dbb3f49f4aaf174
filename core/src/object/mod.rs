pub mod album;
pub mod media;
pub mod photo;
pub mod tag;

use std::path::{Component, Path};

/// Checks that `path` is a non-empty path relative to a library root that never climbs
/// out of it, returning it in canonical form: its normal components joined with `/`.
///
/// `.` components and empty segments are dropped, so every spelling of a path maps to
/// the one string stored and compared for uniqueness.
pub(crate) fn normalize_relative_path(path: &str) -> Result<String, String> {
	let mut segments = vec![];

	for component in Path::new(path).components() {
		match component {
			Component::Normal(segment) => {
				let Some(segment) = segment.to_str() else {
					return Err(format!("path is not valid UTF-8: '{path}'"));
				};
				segments.push(segment);
			}
			Component::CurDir => {}
			Component::ParentDir => {
				return Err(format!("path climbs out of the library: '{path}'"));
			}
			Component::RootDir | Component::Prefix(_) => {
				return Err(format!("path must be relative: '{path}'"));
			}
		}
	}

	if segments.iter().all(|segment| segment.trim().is_empty()) {
		return Err("path is empty".to_string());
	}

	Ok(segments.join("/"))
}
