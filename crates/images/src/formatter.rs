use crate::{
	consts,
	error::{Error, Result},
	generic::GenericHandler,
	ImageHandler,
};
use image::{DynamicImage, ImageFormat};
use std::{
	ffi::{OsStr, OsString},
	path::Path,
};

/// Decodes the image at `path`, picking a handler from its file extension.
pub fn format_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
	let ext = lowercase_extension(path.as_ref())?;
	match_to_handler(&ext)?.handle_image(path.as_ref())
}

/// The encoder format that matches the extension of `path`.
///
/// Renditions are written in the same format as their source, so this is
/// the source file's format as far as its name tells.
pub fn output_format(path: impl AsRef<Path>) -> Result<ImageFormat> {
	let ext = lowercase_extension(path.as_ref())?;
	if !is_generic(&ext) {
		return Err(Error::Unsupported);
	}
	ImageFormat::from_extension(&ext).ok_or(Error::Unsupported)
}

fn lowercase_extension(path: &Path) -> Result<OsString> {
	path.extension()
		.map_or_else(|| Err(Error::NoExtension), |e| Ok(e.to_ascii_lowercase()))
}

fn is_generic(ext: &OsStr) -> bool {
	consts::GENERIC_EXTENSIONS
		.iter()
		.map(OsString::from)
		.any(|x| x == ext)
}

fn match_to_handler(ext: &OsStr) -> Result<Box<dyn ImageHandler>> {
	if is_generic(ext) {
		Ok(Box::new(GenericHandler {}))
	} else {
		Err(Error::Unsupported)
	}
}
