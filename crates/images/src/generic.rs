use crate::consts::GENERIC_MAXIMUM_FILE_SIZE;
use crate::error::Result;
use crate::ImageHandler;
use image::DynamicImage;
use std::path::Path;
use tracing::trace;

pub struct GenericHandler {}

impl ImageHandler for GenericHandler {
	fn maximum_size(&self) -> u64 {
		GENERIC_MAXIMUM_FILE_SIZE
	}

	fn handle_image(&self, path: &Path) -> Result<DynamicImage> {
		// this also makes sure the file isn't above the maximum size
		let data = self.get_data(path)?;
		let img = image::load_from_memory(&data)?;
		trace!(
			path = %path.display(),
			width = img.width(),
			height = img.height(),
			"decoded image"
		);
		Ok(img)
	}
}
