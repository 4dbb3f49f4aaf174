/// Raster formats decoded through the `image` crate.
pub const GENERIC_EXTENSIONS: [&str; 9] = [
	"bmp", "gif", "ico", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

/// The maximum file size that an image can be in order to have renditions generated.
///
/// This value is in MiB.
pub(crate) const GENERIC_MAXIMUM_FILE_SIZE: u64 = MIB * 24;

/// The size of 1MiB in bytes
const MIB: u64 = 1_048_576;
