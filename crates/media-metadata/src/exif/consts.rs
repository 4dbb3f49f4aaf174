use exif::{Context, Tag};

/// Used for converting DMS to decimal coordinates, and is the amount to divide by.
///
/// # Examples:
///
/// ```
/// use lb_media_metadata::exif::DMS_DIVISION;
///
/// let latitude = [53.0, 19.0, 35.11]; // in DMS
/// latitude.iter().zip(DMS_DIVISION.iter());
/// ```
pub const DMS_DIVISION: [f64; 3] = [1.0, 60.0, 3600.0];

/// The amount of significant figures we wish to retain after the decimal point.
///
/// This is currently 8 digits (after the integer) as that is precise enough for most
/// applications.
///
/// This is calculated with `10^n`, where `n` is the desired amount of SFs.
pub const DECIMAL_SF: f64 = 100_000_000.0;

/// Denominator used when writing the seconds part of a DMS coordinate.
pub const SECONDS_DENOMINATOR: u32 = 1_000_000;

/// The Earth's maximum latitude (can also be negative, depending on if you're North or South of the Equator).
pub const LAT_MAX_POS: f64 = 90.0;

/// The Earth's maximum longitude (can also be negative depending on if you're East or West of the Prime meridian).
pub const LONG_MAX_POS: f64 = 180.0;

/// `GPSVersionID` written alongside any coordinate.
pub const GPS_VERSION: [u8; 4] = [2, 2, 0, 0];

/// TIFF `DocumentName`, holds the photo title.
pub const DOCUMENT_NAME: Tag = Tag(Context::Tiff, 0x010d);

/// Windows `XPKeywords`, UTF-16LE and `;` separated.
pub const XP_KEYWORDS: Tag = Tag(Context::Tiff, 0x9c9e);

/// Separator between entries of [`XP_KEYWORDS`].
pub const KEYWORD_SEPARATOR: &str = ";";

/// Fields owned by the codec, replaced wholesale on every write.
pub const MANAGED_TAGS: [Tag; 8] = [
	DOCUMENT_NAME,
	Tag::ImageDescription,
	XP_KEYWORDS,
	Tag::GPSVersionID,
	Tag::GPSLatitudeRef,
	Tag::GPSLatitude,
	Tag::GPSLongitudeRef,
	Tag::GPSLongitude,
];

/// Fields whose values are offsets into the original stream, they can't be carried over
/// into a freshly laid out block.
pub const OFFSET_DEPENDENT_TAGS: [Tag; 10] = [
	Tag(Context::Tiff, 0x0111), // StripOffsets
	Tag(Context::Tiff, 0x0117), // StripByteCounts
	Tag(Context::Tiff, 0x0144), // TileOffsets
	Tag(Context::Tiff, 0x0145), // TileByteCounts
	Tag(Context::Tiff, 0x0201), // JPEGInterchangeFormat
	Tag(Context::Tiff, 0x0202), // JPEGInterchangeFormatLength
	Tag(Context::Tiff, 0x8769), // ExifIFDPointer
	Tag(Context::Tiff, 0x8825), // GPSInfoIFDPointer
	Tag(Context::Exif, 0xa005), // InteropIFDPointer
	Tag(Context::Exif, 0x927c), // MakerNote
];
