use std::{
	fs::File,
	io::{BufReader, Cursor},
	path::Path,
};

use exif::{experimental::Writer, Exif, Field, In, Tag, Value};
use lb_utils::{chain_optional_iter, error::FileIOError};

mod consts;
mod geographic;

pub use consts::{
	DECIMAL_SF, DMS_DIVISION, DOCUMENT_NAME, KEYWORD_SEPARATOR, LAT_MAX_POS, LONG_MAX_POS,
	MANAGED_TAGS, OFFSET_DEPENDENT_TAGS, XP_KEYWORDS,
};
pub use geographic::{format_coordinate, from_dms, to_dms, Hemisphere};

use crate::{codec::MetadataSnapshot, error::CodecError};

use consts::GPS_VERSION;

pub struct ExifReader(Exif);

impl ExifReader {
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CodecError> {
		let path = path.as_ref();
		let file = File::open(path).map_err(|e| FileIOError::from((path, e)))?;
		let mut reader = BufReader::new(file);
		Ok(Self(exif::Reader::new().read_from_container(&mut reader)?))
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
		Ok(Self(
			exif::Reader::new().read_from_container(&mut Cursor::new(bytes))?,
		))
	}

	/// First non-blank ASCII component of `tag`, with NUL padding and whitespace trimmed.
	#[must_use]
	pub fn ascii(&self, tag: Tag) -> Option<String> {
		match &self.0.get_field(tag, In::PRIMARY)?.value {
			Value::Ascii(parts) => parts
				.iter()
				.map(|part| {
					String::from_utf8_lossy(part)
						.trim_matches(|c: char| c == '\0' || c.is_whitespace())
						.to_owned()
				})
				.find(|part| !part.is_empty()),
			_ => None,
		}
	}

	/// A signed decimal coordinate built from a DMS field and its reference field.
	#[must_use]
	pub fn coordinate(&self, value_tag: Tag, reference_tag: Tag, max: f64) -> Option<f64> {
		let Value::Rational(parts) = &self.0.get_field(value_tag, In::PRIMARY)?.value else {
			return None;
		};

		let hemisphere = self
			.ascii(reference_tag)
			.as_deref()
			.and_then(Hemisphere::from_reference);

		from_dms(parts, hemisphere, max)
	}

	/// Entries of the UTF-16LE `XPKeywords` field.
	#[must_use]
	pub fn keywords(&self) -> Vec<String> {
		let Some(field) = self.0.get_field(XP_KEYWORDS, In::PRIMARY) else {
			return vec![];
		};

		let bytes = match &field.value {
			Value::Byte(bytes) | Value::Undefined(bytes, _) => bytes,
			_ => return vec![],
		};

		decode_utf16le(bytes)
			.split(KEYWORD_SEPARATOR)
			.map(str::trim)
			.filter(|keyword| !keyword.is_empty())
			.map(ToOwned::to_owned)
			.collect()
	}

	/// Every field as `(tag name, display value)`, sorted by tag name.
	#[must_use]
	pub fn entries(&self) -> Vec<(String, String)> {
		let mut entries = self
			.0
			.fields()
			.map(|field| {
				(
					field.tag.to_string(),
					field.display_value().with_unit(&self.0).to_string(),
				)
			})
			.collect::<Vec<_>>();
		entries.sort();
		entries
	}

	/// Primary image fields that survive a rewrite of the managed fields.
	fn carried_over_fields(&self) -> impl Iterator<Item = Field> + '_ {
		self.0
			.fields()
			.filter(|field| field.ifd_num == In::PRIMARY)
			.filter(|field| {
				!MANAGED_TAGS.contains(&field.tag) && !OFFSET_DEPENDENT_TAGS.contains(&field.tag)
			})
			.filter(|field| !matches!(field.tag, Tag(exif::Context::Interop, _)))
			.filter(|field| !matches!(field.value, Value::Unknown(..)))
			.cloned()
	}
}

/// Serializes `snapshot` (plus whatever `existing` carries besides the managed fields)
/// into a TIFF structured block, ready to be framed into a container.
///
/// Returns `None` when there is nothing to write at all.
pub(crate) fn encode_block(
	existing: Option<&ExifReader>,
	snapshot: &MetadataSnapshot,
) -> Result<Option<Vec<u8>>, CodecError> {
	let fields = chain_optional_iter(
		existing
			.map(|reader| reader.carried_over_fields().collect::<Vec<_>>())
			.unwrap_or_default(),
		managed_fields(snapshot),
	);

	if fields.is_empty() {
		return Ok(None);
	}

	let mut writer = Writer::new();
	for field in &fields {
		writer.push_field(field);
	}

	let mut buf = Cursor::new(Vec::new());
	writer.write(&mut buf, false)?;

	Ok(Some(buf.into_inner()))
}

fn managed_fields(snapshot: &MetadataSnapshot) -> Vec<Option<Field>> {
	let has_coordinate = snapshot.latitude.is_some() || snapshot.longitude.is_some();

	vec![
		snapshot
			.title
			.as_deref()
			.map(|title| ascii_field(DOCUMENT_NAME, title)),
		snapshot
			.description
			.as_deref()
			.map(|description| ascii_field(Tag::ImageDescription, description)),
		(!snapshot.keywords.is_empty()).then(|| Field {
			tag: XP_KEYWORDS,
			ifd_num: In::PRIMARY,
			value: Value::Byte(encode_utf16le(
				&snapshot.keywords.join(KEYWORD_SEPARATOR),
			)),
		}),
		has_coordinate.then(|| Field {
			tag: Tag::GPSVersionID,
			ifd_num: In::PRIMARY,
			value: Value::Byte(GPS_VERSION.to_vec()),
		}),
		snapshot.latitude.map(|latitude| {
			ascii_field(
				Tag::GPSLatitudeRef,
				Hemisphere::for_latitude(latitude).as_reference(),
			)
		}),
		snapshot.latitude.map(|latitude| rational_field(Tag::GPSLatitude, latitude)),
		snapshot.longitude.map(|longitude| {
			ascii_field(
				Tag::GPSLongitudeRef,
				Hemisphere::for_longitude(longitude).as_reference(),
			)
		}),
		snapshot
			.longitude
			.map(|longitude| rational_field(Tag::GPSLongitude, longitude)),
	]
}

fn ascii_field(tag: Tag, text: &str) -> Field {
	Field {
		tag,
		ifd_num: In::PRIMARY,
		value: Value::Ascii(vec![text.replace('\0', "").into_bytes()]),
	}
}

fn rational_field(tag: Tag, coordinate: f64) -> Field {
	Field {
		tag,
		ifd_num: In::PRIMARY,
		value: Value::Rational(to_dms(coordinate).to_vec()),
	}
}

fn encode_utf16le(text: &str) -> Vec<u8> {
	text.encode_utf16()
		.chain(std::iter::once(0))
		.flat_map(u16::to_le_bytes)
		.collect()
}

fn decode_utf16le(bytes: &[u8]) -> String {
	let units = bytes
		.chunks_exact(2)
		.map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
		.take_while(|unit| *unit != 0)
		.collect::<Vec<_>>();

	String::from_utf16_lossy(&units)
}
