//! Just enough JPEG marker parsing to swap the Exif APP1 segment of a file.

use crate::error::CodecError;

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const TEM: u8 = 0x01;

/// Identifier at the start of an Exif APP1 payload.
pub(crate) const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload a marker segment can carry (the length field counts itself).
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

pub(crate) fn is_jpeg(data: &[u8]) -> bool {
	data.starts_with(&[MARKER_PREFIX, SOI, MARKER_PREFIX])
}

struct Segment<'a> {
	marker: u8,
	bytes: &'a [u8],
}

impl Segment<'_> {
	fn is_exif(&self) -> bool {
		self.marker == APP1 && self.bytes.get(4..).is_some_and(|p| p.starts_with(EXIF_HEADER))
	}
}

/// Splits the header part of a JPEG stream (everything before the scan data) into
/// segments, returning them with the untouched remainder.
fn split_segments(data: &[u8]) -> Result<(Vec<Segment<'_>>, &[u8]), CodecError> {
	if !is_jpeg(data) {
		return Err(CodecError::MalformedJpeg("missing start of image marker"));
	}

	let mut segments = vec![];
	let mut pos = 2;

	loop {
		if data.get(pos) != Some(&MARKER_PREFIX) {
			return Err(CodecError::MalformedJpeg("expected a marker"));
		}

		// Markers may be preceded by any number of fill bytes
		let mut marker_pos = pos + 1;
		while data.get(marker_pos) == Some(&MARKER_PREFIX) {
			marker_pos += 1;
		}
		let marker = *data
			.get(marker_pos)
			.ok_or(CodecError::MalformedJpeg("truncated marker"))?;

		match marker {
			SOS | EOI => return Ok((segments, &data[pos..])),
			TEM | 0xD0..=0xD7 => {
				segments.push(Segment {
					marker,
					bytes: &data[pos..=marker_pos],
				});
				pos = marker_pos + 1;
			}
			_ => {
				let length = data
					.get(marker_pos + 1..marker_pos + 3)
					.map(|len| usize::from(u16::from_be_bytes([len[0], len[1]])))
					.ok_or(CodecError::MalformedJpeg("truncated segment length"))?;
				if length < 2 {
					return Err(CodecError::MalformedJpeg("invalid segment length"));
				}

				let end = marker_pos + 1 + length;
				let bytes = data
					.get(pos..end)
					.ok_or(CodecError::MalformedJpeg("truncated segment"))?;

				segments.push(Segment { marker, bytes });
				pos = end;
			}
		}
	}
}

/// Rebuilds `data` with its Exif segment replaced by one holding `block`, or with
/// any Exif segment removed when `block` is `None`.
///
/// The new segment goes right after the leading APP0 (JFIF) segments, every other
/// segment keeps its order.
pub(crate) fn replace_exif(data: &[u8], block: Option<&[u8]>) -> Result<Vec<u8>, CodecError> {
	let app1 = block.map(exif_segment).transpose()?;
	let (segments, rest) = split_segments(data)?;

	let mut out = Vec::with_capacity(data.len() + app1.as_ref().map_or(0, Vec::len));
	out.extend_from_slice(&[MARKER_PREFIX, SOI]);

	let mut pending = app1.as_deref();
	for segment in segments.iter().filter(|segment| !segment.is_exif()) {
		if segment.marker != APP0 {
			if let Some(app1) = pending.take() {
				out.extend_from_slice(app1);
			}
		}
		out.extend_from_slice(segment.bytes);
	}
	if let Some(app1) = pending {
		out.extend_from_slice(app1);
	}

	out.extend_from_slice(rest);
	Ok(out)
}

fn exif_segment(block: &[u8]) -> Result<Vec<u8>, CodecError> {
	let payload_len = EXIF_HEADER.len() + block.len();
	if payload_len > MAX_SEGMENT_PAYLOAD {
		return Err(CodecError::BlockTooLarge(payload_len));
	}
	let length =
		u16::try_from(payload_len + 2).map_err(|_| CodecError::BlockTooLarge(payload_len))?;

	let mut segment = Vec::with_capacity(payload_len + 4);
	segment.extend_from_slice(&[MARKER_PREFIX, APP1]);
	segment.extend_from_slice(&length.to_be_bytes());
	segment.extend_from_slice(EXIF_HEADER);
	segment.extend_from_slice(block);
	Ok(segment)
}
