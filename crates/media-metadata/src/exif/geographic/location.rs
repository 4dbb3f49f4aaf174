use crate::exif::consts::{DECIMAL_SF, DMS_DIVISION, SECONDS_DENOMINATOR};
use exif::Rational;
use std::ops::Neg;

/// Which side of the equator or prime meridian a coordinate sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
	North,
	South,
	East,
	West,
}

impl Hemisphere {
	#[must_use]
	pub fn for_latitude(latitude: f64) -> Self {
		if latitude.is_sign_negative() {
			Self::South
		} else {
			Self::North
		}
	}

	#[must_use]
	pub fn for_longitude(longitude: f64) -> Self {
		if longitude.is_sign_negative() {
			Self::West
		} else {
			Self::East
		}
	}

	/// Parses a `GPSLatitudeRef`/`GPSLongitudeRef` value.
	#[must_use]
	pub fn from_reference(reference: &str) -> Option<Self> {
		match reference.trim().chars().next()?.to_ascii_uppercase() {
			'N' => Some(Self::North),
			'S' => Some(Self::South),
			'E' => Some(Self::East),
			'W' => Some(Self::West),
			_ => None,
		}
	}

	#[must_use]
	pub const fn as_reference(self) -> &'static str {
		match self {
			Self::North => "N",
			Self::South => "S",
			Self::East => "E",
			Self::West => "W",
		}
	}

	const fn is_negative(self) -> bool {
		matches!(self, Self::South | Self::West)
	}
}

/// This is used to clamp and format coordinates. They are rounded to 8 significant figures after the decimal point.
///
/// `max` must positive, and it should be the maximum distance allowed (e.g. 180 degrees)
#[inline]
#[must_use]
pub fn format_coordinate(v: f64, max: f64) -> f64 {
	(v.clamp(max.neg(), max) * DECIMAL_SF).round() / DECIMAL_SF
}

/// Converts a degrees/minutes/seconds triple into a signed decimal coordinate.
///
/// Returns `None` for short or non-finite values (e.g. a zero denominator).
#[must_use]
pub fn from_dms(parts: &[Rational], hemisphere: Option<Hemisphere>, max: f64) -> Option<f64> {
	if parts.len() < DMS_DIVISION.len() {
		return None;
	}

	let value = parts
		.iter()
		.zip(DMS_DIVISION.iter())
		.map(|(part, division)| part.to_f64() / division)
		.sum::<f64>();

	if !value.is_finite() {
		return None;
	}

	let value = if hemisphere.is_some_and(Hemisphere::is_negative) {
		value.neg()
	} else {
		value
	};

	Some(format_coordinate(value, max))
}

/// Splits the absolute value of a decimal coordinate into degrees/minutes/seconds.
#[must_use]
#[allow(
	clippy::as_conversions,
	clippy::cast_possible_truncation,
	clippy::cast_sign_loss
)]
pub fn to_dms(value: f64) -> [Rational; 3] {
	let value = value.abs();
	let degrees = value.trunc();
	let minutes = ((value - degrees) * 60.0).trunc();
	let seconds = ((value - degrees) * 60.0 - minutes) * 60.0;

	[
		Rational {
			num: degrees as u32,
			denom: 1,
		},
		Rational {
			num: minutes as u32,
			denom: 1,
		},
		Rational {
			num: (seconds * f64::from(SECONDS_DENOMINATOR)).round() as u32,
			denom: SECONDS_DENOMINATOR,
		},
	]
}
