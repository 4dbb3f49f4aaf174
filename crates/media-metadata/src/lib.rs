#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Reads and writes the handful of embedded metadata fields a photo carries
//! through its lifecycle: title, description, geolocation and keywords.

mod codec;
mod error;
pub mod exif;
mod jpeg;

pub use codec::{MetadataCodec, MetadataSnapshot};
pub use error::{CodecError, Error, Result};
