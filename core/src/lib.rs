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

//! Photo library core: ingest photos, keep their renditions, tags and embedded
//! metadata in step with their records, and clean up after them.

use std::path::Path;

use anyhow::{anyhow, Context};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::LevelFilter,
	fmt::{self, Layer},
	prelude::*,
	EnvFilter,
};

pub mod config;
pub mod infra;
pub mod library;
pub mod object;

pub use config::LibraryConfig;
pub use library::Library;
pub use object::{
	album::{AlbumError, Albums},
	media::rendition::{Rendition, RenditionError, RenditionGenerator, RenditionSize},
	photo::{
		CreateReport, Field, FieldSource, IngestFailed, IngestStage, PendingPhoto, Photo,
		PhotoError, PhotoLifecycle, PhotoUpdate, RenditionReport, UpdateReport,
	},
	tag::{TagDiff, TagError, TagTarget, TagVocabulary},
};

#[cfg(debug_assertions)]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::DEBUG;

#[cfg(not(debug_assertions))]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::INFO;

/// Installs the global subscriber: console output plus a daily rolling file in
/// `logs_dir`. `RUST_LOG` overrides `level`.
///
/// Keep the returned guard alive for as long as logs should be flushed to the file.
pub fn init_logger(logs_dir: impl AsRef<Path>, level: &str) -> anyhow::Result<WorkerGuard> {
	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(logs_dir.as_ref(), "lightbox.log"));

	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(format!("warn,lb_core={level},lightbox={level}")))
		.with_context(|| format!("invalid log level '{level}'"))?;

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_filter(CONSOLE_LOG_FILTER))
		.with(
			Layer::default()
				.with_writer(non_blocking)
				.with_ansi(false)
				.with_filter(LevelFilter::DEBUG),
		)
		.try_init()
		.map_err(|e| anyhow!("failed to install the logger: {e}"))?;

	Ok(guard)
}
