use lb_core::{
	infra::db::entities::album::Model as Album, init_logger, Library, LibraryConfig,
	PendingPhoto, Photo, PhotoError, PhotoUpdate, RenditionSize,
};
use lb_media_metadata::MetadataCodec;
use lb_utils::error::report_error;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::fs;

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
	Human,
	Json,
}

#[derive(Parser, Debug)]
#[command(name = "lightbox", about = "Lightbox photo library")]
struct Cli {
	/// Path to the library data directory
	#[arg(long, env = "LIGHTBOX_DATA_DIR", default_value = ".lightbox")]
	data_dir: PathBuf,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Album operations
	#[command(subcommand)]
	Album(AlbumCommands),
	/// Copy a file into an album and ingest it
	Import(ImportArgs),
	/// Edit a photo's fields
	Update(UpdateArgs),
	/// Show a photo
	Show { photo_id: i32 },
	/// Attach a tag to a photo
	Tag { photo_id: i32, text: String },
	/// Detach a tag from a photo
	Untag { photo_id: i32, text: String },
	/// Delete a photo and every file it owns
	Delete { photo_id: i32 },
	/// Write a photo's renditions again
	Regenerate { photo_id: i32 },
	/// List photos without description or tags
	Untouched {
		#[arg(long)]
		album: Option<String>,
	},
	/// Print every embedded metadata field of a file
	ExifInfo { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum AlbumCommands {
	/// Create an album
	Create { path: String, title: String },
	/// List albums
	List,
	/// Show or replace an album's tags
	Tags {
		path: String,
		/// Space-separated tags replacing the current ones
		#[arg(long)]
		set: Option<String>,
	},
}

#[derive(Parser, Debug, Clone)]
struct ImportArgs {
	/// Path of the album to import into
	album: String,
	/// File to import
	file: PathBuf,
	/// Title, defaults to the one embedded in the file or the file name
	#[arg(long)]
	title: Option<String>,
	#[arg(long)]
	description: Option<String>,
	/// Tags replacing the album's as the photo's initial tags
	#[arg(long, value_delimiter = ',')]
	tags: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
struct UpdateArgs {
	photo_id: i32,
	#[arg(long)]
	title: Option<String>,
	#[arg(long, conflicts_with = "clear_description")]
	description: Option<String>,
	#[arg(long, default_value_t = false)]
	clear_description: bool,
	#[arg(long, allow_hyphen_values = true)]
	latitude: Option<f64>,
	#[arg(long, allow_hyphen_values = true)]
	longitude: Option<f64>,
	/// Clear both coordinates
	#[arg(long, default_value_t = false, conflicts_with_all = ["latitude", "longitude"])]
	clear_location: bool,
	/// Space-separated tags replacing the current ones
	#[arg(long)]
	tags: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let Cli {
		data_dir,
		format,
		command,
	} = Cli::parse();

	match command {
		// Reading a file needs no library
		Commands::ExifInfo { file } => exif_info(&file, &format),
		command => {
			let config = LibraryConfig::load_or_create(&data_dir)?;
			let _guard = init_logger(config.logs_dir(), &config.log_level)?;
			let library = Library::open(config).await?;

			run(&library, command, &format).await
		}
	}
}

async fn run(library: &Library, command: Commands, format: &OutputFormat) -> Result<()> {
	match command {
		Commands::Album(command) => album(library, command, format).await,
		Commands::Import(args) => import(library, args, format).await,
		Commands::Update(args) => update(library, args, format).await,
		Commands::Show { photo_id } => {
			let photo = library.lifecycle().find(photo_id).await?;
			print_photo(library, &photo, format);
			Ok(())
		}
		Commands::Tag { photo_id, text } => {
			let added = library.lifecycle().tag(photo_id, &text).await?;
			println!("{}", if added { "tagged" } else { "already tagged" });
			Ok(())
		}
		Commands::Untag { photo_id, text } => {
			let removed = library.lifecycle().untag(photo_id, &text).await?;
			println!("{}", if removed { "untagged" } else { "was not tagged" });
			Ok(())
		}
		Commands::Delete { photo_id } => {
			let photo = library.lifecycle().find(photo_id).await?;
			match library.lifecycle().on_delete(photo).await {
				Ok(()) => println!("deleted photo {photo_id}"),
				Err(PhotoError::CleanupIncomplete { failures }) => {
					println!("deleted photo {photo_id}, but some files were left behind:");
					for failure in failures {
						println!("  {failure}");
					}
				}
				Err(e) => return Err(e.into()),
			}
			Ok(())
		}
		Commands::Regenerate { photo_id } => {
			let report = library.lifecycle().regenerate_renditions(photo_id).await?;
			for rendition in &report.renditions {
				println!("{:<6} {}", rendition.size, rendition.path.display());
			}
			for failure in &report.failures {
				println!("failed: {failure}");
			}
			Ok(())
		}
		Commands::Untouched { album } => {
			let album_id = match album {
				Some(path) => Some(find_album(library, &path).await?.id),
				None => None,
			};
			for photo in library.lifecycle().untouched(album_id).await? {
				println!("{:>6}  {}", photo.id, photo.path);
			}
			Ok(())
		}
		Commands::ExifInfo { file } => exif_info(&file, format),
	}
}

async fn album(library: &Library, command: AlbumCommands, format: &OutputFormat) -> Result<()> {
	match command {
		AlbumCommands::Create { path, title } => {
			let album = library.albums().create(&path, &title).await?;
			println!("created album {} at '{}'", album.id, album.path);
		}
		AlbumCommands::List => {
			let albums = library.albums().list().await?;
			match format {
				OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&albums)?),
				OutputFormat::Human => {
					for album in albums {
						println!("{:>4}  {:<24} {}", album.id, album.path, album.title);
					}
				}
			}
		}
		AlbumCommands::Tags { path, set } => {
			let album = find_album(library, &path).await?;
			if let Some(tag_list) = set {
				let diff = library.albums().set_tag_list(album.id, &tag_list).await?;
				println!("added: {:?}, removed: {:?}", diff.added, diff.removed);
			}
			println!("{}", library.albums().tag_list(album.id).await?);
		}
	}

	Ok(())
}

async fn import(library: &Library, args: ImportArgs, format: &OutputFormat) -> Result<()> {
	let album = find_album(library, &args.album).await?;

	let Some(file_name) = args.file.file_name().and_then(|name| name.to_str()) else {
		bail!("'{}' has no usable file name", args.file.display());
	};

	let mut pending = PendingPhoto::from_upload(&album, file_name).with_tags(args.tags);
	if let Some(title) = args.title {
		pending = pending.with_title(title);
	}
	if args.description.is_some() {
		pending = pending.with_description(args.description);
	}

	let destination = library.config().source_path(&pending.path);
	if fs::try_exists(&destination).await.unwrap_or(false) {
		bail!("'{}' already exists", destination.display());
	}
	if let Some(dir) = destination.parent() {
		fs::create_dir_all(dir).await?;
	}
	fs::copy(&args.file, &destination)
		.await
		.with_context(|| format!("failed to copy '{}'", args.file.display()))?;

	let report = match library.lifecycle().on_create(pending).await {
		Ok(report) => report,
		Err(e) => {
			// No record owns the copy, don't leave it behind
			report_error(&fs::remove_file(&destination).await);
			return Err(e.into());
		}
	};

	print_photo(library, &report.photo, format);
	for failure in &report.failures {
		println!("warning: {failure}");
	}

	Ok(())
}

async fn update(library: &Library, args: UpdateArgs, format: &OutputFormat) -> Result<()> {
	let changes = PhotoUpdate {
		title: args.title,
		description: if args.clear_description {
			Some(None)
		} else {
			args.description.map(Some)
		},
		latitude: if args.clear_location {
			Some(None)
		} else {
			args.latitude.map(Some)
		},
		longitude: if args.clear_location {
			Some(None)
		} else {
			args.longitude.map(Some)
		},
		tag_list: args.tags,
	};

	match library.lifecycle().on_update(args.photo_id, changes).await {
		Ok(report) => {
			if report.changed.is_empty() {
				println!("nothing changed");
			}
			print_photo(library, &report.photo, format);
			Ok(())
		}
		Err(e @ PhotoError::MetadataWriteFailed { .. }) => {
			println!("record updated, but the file's metadata was not: {e}");
			Ok(())
		}
		Err(e) => Err(e.into()),
	}
}

async fn find_album(library: &Library, path: &str) -> Result<Album> {
	library
		.albums()
		.find_by_path(path)
		.await?
		.with_context(|| format!("no album at '{path}'"))
}

fn print_photo(library: &Library, photo: &Photo, format: &OutputFormat) {
	let renditions = RenditionSize::ALL
		.into_iter()
		.map(|size| (size.label(), library.public_rendition_path(photo, size)))
		.collect::<Vec<_>>();

	match format {
		OutputFormat::Json => println!(
			"{:#}",
			json!({
				"photo": photo,
				"slug": photo.slug(),
				"source": library.public_source_path(photo),
				"renditions": renditions
					.into_iter()
					.map(|(label, path)| (label.to_string(), serde_json::Value::String(path)))
					.collect::<serde_json::Map<_, _>>(),
			})
		),
		OutputFormat::Human => {
			let record = &photo.record;
			println!("{:<12}{}", "id", record.id);
			println!("{:<12}{}", "title", record.title);
			println!(
				"{:<12}{}",
				"description",
				record.description.as_deref().unwrap_or("-")
			);
			println!(
				"{:<12}{}",
				"location",
				record
					.latitude
					.zip(record.longitude)
					.map_or_else(|| "-".to_string(), |(lat, lon)| format!("{lat}, {lon}"))
			);
			println!("{:<12}{}", "tags", photo.tag_list);
			println!("{:<12}{}", "source", library.public_source_path(photo));
			for (label, path) in renditions {
				println!("{label:<12}{path}");
			}
		}
	}
}

fn exif_info(file: &Path, format: &OutputFormat) -> Result<()> {
	let fields = MetadataCodec.dump(file)?;

	match format {
		OutputFormat::Json => println!(
			"{:#}",
			serde_json::Value::Object(
				fields
					.into_iter()
					.map(|(tag, value)| (tag, serde_json::Value::String(value)))
					.collect()
			)
		),
		OutputFormat::Human => {
			for (tag, value) in fields {
				println!("{tag:<28}{value}");
			}
		}
	}

	Ok(())
}
