use crate::{
	infra::db::entities::{album, photo, photo_tag},
	object::{
		media::rendition::{RenditionGenerator, RenditionSize},
		tag::{normalize, parse_tag_list, TagTarget, TagVocabulary},
		normalize_relative_path,
	},
};

use lb_media_metadata::{
	exif::{LAT_MAX_POS, LONG_MAX_POS},
	MetadataCodec, MetadataSnapshot,
};
use lb_utils::error::FileIOError;

use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::StreamExt;
use futures_concurrency::future::Join;
use sea_orm::{
	sea_query::Query, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
	PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tokio::{fs, task::spawn_blocking};
use tracing::{debug, error, info, instrument, trace, warn};

use super::{
	CreateReport, Field, FieldSource, IngestFailed, IngestStage, PendingPhoto, Photo, PhotoError,
	PhotoField, PhotoState, PhotoUpdate, RenditionReport, UpdateReport,
};

/// Drives a photo through create, update and delete, keeping its record, its files and
/// the metadata embedded in its source in step.
///
/// Record changes are committed before any file stage runs and are never rolled back by
/// one: file stage failures are reported and logged instead. Serializing updates and
/// deletes of one photo is up to the caller.
#[derive(Debug, Clone)]
pub struct PhotoLifecycle {
	db: DatabaseConnection,
	photos_root: PathBuf,
	codec: MetadataCodec,
	renditions: RenditionGenerator,
	tags: TagVocabulary,
}

impl PhotoLifecycle {
	pub fn new(
		db: DatabaseConnection,
		photos_root: impl Into<PathBuf>,
		renditions_root: impl Into<PathBuf>,
	) -> Self {
		Self {
			db,
			photos_root: photos_root.into(),
			codec: MetadataCodec,
			renditions: RenditionGenerator::new(renditions_root),
			tags: TagVocabulary,
		}
	}

	/// Where the original file of `photo` lives
	#[must_use]
	pub fn source_path(&self, photo: &Photo) -> PathBuf {
		self.photos_root.join(&photo.record.path)
	}

	/// This does not check if the rendition exists, it just returns the path it would exist at
	#[must_use]
	pub fn rendition_path(&self, photo: &Photo, size: RenditionSize) -> PathBuf {
		self.renditions.path_for(
			&photo.album_path,
			photo.id(),
			size,
			Path::new(&photo.record.path),
		)
	}

	pub async fn find(&self, photo_id: i32) -> Result<Photo, PhotoError> {
		let (record, album) = photo::Entity::find_by_id(photo_id)
			.find_also_related(album::Entity)
			.one(&self.db)
			.await?
			.ok_or(PhotoError::NotFound(photo_id))?;

		let album = album.ok_or_else(|| {
			DbErr::RecordNotFound(format!(
				"album <id={}> of photo <id={photo_id}>",
				record.album_id
			))
		})?;

		let tag_list = self
			.tags
			.tag_list(&self.db, TagTarget::Photo(photo_id))
			.await
			.map_err(|e| PhotoError::from_tag("tag_list", e))?;

		Ok(Photo {
			record,
			album_path: album.path,
			tag_list,
		})
	}

	/// Photos nobody has described or tagged yet, oldest first
	pub async fn untouched(&self, album_id: Option<i32>) -> Result<Vec<photo::Model>, PhotoError> {
		let mut query = photo::Entity::find()
			.filter(photo::Column::Description.is_null())
			.filter(
				photo::Column::Id.not_in_subquery(
					Query::select()
						.column(photo_tag::Column::PhotoId)
						.from(photo_tag::Entity)
						.to_owned(),
				),
			)
			.order_by_asc(photo::Column::Id);

		if let Some(album_id) = album_id {
			query = query.filter(photo::Column::AlbumId.eq(album_id));
		}

		Ok(query.all(&self.db).await?)
	}

	/// The photos right before and right after `photo` in its album
	pub async fn neighbors(
		&self,
		photo: &Photo,
	) -> Result<(Option<photo::Model>, Option<photo::Model>), PhotoError> {
		let in_album =
			|| photo::Entity::find().filter(photo::Column::AlbumId.eq(photo.record.album_id));

		let previous = in_album()
			.filter(photo::Column::Id.lt(photo.id()))
			.order_by_desc(photo::Column::Id)
			.one(&self.db)
			.await?;

		let next = in_album()
			.filter(photo::Column::Id.gt(photo.id()))
			.order_by_asc(photo::Column::Id)
			.one(&self.db)
			.await?;

		Ok((previous, next))
	}

	/// Turns a pending photo into a persisted one.
	///
	/// Every precondition is checked before anything is read or written. After that the
	/// record is created even if reading the embedded metadata or writing renditions
	/// fails, those failures come back in the report.
	#[instrument(skip(self, pending), fields(path = %pending.path), err)]
	pub async fn on_create(&self, pending: PendingPhoto) -> Result<CreateReport, PhotoError> {
		let PendingPhoto {
			album_id,
			path,
			title,
			description,
			latitude,
			longitude,
			tags,
		} = pending;

		validate_title(title.value.as_deref())?;
		// Every alias of a path resolves to the one spelling stored and compared
		let path = normalize_relative_path(&path)
			.map_err(|message| PhotoError::validation("path", message))?;
		validate_coordinate("latitude", latitude.value, LAT_MAX_POS)?;
		validate_coordinate("longitude", longitude.value, LONG_MAX_POS)?;

		let user_tags = tags
			.iter()
			.map(|text| normalize(text))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| PhotoError::from_tag("tags", e))?;

		let album = album::Entity::find_by_id(album_id)
			.one(&self.db)
			.await?
			.ok_or_else(|| {
				PhotoError::validation("album_id", format!("album <id={album_id}> does not exist"))
			})?;

		if !Path::new(&path).starts_with(&album.path) || Path::new(&path) == Path::new(&album.path)
		{
			return Err(PhotoError::validation(
				"path",
				format!("'{path}' is not a file of album '{}'", album.path),
			));
		}

		if photo::Entity::find()
			.filter(photo::Column::Path.eq(&path))
			.count(&self.db)
			.await? > 0
		{
			return Err(PhotoError::DuplicatePath(path));
		}

		let source = self.photos_root.join(&path);
		let mut failures = vec![];

		let snapshot = match self.read_metadata(&source).await {
			Ok(snapshot) => snapshot,
			Err(failure) => {
				warn!(?failure, "creating photo without its embedded metadata;");
				failures.push(failure);
				MetadataSnapshot::default()
			}
		};

		let title = title.merge_file(snapshot.title.filter(|title| !title.trim().is_empty()));
		let description = description.merge_file(snapshot.description);
		let latitude = latitude.merge_file(snapshot.latitude);
		let longitude = longitude.merge_file(snapshot.longitude);

		// Album tags only stand in for the photo's own
		let base_tags = if user_tags.is_empty() {
			self.tags
				.tags_of(&self.db, TagTarget::Album(album.id))
				.await
				.map_err(|e| PhotoError::from_tag("tags", e))?
				.into_iter()
				.map(|tag| tag.name)
				.collect()
		} else {
			user_tags
		};

		let seed = base_tags
			.into_iter()
			.chain(
				snapshot
					.keywords
					.iter()
					.filter(|keyword| !keyword.trim().is_empty())
					.map(|keyword| keyword.trim().replace(' ', "_")),
			)
			.collect::<Vec<_>>();

		let Field {
			value: Some(title_value),
			source: title_source,
		} = title
		else {
			return Err(PhotoError::validation("title", "title is empty"));
		};

		let now = Utc::now();
		let txn = self.db.begin().await?;

		let record = photo::ActiveModel {
			album_id: Set(album.id),
			path: Set(path.clone()),
			title: Set(title_value),
			description: Set(description.value),
			latitude: Set(latitude.value),
			longitude: Set(longitude.value),
			title_source: Set(title_source),
			description_source: Set(description.source),
			latitude_source: Set(latitude.source),
			longitude_source: Set(longitude.source),
			state: Set(PhotoState::Created),
			created_at: Set(now),
			updated_at: Set(now),
			..Default::default()
		}
		.insert(&txn)
		.await
		.map_err(|e| match e.sql_err() {
			// Someone else created the same path since the check above
			Some(SqlErr::UniqueConstraintViolation(_)) => PhotoError::DuplicatePath(path.clone()),
			_ => PhotoError::Database(e),
		})?;

		let resolved = self
			.tags
			.resolve(&txn, &seed)
			.await
			.map_err(|e| PhotoError::from_tag("tags", e))?;
		for tag in &resolved {
			self.tags
				.attach(&txn, TagTarget::Photo(record.id), tag.id)
				.await
				.map_err(|e| PhotoError::from_tag("tags", e))?;
		}

		txn.commit().await?;

		let mut tag_names = resolved.into_iter().map(|tag| tag.name).collect::<Vec<_>>();
		tag_names.sort();

		let photo = Photo {
			record,
			album_path: album.path,
			tag_list: tag_names.join(" "),
		};

		info!(photo_id = photo.id(), tags = %photo.tag_list, "created photo");

		let RenditionReport {
			renditions,
			failures: rendition_failures,
		} = self.generate_renditions(&photo).await;
		failures.extend(rendition_failures);

		Ok(CreateReport {
			photo,
			renditions,
			failures,
		})
	}

	/// Applies the fields of `changes` that differ from the stored photo and pushes the
	/// result into the source's embedded metadata.
	///
	/// When nothing differs, nothing is written at all. A failed metadata write leaves
	/// the record changes committed.
	#[instrument(skip(self, changes), err)]
	pub async fn on_update(
		&self,
		photo_id: i32,
		changes: PhotoUpdate,
	) -> Result<UpdateReport, PhotoError> {
		if let Some(title) = &changes.title {
			validate_title(Some(title))?;
		}
		if let Some(latitude) = changes.latitude {
			validate_coordinate("latitude", latitude, LAT_MAX_POS)?;
		}
		if let Some(longitude) = changes.longitude {
			validate_coordinate("longitude", longitude, LONG_MAX_POS)?;
		}

		let desired_tags = changes.tag_list.as_deref().map(parse_tag_list);

		let prior = self.find(photo_id).await?;
		let mut active: photo::ActiveModel = prior.record.clone().into();
		let mut changed = vec![];

		if let Some(title) = changes.title.filter(|title| *title != prior.record.title) {
			active.title = Set(title);
			active.title_source = Set(FieldSource::User);
			changed.push(PhotoField::Title);
		}

		if let Some(description) = changes
			.description
			.filter(|description| *description != prior.record.description)
		{
			active.description = Set(description);
			active.description_source = Set(FieldSource::User);
			changed.push(PhotoField::Description);
		}

		if let Some(latitude) = changes
			.latitude
			.filter(|latitude| *latitude != prior.record.latitude)
		{
			active.latitude = Set(latitude);
			active.latitude_source = Set(FieldSource::User);
			changed.push(PhotoField::Latitude);
		}

		if let Some(longitude) = changes
			.longitude
			.filter(|longitude| *longitude != prior.record.longitude)
		{
			active.longitude = Set(longitude);
			active.longitude_source = Set(FieldSource::User);
			changed.push(PhotoField::Longitude);
		}

		let desired_tags = desired_tags.filter(|desired| {
			desired.iter().map(String::as_str).ne(prior.tags().into_iter())
		});
		if desired_tags.is_some() {
			changed.push(PhotoField::TagList);
		}

		if changed.is_empty() {
			debug!("nothing changed, leaving the photo alone");
			return Ok(UpdateReport {
				photo: prior,
				changed,
				metadata_written: false,
			});
		}

		active.state = Set(PhotoState::Updated);
		active.updated_at = Set(Utc::now());

		let txn = self.db.begin().await?;
		active.update(&txn).await?;
		if let Some(desired) = desired_tags {
			self.tags
				.sync(&txn, TagTarget::Photo(photo_id), desired)
				.await
				.map_err(|e| PhotoError::from_tag("tag_list", e))?;
		}
		txn.commit().await?;

		let photo = self.find(photo_id).await?;

		info!(?changed, "updated photo");

		self.write_metadata(&photo).await?;

		Ok(UpdateReport {
			photo,
			changed,
			metadata_written: true,
		})
	}

	/// Removes every file `photo` owns, then its record.
	///
	/// Files already gone are fine. The record is removed even when some file couldn't
	/// be, the paths left behind come back in [`PhotoError::CleanupIncomplete`].
	#[instrument(skip(self, photo), fields(photo_id = photo.id()), err)]
	pub async fn on_delete(&self, photo: Photo) -> Result<(), PhotoError> {
		let mut failures = vec![];

		if let Err(e) = remove_if_present(self.source_path(&photo)).await {
			failures.push(e);
		}

		failures.extend(
			RenditionSize::ALL
				.into_iter()
				.map(|size| remove_if_present(self.rendition_path(&photo, size)))
				.collect::<Vec<_>>()
				.join()
				.await
				.into_iter()
				.filter_map(Result::err),
		);

		let txn = self.db.begin().await?;
		photo_tag::Entity::delete_many()
			.filter(photo_tag::Column::PhotoId.eq(photo.id()))
			.exec(&txn)
			.await?;
		photo::Entity::delete_by_id(photo.id()).exec(&txn).await?;
		txn.commit().await?;

		if failures.is_empty() {
			info!("deleted photo");
			Ok(())
		} else {
			failures
				.iter()
				.for_each(|e| error!(?e, "photo file left behind;"));
			Err(PhotoError::CleanupIncomplete { failures })
		}
	}

	/// Links the tag named by `text` to the photo, returning whether the link is new
	pub async fn tag(&self, photo_id: i32, text: &str) -> Result<bool, PhotoError> {
		self.ensure_exists(photo_id).await?;

		self.tags
			.attach_text(&self.db, TagTarget::Photo(photo_id), text)
			.await
			.map_err(|e| PhotoError::from_tag("tag", e))
	}

	/// Unlinks the tag named by `text` from the photo, returning whether a link existed
	pub async fn untag(&self, photo_id: i32, text: &str) -> Result<bool, PhotoError> {
		self.ensure_exists(photo_id).await?;

		self.tags
			.detach_text(&self.db, TagTarget::Photo(photo_id), text)
			.await
			.map_err(|e| PhotoError::from_tag("tag", e))
	}

	/// Writes every rendition of an existing photo again
	pub async fn regenerate_renditions(
		&self,
		photo_id: i32,
	) -> Result<RenditionReport, PhotoError> {
		let photo = self.find(photo_id).await?;
		Ok(self.generate_renditions(&photo).await)
	}

	async fn ensure_exists(&self, photo_id: i32) -> Result<(), PhotoError> {
		if photo::Entity::find_by_id(photo_id)
			.count(&self.db)
			.await? == 0
		{
			return Err(PhotoError::NotFound(photo_id));
		}
		Ok(())
	}

	async fn read_metadata(&self, source: &Path) -> Result<MetadataSnapshot, IngestFailed> {
		let codec = self.codec;
		let source = source.to_path_buf();

		spawn_blocking(move || codec.read(source))
			.await
			.map_err(|e| IngestFailed::new(IngestStage::MetadataRead, e))?
			.map_err(|e| IngestFailed::new(IngestStage::MetadataRead, e))
	}

	async fn write_metadata(&self, photo: &Photo) -> Result<(), PhotoError> {
		let codec = self.codec;
		let source = self.source_path(photo);
		let snapshot = MetadataSnapshot {
			latitude: photo.record.latitude,
			longitude: photo.record.longitude,
			title: Some(photo.record.title.clone()),
			description: photo.record.description.clone(),
			keywords: photo.tags().into_iter().map(str::to_string).collect(),
		};

		spawn_blocking(move || codec.write(&source, &snapshot).map_err(|e| (source, e)))
			.await?
			.map_err(|(path, source)| {
				error!(?source, "photo record and embedded metadata diverged;");
				PhotoError::MetadataWriteFailed {
					path: path.into_boxed_path(),
					source,
				}
			})
	}

	async fn generate_renditions(&self, photo: &Photo) -> RenditionReport {
		let source = self.source_path(photo);
		let mut report = RenditionReport::default();

		match self
			.renditions
			.generate(&source, &photo.album_path, photo.id())
			.await
		{
			Ok(mut renditions) => {
				while let Some(res) = renditions.next().await {
					match res {
						Ok(rendition) => report.renditions.push(rendition),
						Err(e) => {
							warn!(?e, "failed to write rendition;");
							report
								.failures
								.push(IngestFailed::new(IngestStage::Renditions, e));
						}
					}
				}
			}
			Err(e) => {
				warn!(?e, "no renditions for photo;");
				report
					.failures
					.push(IngestFailed::new(IngestStage::Renditions, e));
			}
		}

		trace!(
			written = report.renditions.len(),
			failed = report.failures.len(),
			"generated renditions"
		);

		report
	}
}

fn validate_title(title: Option<&str>) -> Result<(), PhotoError> {
	match title {
		Some(title) if !title.trim().is_empty() => Ok(()),
		_ => Err(PhotoError::validation("title", "title is empty")),
	}
}

/// Coordinates are decimal degrees within `±max`, the range embedded metadata can hold
fn validate_coordinate(
	field: &'static str,
	value: Option<f64>,
	max: f64,
) -> Result<(), PhotoError> {
	match value {
		Some(value) if !value.is_finite() || value.abs() > max => Err(PhotoError::validation(
			field,
			format!("{value} is outside of [-{max}, {max}]"),
		)),
		_ => Ok(()),
	}
}

async fn remove_if_present(path: PathBuf) -> Result<(), FileIOError> {
	match fs::remove_file(&path)
		.await
		.map_err(|e| FileIOError::from((&path, e, "removing photo file")))
	{
		Ok(()) => {
			trace!(path = %path.display(), "removed photo file");
			Ok(())
		}
		Err(e) if e.is_not_found() => Ok(()),
		Err(e) => Err(e),
	}
}
