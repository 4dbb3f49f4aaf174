//! Integration tests for the photo lifecycle: create, update and delete keep the record,
//! the source's embedded metadata and the renditions in step

mod helpers;

use helpers::{assert_close, opera_house, TestLibrary};

use lb_core::{
	infra::db::entities::{photo, photo_tag},
	Field, FieldSource, IngestStage, PendingPhoto, PhotoError, PhotoUpdate, RenditionSize,
};
use lb_media_metadata::{MetadataCodec, MetadataSnapshot};

use std::{fs, path::PathBuf};

use image::GenericImageView;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn test_create_reads_metadata_and_writes_renditions() {
	let t = TestLibrary::new().await;
	let album = t.album("2024/sydney", "Sydney").await;
	t.library
		.albums()
		.set_tag_list(album.id, "Travel")
		.await
		.unwrap();
	t.upload_jpeg_with_metadata(&album, "IMG_0001.jpg", &opera_house());

	let report = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "IMG_0001.jpg"))
		.await
		.unwrap();

	assert!(report.is_complete(), "{:?}", report.failures);

	let photo = &report.photo;
	assert_eq!(photo.record.path, "2024/sydney/IMG_0001.jpg");
	assert_eq!(photo.record.title, "Opera House");
	assert_eq!(photo.record.title_source, FieldSource::File);
	assert_eq!(photo.record.description.as_deref(), Some("Sails at dusk"));
	assert_close(photo.record.latitude, -33.856_784);
	assert_close(photo.record.longitude, 151.215_297);
	// No tags of its own, so the album's tags join the file's keywords
	assert_eq!(photo.tag_list, "sunset sydney_harbour travel");

	let sizes = report
		.renditions
		.iter()
		.map(|rendition| rendition.size)
		.collect::<Vec<_>>();
	assert_eq!(sizes, RenditionSize::ALL.to_vec());

	for (size, (width, height)) in RenditionSize::ALL
		.into_iter()
		.zip([(85, 43), (150, 75), (800, 400)])
	{
		let path = t.library.lifecycle().rendition_path(photo, size);
		assert_eq!(
			path,
			t.renditions_root()
				.join("2024/sydney")
				.join(format!("{}_{}.jpg", photo.id(), size.label()))
		);
		assert_eq!(image::open(&path).unwrap().dimensions(), (width, height));
	}

	assert_eq!(
		t.library.public_rendition_path(photo, RenditionSize::Thumb),
		format!("/renditions/2024/sydney/{}_thumb.jpg", photo.id())
	);
	assert_eq!(
		t.library.public_source_path(photo),
		"/photos/2024/sydney/IMG_0001.jpg"
	);
}

#[tokio::test]
async fn test_supplied_fields_and_tags_win_over_the_file() {
	let t = TestLibrary::new().await;
	let album = t.album("sydney", "Sydney").await;
	t.library
		.albums()
		.set_tag_list(album.id, "travel")
		.await
		.unwrap();
	t.upload_jpeg_with_metadata(&album, "opera.jpg", &opera_house());

	let pending = PendingPhoto::from_upload(&album, "opera.jpg")
		.with_title("My favourite building")
		.with_location(None, None)
		.with_tags(["Beach", "SUNSET"]);

	let photo = t
		.library
		.lifecycle()
		.on_create(pending)
		.await
		.unwrap()
		.photo;

	assert_eq!(photo.record.title, "My favourite building");
	assert_eq!(photo.record.title_source, FieldSource::User);
	// Explicitly cleared, the file doesn't get to fill them in
	assert_eq!(photo.record.latitude, None);
	assert_eq!(photo.record.longitude, None);
	assert_eq!(photo.record.latitude_source, FieldSource::User);
	// Not supplied, so the file's value is taken
	assert_eq!(photo.record.description_source, FieldSource::File);
	assert_eq!(photo.tag_list, "beach sunset sydney_harbour");
}

#[tokio::test]
async fn test_fallback_title_stays_when_the_file_has_none() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "IMG_0002.jpg", 64, 48);

	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "IMG_0002.jpg"))
		.await
		.unwrap()
		.photo;

	assert_eq!(photo.record.title, "IMG_0002.jpg");
	assert_eq!(photo.record.title_source, FieldSource::Fallback);
	assert_eq!(photo.record.description, None);
	assert_eq!(photo.record.description_source, FieldSource::Unset);
	assert_eq!(photo.tag_list, "");
}

#[tokio::test]
async fn test_duplicate_path_is_rejected_without_touching_files() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 300, 200);

	t.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg"))
		.await
		.unwrap();

	let files_before = t.files();
	let source_before = fs::read(t.photos_root().join("misc/pier.jpg")).unwrap();

	let err = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg").with_title("Again"))
		.await
		.unwrap_err();

	assert!(matches!(err, PhotoError::DuplicatePath(ref path) if path == "misc/pier.jpg"));
	assert_eq!(t.files(), files_before);
	assert_eq!(
		fs::read(t.photos_root().join("misc/pier.jpg")).unwrap(),
		source_before
	);
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_path_aliases_are_the_same_photo() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 300, 200);

	t.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg"))
		.await
		.unwrap();
	let files_before = t.files();

	for alias in ["misc/./pier.jpg", "misc//pier.jpg", "./misc/pier.jpg"] {
		let mut pending = PendingPhoto::from_upload(&album, "pier.jpg");
		pending.path = alias.to_string();

		let err = t.library.lifecycle().on_create(pending).await.unwrap_err();

		assert!(
			matches!(err, PhotoError::DuplicatePath(ref path) if path == "misc/pier.jpg"),
			"{alias}: {err:?}"
		);
	}

	assert_eq!(t.files(), files_before);
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 1);

	t.upload_jpeg(&album, "jetty.jpg", 300, 200);
	let mut pending = PendingPhoto::from_upload(&album, "jetty.jpg");
	pending.path = "misc//./jetty.jpg".to_string();
	let photo = t.library.lifecycle().on_create(pending).await.unwrap().photo;
	assert_eq!(photo.record.path, "misc/jetty.jpg");
}

#[tokio::test]
async fn test_out_of_range_coordinates_are_rejected() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let source = t.upload_jpeg(&album, "pier.jpg", 300, 200);

	let err = t
		.library
		.lifecycle()
		.on_create(
			PendingPhoto::from_upload(&album, "pier.jpg").with_location(Some(500.0), Some(10.0)),
		)
		.await
		.unwrap_err();
	assert!(matches!(err, PhotoError::Validation { field: "latitude", .. }));
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 0);

	let photo = t
		.library
		.lifecycle()
		.on_create(
			PendingPhoto::from_upload(&album, "pier.jpg").with_location(Some(-90.0), Some(180.0)),
		)
		.await
		.unwrap()
		.photo;
	let before = fs::read(&source).unwrap();

	for longitude in [181.0, f64::NAN] {
		let err = t
			.library
			.lifecycle()
			.on_update(
				photo.id(),
				PhotoUpdate {
					longitude: Some(Some(longitude)),
					..Default::default()
				},
			)
			.await
			.unwrap_err();
		assert!(matches!(err, PhotoError::Validation { field: "longitude", .. }));
	}

	let found = t.library.lifecycle().find(photo.id()).await.unwrap();
	assert_eq!(found.record.latitude, Some(-90.0));
	assert_eq!(found.record.longitude, Some(180.0));
	assert_eq!(fs::read(&source).unwrap(), before);
}

#[tokio::test]
async fn test_empty_title_is_rejected_before_anything_happens() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "blank.jpg", 300, 200);

	let mut pending = PendingPhoto::from_upload(&album, "blank.jpg");
	pending.title = Field::user(Some("   ".to_string()));

	let err = t.library.lifecycle().on_create(pending).await.unwrap_err();

	assert!(matches!(err, PhotoError::Validation { field: "title", .. }));
	assert!(!t.renditions_root().join("misc").exists());
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_paths_and_albums_are_rejected() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;

	let mut escaping = PendingPhoto::from_upload(&album, "x.jpg");
	escaping.path = "misc/../../etc/x.jpg".to_string();
	assert!(matches!(
		t.library.lifecycle().on_create(escaping).await,
		Err(PhotoError::Validation { field: "path", .. })
	));

	let mut elsewhere = PendingPhoto::from_upload(&album, "x.jpg");
	elsewhere.path = "other/x.jpg".to_string();
	assert!(matches!(
		t.library.lifecycle().on_create(elsewhere).await,
		Err(PhotoError::Validation { field: "path", .. })
	));

	let mut orphan = PendingPhoto::from_upload(&album, "x.jpg");
	orphan.album_id = album.id + 100;
	assert!(matches!(
		t.library.lifecycle().on_create(orphan).await,
		Err(PhotoError::Validation {
			field: "album_id",
			..
		})
	));

	let blank_tag = PendingPhoto::from_upload(&album, "x.jpg").with_tags(["ok", "  "]);
	assert!(matches!(
		t.library.lifecycle().on_create(blank_tag).await,
		Err(PhotoError::Validation { field: "tags", .. })
	));
}

#[tokio::test]
async fn test_file_stage_failures_do_not_undo_the_record() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	// Nothing was ever written at the source path

	let report = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "ghost.jpg"))
		.await
		.unwrap();

	let stages = report
		.failures
		.iter()
		.map(|failure| failure.stage)
		.collect::<Vec<_>>();
	assert_eq!(stages, vec![IngestStage::MetadataRead, IngestStage::Renditions]);
	assert!(report.renditions.is_empty());

	let found = t.library.lifecycle().find(report.photo.id()).await.unwrap();
	assert_eq!(found.record.title, "ghost.jpg");
}

#[tokio::test]
async fn test_update_description_round_trips_through_the_file() {
	let t = TestLibrary::new().await;
	let album = t.album("sydney", "Sydney").await;
	let source = t.upload_jpeg_with_metadata(&album, "opera.jpg", &opera_house());
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "opera.jpg"))
		.await
		.unwrap()
		.photo;

	let report = t
		.library
		.lifecycle()
		.on_update(
			photo.id(),
			PhotoUpdate {
				description: Some(Some("Ferries everywhere".to_string())),
				..Default::default()
			},
		)
		.await
		.unwrap();

	assert!(report.metadata_written);
	assert_eq!(report.photo.record.description_source, FieldSource::User);
	assert_eq!(report.photo.record.state, photo::PhotoState::Updated);

	let written = MetadataCodec.read(&source).unwrap();
	assert_eq!(written.description.as_deref(), Some("Ferries everywhere"));
	assert_eq!(written.title.as_deref(), Some("Opera House"));
	assert_close(written.latitude, -33.856_784);
	assert_close(written.longitude, 151.215_297);
	assert_eq!(written.keywords, vec!["sunset", "sydney_harbour"]);
}

#[tokio::test]
async fn test_update_without_changes_writes_nothing() {
	let t = TestLibrary::new().await;
	let album = t.album("sydney", "Sydney").await;
	let source = t.upload_jpeg_with_metadata(&album, "opera.jpg", &opera_house());
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "opera.jpg"))
		.await
		.unwrap()
		.photo;
	let before = fs::read(&source).unwrap();

	let report = t
		.library
		.lifecycle()
		.on_update(
			photo.id(),
			PhotoUpdate {
				title: Some("Opera House".to_string()),
				description: Some(Some("Sails at dusk".to_string())),
				tag_list: Some("sydney_harbour SUNSET".to_string()),
				..Default::default()
			},
		)
		.await
		.unwrap();

	assert!(report.changed.is_empty());
	assert!(!report.metadata_written);
	assert_eq!(report.photo.record.state, photo::PhotoState::Created);
	assert_eq!(report.photo.tag_list, photo.tag_list);
	assert_eq!(fs::read(&source).unwrap(), before);
}

#[tokio::test]
async fn test_update_tag_list_applies_the_difference() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let source = t.upload_jpeg(&album, "pier.jpg", 120, 80);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg").with_tags(["a", "b"]))
		.await
		.unwrap()
		.photo;

	let report = t
		.library
		.lifecycle()
		.on_update(
			photo.id(),
			PhotoUpdate {
				tag_list: Some("c b".to_string()),
				..Default::default()
			},
		)
		.await
		.unwrap();

	assert_eq!(report.photo.tag_list, "b c");
	assert_eq!(
		photo_tag::Entity::find()
			.filter(photo_tag::Column::PhotoId.eq(photo.id()))
			.count(t.library.db())
			.await
			.unwrap(),
		2
	);
	assert_eq!(MetadataCodec.read(&source).unwrap().keywords, vec!["b", "c"]);
}

#[tokio::test]
async fn test_failed_metadata_write_keeps_the_record_change() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let source = t.photos_root().join("misc/drawing.png");
	fs::create_dir_all(source.parent().unwrap()).unwrap();
	image::RgbImage::from_pixel(40, 40, image::Rgb([0, 0, 0]))
		.save(&source)
		.unwrap();
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "drawing.png"))
		.await
		.unwrap()
		.photo;

	let err = t
		.library
		.lifecycle()
		.on_update(
			photo.id(),
			PhotoUpdate {
				description: Some(Some("Charcoal".to_string())),
				..Default::default()
			},
		)
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		PhotoError::MetadataWriteFailed { ref path, .. } if &**path == source.as_path()
	));

	let found = t.library.lifecycle().find(photo.id()).await.unwrap();
	assert_eq!(found.record.description.as_deref(), Some("Charcoal"));
}

#[tokio::test]
async fn test_delete_removes_exactly_the_photo_files() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "keep.jpg", 400, 300);
	t.upload_jpeg(&album, "drop.jpg", 400, 300);

	let keep = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "keep.jpg"))
		.await
		.unwrap()
		.photo;
	let drop = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "drop.jpg").with_tags(["gone"]))
		.await
		.unwrap()
		.photo;

	let before = t.files();
	assert_eq!(before.len(), 8);

	let drop_id = drop.id();
	t.library.lifecycle().on_delete(drop).await.unwrap();

	let removed = before.difference(&t.files()).cloned().collect::<Vec<_>>();
	assert_eq!(
		removed,
		vec![
			PathBuf::from("photos/misc/drop.jpg"),
			PathBuf::from(format!("renditions/misc/{drop_id}_album.jpg")),
			PathBuf::from(format!("renditions/misc/{drop_id}_large.jpg")),
			PathBuf::from(format!("renditions/misc/{drop_id}_thumb.jpg")),
		]
	);

	assert!(matches!(
		t.library.lifecycle().find(drop_id).await,
		Err(PhotoError::NotFound(id)) if id == drop_id
	));
	assert_eq!(
		photo_tag::Entity::find()
			.filter(photo_tag::Column::PhotoId.eq(drop_id))
			.count(t.library.db())
			.await
			.unwrap(),
		0
	);
	t.library.lifecycle().find(keep.id()).await.unwrap();
}

#[tokio::test]
async fn test_delete_without_renditions_succeeds() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 200, 100);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg"))
		.await
		.unwrap()
		.photo;

	fs::remove_dir_all(t.renditions_root().join("misc")).unwrap();

	t.library.lifecycle().on_delete(photo).await.unwrap();

	assert!(t.files().is_empty());
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_reports_files_it_could_not_remove() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 200, 100);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg"))
		.await
		.unwrap()
		.photo;

	// A directory can't be removed as a file
	let blocked = t.library.lifecycle().rendition_path(&photo, RenditionSize::Large);
	fs::remove_file(&blocked).unwrap();
	fs::create_dir_all(blocked.join("stuck")).unwrap();

	let photo_id = photo.id();
	let err = t.library.lifecycle().on_delete(photo).await.unwrap_err();

	let PhotoError::CleanupIncomplete { failures } = err else {
		panic!("expected an incomplete clean up, got {err:?}");
	};
	assert_eq!(failures.len(), 1);
	assert_eq!(&*failures[0].path, blocked.as_path());

	assert!(!t.photos_root().join("misc/pier.jpg").exists());
	assert!(!t
		.library
		.config()
		.rendition_dir("misc")
		.join(format!("{photo_id}_thumb.jpg"))
		.exists());
	assert_eq!(photo::Entity::find().count(t.library.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_tag_and_untag_are_idempotent() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let source = t.upload_jpeg(&album, "pier.jpg", 200, 100);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg").with_tags(["harbour"]))
		.await
		.unwrap()
		.photo;
	let bytes = fs::read(&source).unwrap();
	let lifecycle = t.library.lifecycle();

	assert!(lifecycle.tag(photo.id(), "Golden Hour").await.unwrap());
	assert!(!lifecycle.tag(photo.id(), "golden   hour").await.unwrap());
	assert_eq!(
		lifecycle.find(photo.id()).await.unwrap().tag_list,
		"golden_hour harbour"
	);

	assert!(lifecycle.untag(photo.id(), "GOLDEN HOUR").await.unwrap());
	assert!(!lifecycle.untag(photo.id(), "golden_hour").await.unwrap());
	assert!(!lifecycle.untag(photo.id(), "never-used").await.unwrap());
	assert_eq!(lifecycle.find(photo.id()).await.unwrap().tag_list, "harbour");

	// Association only, the file is left alone
	assert_eq!(fs::read(&source).unwrap(), bytes);

	assert!(matches!(
		lifecycle.tag(photo.id() + 1, "x").await,
		Err(PhotoError::NotFound(_))
	));
	assert!(matches!(
		lifecycle.tag(photo.id(), "  ").await,
		Err(PhotoError::Validation { field: "tag", .. })
	));
}

#[tokio::test]
async fn test_regenerate_restores_missing_renditions() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 200, 100);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg"))
		.await
		.unwrap()
		.photo;

	let thumb = t.library.lifecycle().rendition_path(&photo, RenditionSize::Thumb);
	fs::remove_file(&thumb).unwrap();

	let report = t
		.library
		.lifecycle()
		.regenerate_renditions(photo.id())
		.await
		.unwrap();

	assert!(report.failures.is_empty());
	assert_eq!(report.renditions.len(), 3);
	assert_eq!(image::open(&thumb).unwrap().dimensions(), (85, 43));
}

#[tokio::test]
async fn test_untouched_and_neighbors() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let mut photos = vec![];
	for name in ["a.jpg", "b.jpg", "c.jpg"] {
		t.upload_jpeg(&album, name, 20, 20);
		photos.push(
			t.library
				.lifecycle()
				.on_create(PendingPhoto::from_upload(&album, name))
				.await
				.unwrap()
				.photo,
		);
	}
	t.library
		.lifecycle()
		.tag(photos[0].id(), "seen")
		.await
		.unwrap();
	t.library
		.lifecycle()
		.on_update(
			photos[2].id(),
			PhotoUpdate {
				description: Some(Some("described".to_string())),
				..Default::default()
			},
		)
		.await
		.unwrap();

	let untouched = t
		.library
		.lifecycle()
		.untouched(Some(album.id))
		.await
		.unwrap()
		.into_iter()
		.map(|photo| photo.id)
		.collect::<Vec<_>>();
	assert_eq!(untouched, vec![photos[1].id()]);

	let (previous, next) = t.library.lifecycle().neighbors(&photos[1]).await.unwrap();
	assert_eq!(previous.map(|photo| photo.id), Some(photos[0].id()));
	assert_eq!(next.map(|photo| photo.id), Some(photos[2].id()));
}

#[tokio::test]
async fn test_read_metadata_of_plain_files_is_empty() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	let source = t.upload_jpeg(&album, "plain.jpg", 20, 20);

	assert_eq!(
		MetadataCodec.read(source).unwrap(),
		MetadataSnapshot::default()
	);
}
