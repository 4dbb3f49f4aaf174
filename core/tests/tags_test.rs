//! Integration tests for the shared tag vocabulary

mod helpers;

use helpers::TestLibrary;

use lb_core::{
	infra::db::entities::{album_tag, photo_tag, tag},
	AlbumError, PendingPhoto, PhotoUpdate, TagDiff, TagError, TagTarget, TagVocabulary,
};

use std::sync::Arc;

use sea_orm::{
	ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

async fn photo_link(db: &DatabaseConnection, photo_id: i32, name: &str) -> photo_tag::Model {
	photo_tag::Entity::find()
		.inner_join(tag::Entity)
		.filter(photo_tag::Column::PhotoId.eq(photo_id))
		.filter(tag::Column::Name.eq(name))
		.one(db)
		.await
		.unwrap()
		.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_share_one_tag() {
	let t = Arc::new(TestLibrary::new().await);

	let handles = (0..8)
		.map(|i| {
			let t = Arc::clone(&t);
			let text = if i % 2 == 0 { "Golden Hour" } else { "golden  HOUR" };
			tokio::spawn(async move {
				TagVocabulary
					.resolve(t.library.db(), [text])
					.await
					.unwrap()
			})
		})
		.collect::<Vec<_>>();

	let mut ids = vec![];
	for handle in handles {
		let resolved = handle.await.unwrap();
		assert_eq!(resolved.len(), 1);
		assert_eq!(resolved[0].name, "golden_hour");
		ids.push(resolved[0].id);
	}

	ids.dedup();
	assert_eq!(ids.len(), 1);
	assert_eq!(tag::Entity::find().count(t.library.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_resolve_keeps_first_seen_order() {
	let t = TestLibrary::new().await;
	let db = t.library.db();

	let existing = TagVocabulary.resolve(db, ["beach"]).await.unwrap();
	let resolved = TagVocabulary
		.resolve(db, ["Sunset", "BEACH", "sunset", "pier"])
		.await
		.unwrap();

	assert_eq!(
		resolved.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>(),
		vec!["sunset", "beach", "pier"]
	);
	assert_eq!(resolved[1].id, existing[0].id);

	assert!(matches!(
		TagVocabulary.resolve(db, ["ok", "\t"]).await,
		Err(TagError::EmptyText(_))
	));
	assert!(TagVocabulary
		.resolve(db, Vec::<String>::new())
		.await
		.unwrap()
		.is_empty());
}

#[tokio::test]
async fn test_sync_leaves_shared_links_alone() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 20, 20);
	let photo = t
		.library
		.lifecycle()
		.on_create(PendingPhoto::from_upload(&album, "pier.jpg").with_tags(["keep", "drop"]))
		.await
		.unwrap()
		.photo;
	let db = t.library.db();

	let before = photo_link(db, photo.id(), "keep").await;

	let diff = TagVocabulary
		.sync(db, TagTarget::Photo(photo.id()), ["keep", "New"])
		.await
		.unwrap();

	assert_eq!(
		diff,
		TagDiff {
			added: vec!["new".to_string()],
			removed: vec!["drop".to_string()],
		}
	);
	assert_eq!(photo_link(db, photo.id(), "keep").await, before);
	assert_eq!(
		TagVocabulary
			.tag_list(db, TagTarget::Photo(photo.id()))
			.await
			.unwrap(),
		"keep new"
	);

	// Tags outlive their last link
	assert!(tag::Entity::find()
		.filter(tag::Column::Name.eq("drop"))
		.one(db)
		.await
		.unwrap()
		.is_some());

	assert!(TagVocabulary
		.sync(db, TagTarget::Photo(photo.id()), ["new", "KEEP"])
		.await
		.unwrap()
		.is_empty());
}

#[tokio::test]
async fn test_tag_lists_are_sorted() {
	let t = TestLibrary::new().await;
	let album = t.album("misc", "Misc").await;
	t.upload_jpeg(&album, "pier.jpg", 20, 20);
	let photo = t
		.library
		.lifecycle()
		.on_create(
			PendingPhoto::from_upload(&album, "pier.jpg").with_tags(["zebra", "Apple", "mango"]),
		)
		.await
		.unwrap()
		.photo;

	assert_eq!(photo.tag_list, "apple mango zebra");

	let updated = t
		.library
		.lifecycle()
		.on_update(
			photo.id(),
			PhotoUpdate {
				tag_list: Some("mango banana zebra".to_string()),
				..Default::default()
			},
		)
		.await
		.unwrap()
		.photo;

	assert_eq!(updated.tag_list, "banana mango zebra");
}

#[tokio::test]
async fn test_album_tags_are_replaced_as_a_set() {
	let t = TestLibrary::new().await;
	let albums = t.library.albums();
	let album = t.album("2024/trips", "Trips").await;

	let diff = albums.set_tag_list(album.id, "travel Beach").await.unwrap();
	assert_eq!(diff.added.len(), 2);
	assert!(diff.removed.is_empty());
	assert_eq!(albums.tag_list(album.id).await.unwrap(), "beach travel");

	let diff = albums.set_tag_list(album.id, "travel").await.unwrap();
	assert_eq!(diff.removed, vec!["beach".to_string()]);
	assert_eq!(
		album_tag::Entity::find()
			.filter(album_tag::Column::AlbumId.eq(album.id))
			.count(t.library.db())
			.await
			.unwrap(),
		1
	);

	assert!(matches!(
		albums.set_tag_list(album.id + 1, "x").await,
		Err(AlbumError::NotFound(_))
	));
}

#[tokio::test]
async fn test_album_paths_are_unique_and_relative() {
	let t = TestLibrary::new().await;
	let albums = t.library.albums();

	let album = albums.create("/2024/trips/", "Trips").await.unwrap();
	assert_eq!(album.path, "2024/trips");

	assert!(matches!(
		albums.create("2024/trips", "Again").await,
		Err(AlbumError::DuplicatePath(_))
	));
	for alias in ["2024//trips", "2024/./trips", "./2024/trips"] {
		assert!(
			matches!(
				albums.create(alias, "Alias").await,
				Err(AlbumError::DuplicatePath(ref path)) if path == "2024/trips"
			),
			"{alias}"
		);
	}
	assert!(matches!(
		albums.create("../outside", "Nope").await,
		Err(AlbumError::Validation { field: "path", .. })
	));
	assert!(matches!(
		albums.create("ok", "  ").await,
		Err(AlbumError::Validation { field: "title", .. })
	));

	assert_eq!(
		albums.find_by_path("2024/trips").await.unwrap().map(|a| a.id),
		Some(album.id)
	);
	assert_eq!(
		albums.find_by_path("2024//trips").await.unwrap().map(|a| a.id),
		Some(album.id)
	);
	assert_eq!(albums.list().await.unwrap().len(), 1);
}
