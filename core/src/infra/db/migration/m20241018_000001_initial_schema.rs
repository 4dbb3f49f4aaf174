//! Initial database schema
//!
//! Albums, photos and the shared tag vocabulary. Both association tables are keyed
//! by their pair so that attaching a tag twice is a conflict the insert can ignore.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		// Create album table
		manager
			.create_table(
				Table::create()
					.table(Album::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Album::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Album::Path).string().not_null().unique_key())
					.col(ColumnDef::new(Album::Title).string().not_null())
					.col(
						ColumnDef::new(Album::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// Create tag table, `name` holds the normalized text
		manager
			.create_table(
				Table::create()
					.table(Tag::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Tag::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Tag::Name).string().not_null().unique_key())
					.col(
						ColumnDef::new(Tag::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// Create photo table
		manager
			.create_table(
				Table::create()
					.table(Photo::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Photo::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Photo::AlbumId).integer().not_null())
					.col(ColumnDef::new(Photo::Path).string().not_null().unique_key())
					.col(ColumnDef::new(Photo::Title).string().not_null())
					.col(ColumnDef::new(Photo::Description).text())
					.col(ColumnDef::new(Photo::Latitude).double())
					.col(ColumnDef::new(Photo::Longitude).double())
					.col(ColumnDef::new(Photo::TitleSource).string().not_null())
					.col(ColumnDef::new(Photo::DescriptionSource).string().not_null())
					.col(ColumnDef::new(Photo::LatitudeSource).string().not_null())
					.col(ColumnDef::new(Photo::LongitudeSource).string().not_null())
					.col(ColumnDef::new(Photo::State).string().not_null())
					.col(
						ColumnDef::new(Photo::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(Photo::UpdatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.foreign_key(
						ForeignKey::create()
							.from(Photo::Table, Photo::AlbumId)
							.to(Album::Table, Album::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Create photo_tag table
		manager
			.create_table(
				Table::create()
					.table(PhotoTag::Table)
					.if_not_exists()
					.col(ColumnDef::new(PhotoTag::PhotoId).integer().not_null())
					.col(ColumnDef::new(PhotoTag::TagId).integer().not_null())
					.col(
						ColumnDef::new(PhotoTag::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.primary_key(
						Index::create()
							.col(PhotoTag::PhotoId)
							.col(PhotoTag::TagId),
					)
					.foreign_key(
						ForeignKey::create()
							.from(PhotoTag::Table, PhotoTag::PhotoId)
							.to(Photo::Table, Photo::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.from(PhotoTag::Table, PhotoTag::TagId)
							.to(Tag::Table, Tag::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Create album_tag table
		manager
			.create_table(
				Table::create()
					.table(AlbumTag::Table)
					.if_not_exists()
					.col(ColumnDef::new(AlbumTag::AlbumId).integer().not_null())
					.col(ColumnDef::new(AlbumTag::TagId).integer().not_null())
					.col(
						ColumnDef::new(AlbumTag::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.primary_key(
						Index::create()
							.col(AlbumTag::AlbumId)
							.col(AlbumTag::TagId),
					)
					.foreign_key(
						ForeignKey::create()
							.from(AlbumTag::Table, AlbumTag::AlbumId)
							.to(Album::Table, Album::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.from(AlbumTag::Table, AlbumTag::TagId)
							.to(Tag::Table, Tag::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Photo indices
		manager
			.create_index(
				Index::create()
					.name("idx_photo_album_id")
					.table(Photo::Table)
					.col(Photo::AlbumId)
					.to_owned(),
			)
			.await?;

		// Reverse lookups from a tag
		manager
			.create_index(
				Index::create()
					.name("idx_photo_tag_tag_id")
					.table(PhotoTag::Table)
					.col(PhotoTag::TagId)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_album_tag_tag_id")
					.table(AlbumTag::Table)
					.col(AlbumTag::TagId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		// Drop tables in reverse order of creation
		manager
			.drop_table(Table::drop().table(AlbumTag::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(PhotoTag::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Photo::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Tag::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Album::Table).to_owned())
			.await?;

		Ok(())
	}
}

// Table identifiers

#[derive(DeriveIden)]
enum Album {
	Table,
	Id,
	Path,
	Title,
	CreatedAt,
}

#[derive(DeriveIden)]
enum Tag {
	Table,
	Id,
	Name,
	CreatedAt,
}

#[derive(DeriveIden)]
enum Photo {
	Table,
	Id,
	AlbumId,
	Path,
	Title,
	Description,
	Latitude,
	Longitude,
	TitleSource,
	DescriptionSource,
	LatitudeSource,
	LongitudeSource,
	State,
	CreatedAt,
	UpdatedAt,
}

#[derive(DeriveIden)]
enum PhotoTag {
	Table,
	PhotoId,
	TagId,
	CreatedAt,
}

#[derive(DeriveIden)]
enum AlbumTag {
	Table,
	AlbumId,
	TagId,
	CreatedAt,
}
