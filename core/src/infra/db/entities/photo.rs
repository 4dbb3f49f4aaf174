//! Photo entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where the current value of a photo field came from
#[derive(
	Clone,
	Copy,
	Debug,
	Default,
	PartialEq,
	Eq,
	Hash,
	EnumIter,
	DeriveActiveEnum,
	Serialize,
	Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
	/// Never set
	#[default]
	#[sea_orm(string_value = "unset")]
	Unset,
	/// Placeholder from the uploader, the file's own value wins over it
	#[sea_orm(string_value = "fallback")]
	Fallback,
	/// Set or cleared explicitly, never replaced by file metadata
	#[sea_orm(string_value = "user")]
	User,
	/// Read from the file's embedded metadata on ingest
	#[sea_orm(string_value = "file")]
	File,
}

impl FieldSource {
	/// Whether the value embedded in the file may replace the current one
	#[must_use]
	pub const fn accepts_file_value(self) -> bool {
		matches!(self, Self::Unset | Self::Fallback)
	}
}

#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PhotoState {
	#[sea_orm(string_value = "created")]
	Created,
	#[sea_orm(string_value = "updated")]
	Updated,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub album_id: i32,
	/// `<album path>/<file name>`, relative to the photos root
	#[sea_orm(unique)]
	pub path: String,

	pub title: String,
	pub description: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,

	pub title_source: FieldSource,
	pub description_source: FieldSource,
	pub latitude_source: FieldSource,
	pub longitude_source: FieldSource,

	pub state: PhotoState,
	pub created_at: DateTimeUtc,
	pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::album::Entity",
		from = "Column::AlbumId",
		to = "super::album::Column::Id",
		on_delete = "Cascade"
	)]
	Album,
	#[sea_orm(has_many = "super::photo_tag::Entity")]
	PhotoTag,
}

impl Related<super::album::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Album.def()
	}
}

impl Related<super::photo_tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::PhotoTag.def()
	}
}

impl Related<super::tag::Entity> for Entity {
	fn to() -> RelationDef {
		super::photo_tag::Relation::Tag.def()
	}

	fn via() -> Option<RelationDef> {
		Some(super::photo_tag::Relation::Photo.def().rev())
	}
}

impl ActiveModelBehavior for ActiveModel {}
