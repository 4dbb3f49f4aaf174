//! Album entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "album")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	/// Path segment shared by the album's photos and renditions
	#[sea_orm(unique)]
	pub path: String,
	pub title: String,
	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::photo::Entity")]
	Photo,
	#[sea_orm(has_many = "super::album_tag::Entity")]
	AlbumTag,
}

impl Related<super::photo::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Photo.def()
	}
}

impl Related<super::album_tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::AlbumTag.def()
	}
}

impl Related<super::tag::Entity> for Entity {
	fn to() -> RelationDef {
		super::album_tag::Relation::Tag.def()
	}

	fn via() -> Option<RelationDef> {
		Some(super::album_tag::Relation::Album.def().rev())
	}
}

impl ActiveModelBehavior for ActiveModel {}
