//! Tag entity
//!
//! One row per normalized tag text, shared by photos and albums

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	#[sea_orm(unique)]
	pub name: String,
	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::photo_tag::Entity")]
	PhotoTag,
	#[sea_orm(has_many = "super::album_tag::Entity")]
	AlbumTag,
}

impl Related<super::photo_tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::PhotoTag.def()
	}
}

impl Related<super::album_tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::AlbumTag.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
