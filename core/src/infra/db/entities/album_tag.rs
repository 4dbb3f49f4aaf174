//! AlbumTag junction entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "album_tag")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub album_id: i32,
	#[sea_orm(primary_key, auto_increment = false)]
	pub tag_id: i32,
	pub created_at: DateTimeUtc,
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
	#[sea_orm(
		belongs_to = "super::tag::Entity",
		from = "Column::TagId",
		to = "super::tag::Column::Id",
		on_delete = "Cascade"
	)]
	Tag,
}

impl Related<super::album::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Album.def()
	}
}

impl Related<super::tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Tag.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
