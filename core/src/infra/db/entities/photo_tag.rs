//! PhotoTag junction entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "photo_tag")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub photo_id: i32,
	#[sea_orm(primary_key, auto_increment = false)]
	pub tag_id: i32,
	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::photo::Entity",
		from = "Column::PhotoId",
		to = "super::photo::Column::Id",
		on_delete = "Cascade"
	)]
	Photo,
	#[sea_orm(
		belongs_to = "super::tag::Entity",
		from = "Column::TagId",
		to = "super::tag::Column::Id",
		on_delete = "Cascade"
	)]
	Tag,
}

impl Related<super::photo::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Photo.def()
	}
}

impl Related<super::tag::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Tag.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
