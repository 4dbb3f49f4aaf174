//! Shared tag vocabulary
//!
//! Tags are stored once per normalized text and linked to photos and albums through
//! association tables keyed by their pair. Every write here is an insert that ignores
//! conflicts or a plain delete, so repeating an operation changes nothing.

use crate::infra::db::entities::{album_tag, photo_tag, tag};

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
	sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
	Insert, IntoActiveModel, JoinType, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
	RelationTrait, Set,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Separator of the tag list projection
pub const TAG_LIST_SEPARATOR: &str = " ";

#[derive(Error, Debug)]
pub enum TagError {
	#[error("tag text is empty after normalization: {0:?}")]
	EmptyText(String),
	#[error("tag <name='{0}'> is missing right after being resolved")]
	Unresolved(String),
	#[error("database error: {0}")]
	Database(#[from] DbErr),
}

/// Owner of a set of tag associations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTarget {
	Photo(i32),
	Album(i32),
}

/// What a [`TagVocabulary::sync`] call changed, as normalized texts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
	pub added: Vec<String>,
	pub removed: Vec<String>,
}

impl TagDiff {
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}

/// Trims, case-folds and joins inner whitespace runs with `_`.
pub fn normalize(text: &str) -> Result<String, TagError> {
	let normalized = text
		.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join("_");

	if normalized.is_empty() {
		Err(TagError::EmptyText(text.to_string()))
	} else {
		Ok(normalized)
	}
}

/// Splits a space-joined tag list into normalized, deduplicated tokens.
#[must_use]
pub fn parse_tag_list(tag_list: &str) -> BTreeSet<String> {
	tag_list
		.split_whitespace()
		.map(str::to_lowercase)
		.collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagVocabulary;

impl TagVocabulary {
	/// Looks up the tag of every text, creating the missing ones.
	///
	/// Texts that normalize to the same string resolve to the same tag, which is returned
	/// once, in the order its text first appeared. Safe under concurrent callers: the
	/// unique index on `name` makes a racing insert a no-op and the lookup that follows
	/// sees whichever row won.
	pub async fn resolve<C, I, S>(&self, db: &C, texts: I) -> Result<Vec<tag::Model>, TagError>
	where
		C: ConnectionTrait,
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seen = HashSet::new();
		let mut names = vec![];
		for text in texts {
			let name = normalize(text.as_ref())?;
			if seen.insert(name.clone()) {
				names.push(name);
			}
		}

		if names.is_empty() {
			return Ok(vec![]);
		}

		let now = Utc::now();
		let inserted = insert_ignoring_conflicts(
			tag::Entity::insert_many(names.iter().map(|name| tag::ActiveModel {
				name: Set(name.clone()),
				created_at: Set(now),
				..Default::default()
			}))
			.on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned()),
			db,
		)
		.await?;

		trace!(requested = names.len(), inserted, "resolved tags");

		let mut by_name = tag::Entity::find()
			.filter(tag::Column::Name.is_in(names.iter().cloned()))
			.all(db)
			.await?
			.into_iter()
			.map(|tag| (tag.name.clone(), tag))
			.collect::<HashMap<_, _>>();

		names
			.into_iter()
			.map(|name| by_name.remove(&name).ok_or(TagError::Unresolved(name)))
			.collect()
	}

	/// Links `tag_id` to `target`, returning whether the link is new.
	pub async fn attach<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
		tag_id: i32,
	) -> Result<bool, TagError> {
		let now = Utc::now();

		let inserted = match target {
			TagTarget::Photo(photo_id) => {
				insert_ignoring_conflicts(
					photo_tag::Entity::insert(photo_tag::ActiveModel {
						photo_id: Set(photo_id),
						tag_id: Set(tag_id),
						created_at: Set(now),
					})
					.on_conflict(
						OnConflict::columns([photo_tag::Column::PhotoId, photo_tag::Column::TagId])
							.do_nothing()
							.to_owned(),
					),
					db,
				)
				.await?
			}
			TagTarget::Album(album_id) => {
				insert_ignoring_conflicts(
					album_tag::Entity::insert(album_tag::ActiveModel {
						album_id: Set(album_id),
						tag_id: Set(tag_id),
						created_at: Set(now),
					})
					.on_conflict(
						OnConflict::columns([album_tag::Column::AlbumId, album_tag::Column::TagId])
							.do_nothing()
							.to_owned(),
					),
					db,
				)
				.await?
			}
		};

		Ok(inserted > 0)
	}

	/// Unlinks `tag_id` from `target`, returning whether a link existed.
	pub async fn detach<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
		tag_id: i32,
	) -> Result<bool, TagError> {
		let res = match target {
			TagTarget::Photo(photo_id) => {
				photo_tag::Entity::delete_many()
					.filter(photo_tag::Column::PhotoId.eq(photo_id))
					.filter(photo_tag::Column::TagId.eq(tag_id))
					.exec(db)
					.await?
			}
			TagTarget::Album(album_id) => {
				album_tag::Entity::delete_many()
					.filter(album_tag::Column::AlbumId.eq(album_id))
					.filter(album_tag::Column::TagId.eq(tag_id))
					.exec(db)
					.await?
			}
		};

		Ok(res.rows_affected > 0)
	}

	/// Resolves `text` and links it to `target`.
	pub async fn attach_text<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
		text: &str,
	) -> Result<bool, TagError> {
		let mut resolved = self.resolve(db, [text]).await?;
		match resolved.pop() {
			Some(tag) => self.attach(db, target, tag.id).await,
			None => Err(TagError::EmptyText(text.to_string())),
		}
	}

	/// Unlinks the tag named by `text` from `target`. Unknown tags are not created.
	pub async fn detach_text<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
		text: &str,
	) -> Result<bool, TagError> {
		let name = normalize(text)?;

		match tag::Entity::find()
			.filter(tag::Column::Name.eq(&name))
			.one(db)
			.await?
		{
			Some(tag) => self.detach(db, target, tag.id).await,
			None => Ok(false),
		}
	}

	/// Tags linked to `target`, sorted by name
	pub async fn tags_of<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
	) -> Result<Vec<tag::Model>, TagError> {
		let query = tag::Entity::find().order_by_asc(tag::Column::Name);

		let query = match target {
			TagTarget::Photo(photo_id) => query
				.join(JoinType::InnerJoin, tag::Relation::PhotoTag.def())
				.filter(photo_tag::Column::PhotoId.eq(photo_id)),
			TagTarget::Album(album_id) => query
				.join(JoinType::InnerJoin, tag::Relation::AlbumTag.def())
				.filter(album_tag::Column::AlbumId.eq(album_id)),
		};

		trace!(sql = %query.build(db.get_database_backend()), "listing tags");

		Ok(query.all(db).await?)
	}

	/// The sorted, space-joined names of the tags linked to `target`
	pub async fn tag_list<C: ConnectionTrait>(
		&self,
		db: &C,
		target: TagTarget,
	) -> Result<String, TagError> {
		Ok(self
			.tags_of(db, target)
			.await?
			.into_iter()
			.map(|tag| tag.name)
			.collect::<Vec<_>>()
			.join(TAG_LIST_SEPARATOR))
	}

	/// Makes the tags of `target` equal to `desired`.
	///
	/// Only the difference is written: links present on both sides are left alone.
	pub async fn sync<C, I, S>(
		&self,
		db: &C,
		target: TagTarget,
		desired: I,
	) -> Result<TagDiff, TagError>
	where
		C: ConnectionTrait,
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let desired = desired
			.into_iter()
			.map(|text| normalize(text.as_ref()))
			.collect::<Result<BTreeSet<_>, _>>()?;

		let current = self
			.tags_of(db, target)
			.await?
			.into_iter()
			.map(|tag| (tag.name, tag.id))
			.collect::<HashMap<_, _>>();

		let mut diff = TagDiff::default();

		for (name, tag_id) in &current {
			if !desired.contains(name) {
				self.detach(db, target, *tag_id).await?;
				diff.removed.push(name.clone());
			}
		}
		diff.removed.sort();

		let missing = desired
			.into_iter()
			.filter(|name| !current.contains_key(name))
			.collect::<Vec<_>>();

		for tag in self.resolve(db, &missing).await? {
			self.attach(db, target, tag.id).await?;
			diff.added.push(tag.name);
		}

		if !diff.is_empty() {
			debug!(?target, added = ?diff.added, removed = ?diff.removed, "synced tags");
		}

		Ok(diff)
	}
}

/// Runs an `ON CONFLICT DO NOTHING` insert, returning how many rows it added.
async fn insert_ignoring_conflicts<A, C>(insert: Insert<A>, db: &C) -> Result<u64, DbErr>
where
	A: ActiveModelTrait + 'static,
	<A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
	C: ConnectionTrait,
{
	match insert.exec_without_returning(db).await {
		Ok(rows) => Ok(rows),
		Err(DbErr::RecordNotInserted) => Ok(0),
		Err(e) => Err(e),
	}
}
