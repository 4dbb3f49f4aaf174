pub use crate::infra::db::entities::photo::FieldSource;

/// A photo field value together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
	pub value: Option<T>,
	pub source: FieldSource,
}

impl<T> Default for Field<T> {
	fn default() -> Self {
		Self::unset()
	}
}

impl<T> Field<T> {
	#[must_use]
	pub const fn unset() -> Self {
		Self {
			value: None,
			source: FieldSource::Unset,
		}
	}

	/// A placeholder the file's own value replaces
	pub const fn fallback(value: T) -> Self {
		Self {
			value: Some(value),
			source: FieldSource::Fallback,
		}
	}

	/// An explicit value, `None` meaning explicitly cleared
	pub const fn user(value: Option<T>) -> Self {
		Self {
			value,
			source: FieldSource::User,
		}
	}

	/// Takes the value read from the file when there is one and provenance allows it
	#[must_use]
	pub fn merge_file(self, file: Option<T>) -> Self {
		match file {
			Some(value) if self.source.accepts_file_value() => Self {
				value: Some(value),
				source: FieldSource::File,
			},
			_ => self,
		}
	}
}
