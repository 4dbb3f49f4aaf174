//! Database entities

pub mod album;
pub mod album_tag;
pub mod photo;
pub mod photo_tag;
pub mod tag;

pub use album::Entity as Album;
pub use album_tag::Entity as AlbumTag;
pub use photo::Entity as Photo;
pub use photo_tag::Entity as PhotoTag;
pub use tag::Entity as Tag;
