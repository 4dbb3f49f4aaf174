pub mod rendition;
