//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&SqlitePool` as the first argument.

pub mod movie_repo;
pub mod thumbnail_repo;
pub mod used_cut_repo;

pub use movie_repo::MovieRepo;
pub use thumbnail_repo::ThumbnailRepo;
pub use used_cut_repo::UsedCutRepo;
