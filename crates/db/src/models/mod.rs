//! Row structs and create DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO used by the matching repository

pub mod movie;
pub mod thumbnail;
pub mod used_cut;
